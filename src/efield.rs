//! Mapping electric fields along traced field lines.
//!
//! With the plasma frozen to the field (`E.B = 0`), field lines are
//! equipotentials, so the potential drop across a pair of neighboring
//! field lines is conserved along the flux tube. The separation vectors
//! co-evolved by a trace measure how the tube cross section deforms,
//! which turns the conservation law into a linear system for the mapped
//! field at the far end of the trace.

use crate::{
    error::{TraceError, TraceResult},
    geometry::{
        Dim3::{X, Y, Z},
        Vec3,
    },
    trace::{ftr, TraceRecord},
};

/// Smallest squared sine of the angle between the separation vectors (and
/// smallest separation length) for which the mapping is still considered
/// well conditioned.
const DEGENERACY_TOLERANCE: ftr = 1e-12;

/// Constructs the unit azimuthal and meridional directions transverse to
/// the given unit field direction at a position with the given unit radial
/// direction.
///
/// Near the poles of the field (where the field direction and the radial
/// direction align) the azimuthal direction is formed against the
/// coordinate axis least aligned with the field instead.
pub fn transverse_basis(direction: &Vec3<ftr>, radial_dir: &Vec3<ftr>) -> (Vec3<ftr>, Vec3<ftr>) {
    let mut azimuthal = direction.cross(radial_dir);
    if azimuthal.squared_length() < DEGENERACY_TOLERANCE {
        let mut fallback_axis = Vec3::zero();
        let least_aligned = [X, Y, Z]
            .into_iter()
            .min_by(|&dim_1, &dim_2| {
                direction[dim_1]
                    .abs()
                    .partial_cmp(&direction[dim_2].abs())
                    .unwrap()
            })
            .unwrap();
        fallback_axis[least_aligned] = 1.0;
        azimuthal = direction.cross(&fallback_axis);
    }
    azimuthal.normalize();
    let meridional = azimuthal.cross(direction);
    (azimuthal, meridional)
}

/// Maps an electric field from the origin of the given trace to its
/// terminus.
///
/// # Parameters
///
/// - `record`: Trace produced with separation vectors co-evolved.
/// - `origin_e_azimuthal`: Azimuthal electric field component at the trace origin.
/// - `origin_e_meridional`: Meridional electric field component at the trace origin.
///
/// # Returns
///
/// A `Result` which is either:
///
/// - `Ok`: Contains the mapped electric field vector at the trace terminus,
///   in the geocentric Cartesian frame and the units of the input components.
/// - `Err`: Contains a `TraceError` if the record carries no separation
///   vectors or their geometry has degenerated.
pub fn derive_mapped_efield(
    record: &TraceRecord,
    origin_e_azimuthal: ftr,
    origin_e_meridional: ftr,
) -> TraceResult<Vec3<ftr>> {
    let (separation_1, separation_2) = record
        .terminus()
        .separation_vectors()
        .ok_or(TraceError::SeparationUnavailable)?;
    mapped_efield_from_separations(
        &separation_1,
        &separation_2,
        origin_e_azimuthal,
        origin_e_meridional,
    )
}

/// Solves the covariant-to-contravariant system for the mapped field given
/// the terminus separation vectors.
///
/// Conservation of the potential drops fixes the covariant components of
/// the mapped field along the (generally non-orthogonal) separation
/// directions; inverting their Gram matrix yields the contravariant weights
/// reconstructing the Cartesian vector.
fn mapped_efield_from_separations(
    separation_1: &Vec3<ftr>,
    separation_2: &Vec3<ftr>,
    origin_e_azimuthal: ftr,
    origin_e_meridional: ftr,
) -> TraceResult<Vec3<ftr>> {
    let length_1 = separation_1.length();
    let length_2 = separation_2.length();
    if length_1 < DEGENERACY_TOLERANCE || length_2 < DEGENERACY_TOLERANCE {
        return Err(TraceError::DegenerateGeometry {
            length_1,
            length_2,
            cos_angle: 0.0,
        });
    }

    let unit_1 = separation_1 / length_1;
    let unit_2 = separation_2 / length_2;
    let cos_angle = unit_1.dot(&unit_2);
    let sin_squared = 1.0 - cos_angle * cos_angle;
    if sin_squared < DEGENERACY_TOLERANCE {
        return Err(TraceError::DegenerateGeometry {
            length_1,
            length_2,
            cos_angle,
        });
    }

    // Covariant components of the mapped field along the unit separations
    let covariant_1 = origin_e_azimuthal / length_1;
    let covariant_2 = origin_e_meridional / length_2;

    let contravariant_1 = (covariant_1 - cos_angle * covariant_2) / sin_squared;
    let contravariant_2 = (covariant_2 - cos_angle * covariant_1) / sin_squared;

    Ok(unit_1 * contravariant_1 + unit_2 * contravariant_2)
}

#[cfg(test)]
mod tests {

    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn transverse_basis_is_orthonormal_and_right_handed() {
        let direction = Vec3::new(0.1, -0.5, 0.6).normalized();
        let radial_dir = Vec3::new(1.0, 0.2, 0.1).normalized();
        let (azimuthal, meridional) = transverse_basis(&direction, &radial_dir);

        assert_relative_eq!(azimuthal.length(), 1.0, max_relative = 1e-12);
        assert_relative_eq!(meridional.length(), 1.0, max_relative = 1e-12);
        assert_abs_diff_eq!(azimuthal.dot(&meridional), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(azimuthal.dot(&direction), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(meridional.dot(&direction), 0.0, epsilon = 1e-12);
        // meridional x azimuthal points along the field
        assert_relative_eq!(
            meridional.cross(&azimuthal).dot(&direction),
            1.0,
            max_relative = 1e-12
        );
    }

    #[test]
    fn transverse_basis_survives_field_aligned_radial_direction() {
        let direction = Vec3::new(0.0, 0.0, 1.0);
        let (azimuthal, meridional) = transverse_basis(&direction, &direction);
        assert_relative_eq!(azimuthal.length(), 1.0, max_relative = 1e-12);
        assert_abs_diff_eq!(azimuthal.dot(&direction), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(meridional.dot(&direction), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn orthonormal_separations_reproduce_the_input_components() {
        let separation_1 = Vec3::new(1.0, 0.0, 0.0);
        let separation_2 = Vec3::new(0.0, 1.0, 0.0);
        let mapped =
            mapped_efield_from_separations(&separation_1, &separation_2, 2.5, -1.5).unwrap();
        assert_abs_diff_eq!(mapped, Vec3::new(2.5, -1.5, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn stretched_separations_attenuate_the_mapped_field() {
        // Doubling both separations (a widening flux tube) must halve the field
        let separation_1 = Vec3::new(2.0, 0.0, 0.0);
        let separation_2 = Vec3::new(0.0, 2.0, 0.0);
        let mapped =
            mapped_efield_from_separations(&separation_1, &separation_2, 1.0, 1.0).unwrap();
        assert_abs_diff_eq!(mapped, Vec3::new(0.5, 0.5, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn mapped_field_satisfies_the_potential_drop_constraints() {
        // Skewed, unequal separations: the defining property is that the
        // projections onto the separations recover the covariant inputs
        let separation_1 = Vec3::new(1.5, 0.2, -0.3);
        let separation_2 = Vec3::new(0.4, 2.0, 0.6);
        let (e_azimuthal, e_meridional) = (0.8, -2.3);
        let mapped =
            mapped_efield_from_separations(&separation_1, &separation_2, e_azimuthal, e_meridional)
                .unwrap();

        assert_relative_eq!(mapped.dot(&separation_1), e_azimuthal, max_relative = 1e-10);
        assert_relative_eq!(mapped.dot(&separation_2), e_meridional, max_relative = 1e-10);
        // The mapped field lies in the plane spanned by the separations
        let normal = separation_1.cross(&separation_2);
        assert_abs_diff_eq!(mapped.dot(&normal), 0.0, epsilon = 1e-10);
    }

    #[test]
    fn collinear_separations_are_rejected() {
        let separation_1 = Vec3::new(1.0, 1.0, 0.0);
        let separation_2 = Vec3::new(2.0, 2.0, 0.0);
        let result = mapped_efield_from_separations(&separation_1, &separation_2, 1.0, 1.0);
        assert!(matches!(
            result,
            Err(TraceError::DegenerateGeometry { .. })
        ));
    }

    #[test]
    fn vanishing_separations_are_rejected() {
        let separation_1 = Vec3::zero();
        let separation_2 = Vec3::new(0.0, 1.0, 0.0);
        let result = mapped_efield_from_separations(&separation_1, &separation_2, 1.0, 1.0);
        assert!(matches!(
            result,
            Err(TraceError::DegenerateGeometry { .. })
        ));
    }
}
