//! Geomagnetic field models.

use crate::{
    constants::{DEG_TO_RAD, R_EARTH_KM},
    geometry::{
        Dim3::{X, Y, Z},
        Mat3, Point3, Vec3,
    },
};

#[cfg(feature = "serialization")]
use serde::Serialize;

/// Floating-point precision to use for field data.
#[allow(non_camel_case_types)]
pub type fdt = f64;

/// Position offset to use for finite-difference Jacobian estimation [Earth radii].
const JACOBIAN_STEP: fdt = 1e-5;

/// Defines the properties of a geomagnetic field model.
///
/// Positions are geocentric Cartesian coordinates normalized by the Earth
/// radius, with the z-axis through the geographic north pole. Field vectors
/// are given in the same frame.
pub trait FieldModel: Sync {
    /// Evaluates the magnetic field vector [nT] at the given position.
    fn field_vector(&self, position: &Point3<fdt>) -> Vec3<fdt>;

    /// Evaluates the spatial Jacobian `d B_i / d x_j` [nT per Earth radius]
    /// at the given position.
    ///
    /// The default implementation estimates the Jacobian with central
    /// finite differences, so models only have to supply the field itself.
    fn field_jacobian(&self, position: &Point3<fdt>) -> Mat3<fdt> {
        let column_for = |dim| {
            let mut offset = Vec3::zero();
            offset[dim] = JACOBIAN_STEP;
            let forward = self.field_vector(&(position + &offset));
            let backward = self.field_vector(&(position - &offset));
            (forward - backward) / (2.0 * JACOBIAN_STEP)
        };
        let column_x = column_for(X);
        let column_y = column_for(Y);
        let column_z = column_for(Z);
        Mat3::with_each_element(|row, col| match col {
            X => column_x[row],
            Y => column_y[row],
            Z => column_z[row],
        })
    }
}

/// An epoch selecting which realization of a time-dependent field model to query.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct Epoch {
    year: u32,
    day_of_year: u32,
}

impl Epoch {
    /// Creates a new epoch for the given year and day of year (starting at 1).
    pub fn new(year: u32, day_of_year: u32) -> Self {
        assert!(
            day_of_year >= 1 && day_of_year <= 366,
            "Day of year must be in the range [1, 366]."
        );
        Self { year, day_of_year }
    }

    /// Returns the epoch expressed as a decimal year.
    pub fn as_decimal_year(&self) -> fdt {
        fdt::from(self.year) + fdt::from(self.day_of_year - 1) / 365.25
    }
}

/// A centered tilted dipole approximation to the geomagnetic main field.
///
/// The dipole moment is derived from the degree-one Gauss coefficients of
/// the IGRF-13 model, interpolated linearly between the tabulated epochs.
#[derive(Clone, Debug)]
pub struct DipoleField {
    /// Dipole moment expressed through the Gauss coefficients `(g11, h11, g10)` [nT].
    moment: Vec3<fdt>,
}

impl DipoleField {
    /// Degree-one Gauss coefficients `(g10, g11, h11)` [nT] at the IGRF-13 epochs.
    const GAUSS_COEFFICIENTS: [(fdt, [fdt; 3]); 13] = [
        (1965.0, [-30334.0, -2119.0, 5776.0]),
        (1970.0, [-30220.0, -2068.0, 5737.0]),
        (1975.0, [-30100.0, -2013.0, 5675.0]),
        (1980.0, [-29992.0, -1956.0, 5604.0]),
        (1985.0, [-29873.0, -1905.0, 5500.0]),
        (1990.0, [-29775.0, -1848.0, 5406.0]),
        (1995.0, [-29692.0, -1784.0, 5306.0]),
        (2000.0, [-29619.4, -1728.2, 5186.1]),
        (2005.0, [-29554.6, -1669.0, 5077.9]),
        (2010.0, [-29496.6, -1586.4, 4944.3]),
        (2015.0, [-29441.5, -1501.8, 4795.3]),
        (2020.0, [-29404.8, -1450.9, 4652.5]),
        (2025.0, [-29350.0, -1410.3, 4545.5]),
    ];

    /// Creates a new dipole field for the given epoch.
    pub fn for_epoch(epoch: Epoch) -> Self {
        let [g10, g11, h11] = Self::interpolated_coefficients(epoch.as_decimal_year());
        Self {
            moment: Vec3::new(g11, h11, g10),
        }
    }

    /// Creates a new axial dipole field with the given equatorial
    /// surface strength [nT].
    pub fn axial(equatorial_strength: fdt) -> Self {
        assert!(
            equatorial_strength > 0.0,
            "Equatorial strength must be larger than zero."
        );
        Self {
            moment: Vec3::new(0.0, 0.0, -equatorial_strength),
        }
    }

    /// Returns the dipole moment vector `(g11, h11, g10)` [nT].
    pub fn moment(&self) -> &Vec3<fdt> {
        &self.moment
    }

    fn interpolated_coefficients(decimal_year: fdt) -> [fdt; 3] {
        let table = &Self::GAUSS_COEFFICIENTS;
        if decimal_year <= table[0].0 {
            return table[0].1;
        }
        if decimal_year >= table[table.len() - 1].0 {
            return table[table.len() - 1].1;
        }
        let upper_idx = table
            .iter()
            .position(|&(year, _)| year > decimal_year)
            .unwrap();
        let (year_below, below) = table[upper_idx - 1];
        let (year_above, above) = table[upper_idx];
        let weight = (decimal_year - year_below) / (year_above - year_below);
        [
            below[0] + weight * (above[0] - below[0]),
            below[1] + weight * (above[1] - below[1]),
            below[2] + weight * (above[2] - below[2]),
        ]
    }
}

impl FieldModel for DipoleField {
    fn field_vector(&self, position: &Point3<fdt>) -> Vec3<fdt> {
        let radius_vector = position.to_vec3();
        if radius_vector.is_zero() {
            return Vec3::zero();
        }
        let radius = radius_vector.length();
        let radial_dir = &radius_vector / radius;
        let aligned_moment = self.moment.dot(&radial_dir);
        (&radial_dir * (3.0 * aligned_moment) - self.moment.clone())
            / (radius * radius * radius)
    }

    fn field_jacobian(&self, position: &Point3<fdt>) -> Mat3<fdt> {
        let radius_vector = position.to_vec3();
        let radius = radius_vector.length();
        let radial_dir = &radius_vector / radius;
        let aligned_moment = self.moment.dot(&radial_dir);

        let moment_radial = Mat3::outer(&self.moment, &radial_dir);
        let radial_moment = Mat3::outer(&radial_dir, &self.moment);
        let radial_radial = Mat3::outer(&radial_dir, &radial_dir);
        let aligned_identity = &Mat3::identity() * aligned_moment;

        let inner = &(&moment_radial - &(&radial_radial * (5.0 * aligned_moment)))
            + &(&radial_moment + &aligned_identity);
        &inner * (3.0 / (radius * radius * radius * radius))
    }
}

/// A purely radial reference field `B = B0 r_hat / r^2`.
///
/// Physically this is a magnetic monopole, which makes it useless as a
/// geomagnetic model, but its field lines and separation transport have
/// closed-form solutions that make it valuable for validation.
#[derive(Clone, Debug)]
pub struct RadialField {
    surface_strength: fdt,
}

impl RadialField {
    /// Creates a new radial field with the given surface strength [nT].
    pub fn new(surface_strength: fdt) -> Self {
        assert!(
            surface_strength != 0.0,
            "Surface strength must be nonzero."
        );
        Self { surface_strength }
    }
}

impl FieldModel for RadialField {
    fn field_vector(&self, position: &Point3<fdt>) -> Vec3<fdt> {
        let radius_vector = position.to_vec3();
        if radius_vector.is_zero() {
            return Vec3::zero();
        }
        let radius = radius_vector.length();
        &radius_vector * (self.surface_strength / (radius * radius * radius))
    }

    fn field_jacobian(&self, position: &Point3<fdt>) -> Mat3<fdt> {
        let radius_vector = position.to_vec3();
        let radius = radius_vector.length();
        let radial_dir = &radius_vector / radius;
        let scale = self.surface_strength / (radius * radius * radius);
        &(&Mat3::identity() - &(&Mat3::outer(&radial_dir, &radial_dir) * 3.0)) * scale
    }
}

/// Adapts a field sampler giving local spherical-polar components
/// `(B_r, B_theta, B_phi)` to the geocentric Cartesian frame.
///
/// This is the natural seam for spherical-harmonic models like the full
/// IGRF, whose synthesis codes produce spherical components.
pub struct SphericalComponentField<S> {
    sampler: S,
}

impl<S> SphericalComponentField<S>
where
    S: Fn(fdt, fdt, fdt) -> (fdt, fdt, fdt) + Sync,
{
    /// Creates a new adapter around the given sampler, which will be called
    /// with colatitude [rad], longitude [rad] and radius [Earth radii] and
    /// must return the `(B_r, B_theta, B_phi)` field components [nT].
    pub fn new(sampler: S) -> Self {
        Self { sampler }
    }
}

impl<S> FieldModel for SphericalComponentField<S>
where
    S: Fn(fdt, fdt, fdt) -> (fdt, fdt, fdt) + Sync,
{
    fn field_vector(&self, position: &Point3<fdt>) -> Vec3<fdt> {
        let radius_vector = position.to_vec3();
        if radius_vector.is_zero() {
            return Vec3::zero();
        }
        let radius = radius_vector.length();
        let colatitude = fdt::acos(position[Z] / radius);
        let longitude = fdt::atan2(position[Y], position[X]);

        let (b_r, b_theta, b_phi) = (self.sampler)(colatitude, longitude, radius);
        spherical_to_cartesian_rotation(colatitude, longitude)
            .mul_vec3(&Vec3::new(b_r, b_theta, b_phi))
    }
}

/// Constructs the rotation matrix taking local spherical-polar vector
/// components `(v_r, v_theta, v_phi)` at the given colatitude and longitude
/// [rad] into geocentric Cartesian components.
pub fn spherical_to_cartesian_rotation(colatitude: fdt, longitude: fdt) -> Mat3<fdt> {
    let (sin_theta, cos_theta) = colatitude.sin_cos();
    let (sin_phi, cos_phi) = longitude.sin_cos();
    Mat3::from_rows(
        Vec3::new(sin_theta * cos_phi, cos_theta * cos_phi, -sin_phi),
        Vec3::new(sin_theta * sin_phi, cos_theta * sin_phi, cos_phi),
        Vec3::new(cos_theta, -sin_theta, 0.0),
    )
}

/// A position given in geographic coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct GeographicPosition {
    /// Latitude [deg], positive northward.
    latitude: fdt,
    /// Longitude [deg], positive eastward.
    longitude: fdt,
    /// Height above the mean Earth radius [km].
    height: fdt,
}

impl GeographicPosition {
    /// Creates a new geographic position from the given latitude [deg],
    /// longitude [deg] and height above the surface [km].
    pub fn new(latitude: fdt, longitude: fdt, height: fdt) -> Self {
        assert!(
            (-90.0..=90.0).contains(&latitude),
            "Latitude must be in the range [-90, 90]."
        );
        Self {
            latitude,
            longitude,
            height,
        }
    }

    /// Returns the latitude [deg].
    pub fn latitude(&self) -> fdt {
        self.latitude
    }

    /// Returns the longitude [deg].
    pub fn longitude(&self) -> fdt {
        self.longitude
    }

    /// Returns the height above the surface [km].
    pub fn height(&self) -> fdt {
        self.height
    }

    /// Converts the position to normalized geocentric Cartesian
    /// coordinates [Earth radii].
    pub fn to_geocentric(&self) -> Point3<fdt> {
        let radius = 1.0 + self.height / R_EARTH_KM;
        let (sin_lat, cos_lat) = (self.latitude * DEG_TO_RAD).sin_cos();
        let (sin_lon, cos_lon) = (self.longitude * DEG_TO_RAD).sin_cos();
        Point3::new(
            radius * cos_lat * cos_lon,
            radius * cos_lat * sin_lon,
            radius * sin_lat,
        )
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn axial_dipole_has_textbook_equator_and_pole_strengths() {
        let field = DipoleField::axial(31000.0);

        let equator = field.field_vector(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(equator.length(), 31000.0, max_relative = 1e-12);
        // Horizontal and pointing north at the equator
        assert_abs_diff_eq!(equator, Vec3::new(0.0, 0.0, 31000.0));

        let north_pole = field.field_vector(&Point3::new(0.0, 0.0, 1.0));
        assert_relative_eq!(north_pole.length(), 62000.0, max_relative = 1e-12);
        // Pointing down into the ground at the north geographic pole
        assert!(north_pole[Z] < 0.0);
    }

    #[test]
    fn dipole_strength_falls_off_with_radius_cubed() {
        let field = DipoleField::axial(31000.0);
        let near = field.field_vector(&Point3::new(1.0, 0.0, 0.0)).length();
        let far = field.field_vector(&Point3::new(2.0, 0.0, 0.0)).length();
        assert_relative_eq!(near / far, 8.0, max_relative = 1e-12);
    }

    #[test]
    fn epoch_interpolation_brackets_tabulated_coefficients() {
        let at_2015 = DipoleField::for_epoch(Epoch::new(2015, 1));
        assert_relative_eq!(at_2015.moment()[Z], -29441.5, max_relative = 1e-3);

        let between = DipoleField::for_epoch(Epoch::new(2017, 183));
        assert!(between.moment()[Z] > -29441.5 && between.moment()[Z] < -29404.8);
    }

    #[test]
    fn analytic_dipole_jacobian_matches_finite_differences() {
        let field = DipoleField::for_epoch(Epoch::new(2020, 1));
        let position = Point3::new(1.3, -0.4, 0.8);

        struct FieldOnly<'a>(&'a DipoleField);
        impl FieldModel for FieldOnly<'_> {
            fn field_vector(&self, position: &Point3<fdt>) -> Vec3<fdt> {
                self.0.field_vector(position)
            }
        }

        let analytic = field.field_jacobian(&position);
        let numeric = FieldOnly(&field).field_jacobian(&position);
        assert_relative_eq!(analytic, numeric, epsilon = 1e-4, max_relative = 1e-5);
    }

    #[test]
    fn analytic_radial_jacobian_matches_finite_differences() {
        let field = RadialField::new(1000.0);
        let position = Point3::new(0.7, 1.1, -0.3);

        struct FieldOnly<'a>(&'a RadialField);
        impl FieldModel for FieldOnly<'_> {
            fn field_vector(&self, position: &Point3<fdt>) -> Vec3<fdt> {
                self.0.field_vector(position)
            }
        }

        let analytic = field.field_jacobian(&position);
        let numeric = FieldOnly(&field).field_jacobian(&position);
        assert_relative_eq!(analytic, numeric, epsilon = 1e-6, max_relative = 1e-5);
    }

    #[test]
    fn spherical_adapter_reconstructs_radial_field() {
        let reference = RadialField::new(500.0);
        let adapted = SphericalComponentField::new(|_colatitude, _longitude, radius: fdt| {
            (500.0 / (radius * radius), 0.0, 0.0)
        });

        let position = Point3::new(0.5, -1.2, 0.9);
        assert_relative_eq!(
            adapted.field_vector(&position),
            reference.field_vector(&position),
            max_relative = 1e-12
        );
    }

    #[test]
    fn spherical_rotation_is_orthonormal() {
        let rotation = spherical_to_cartesian_rotation(1.1, -2.3);
        let product = &rotation * &rotation.transposed();
        assert_relative_eq!(product, Mat3::identity(), epsilon = 1e-12);
    }

    #[test]
    fn geographic_conversion_covers_reference_points() {
        let equator = GeographicPosition::new(0.0, 0.0, 0.0).to_geocentric();
        assert_abs_diff_eq!(equator, Point3::new(1.0, 0.0, 0.0), epsilon = 1e-12);

        let north_pole = GeographicPosition::new(90.0, 45.0, 0.0).to_geocentric();
        assert_abs_diff_eq!(north_pole, Point3::new(0.0, 0.0, 1.0), epsilon = 1e-12);

        let raised = GeographicPosition::new(0.0, 90.0, R_EARTH_KM).to_geocentric();
        assert_abs_diff_eq!(raised, Point3::new(0.0, 2.0, 0.0), epsilon = 1e-12);
    }
}
