//! Physics models binding a field model to the trace integrator.

use super::{ftr, SteppingSense};
use crate::{
    efield,
    error::{TraceError, TraceResult},
    field::FieldModel,
    geometry::{
        Dim3::{X, Y, Z},
        Mat3, Point3, Vec3,
    },
};

/// Largest acceptable magnitude of the dot product between a separation
/// vector and the local field direction.
pub const ORTHOGONALITY_TOLERANCE: ftr = 1e-5;

/// Defines the properties of a physics model evolved along a field line.
///
/// A model owns the shape and meaning of the integration state vector: its
/// first three components are always the position, and any further
/// components are auxiliary quantities co-evolved with the trace.
pub trait TraceModel {
    /// Returns the number of components in the integration state vector.
    fn state_len(&self) -> usize;

    /// Builds the initial state vector for a trace starting at the given position.
    fn initial_state(&self, position: &Point3<ftr>) -> TraceResult<Vec<ftr>>;

    /// Evaluates the state derivative with respect to arc length.
    fn derivative(&self, y: &[ftr], s: ftr) -> Vec<ftr>;

    /// Checks the numerical health of a freshly accepted state, warning
    /// about violations without interrupting the trace.
    fn verify_step(&self, _y: &[ftr], _s: ftr) {}
}

fn position_of(y: &[ftr]) -> Point3<ftr> {
    Point3::from_slice(y)
}

/// Computes the unit direction to step in at the given position, or `None`
/// where the field vanishes.
fn stepping_direction<M: FieldModel>(
    model: &M,
    sense: SteppingSense,
    position: &Point3<ftr>,
) -> Option<Vec3<ftr>> {
    let field = model.field_vector(position);
    if field.is_zero() {
        None
    } else {
        Some(&field.normalized() * sense.sign())
    }
}

fn null_field_error(position: &Point3<ftr>) -> TraceError {
    TraceError::NullField {
        x: position[X],
        y: position[Y],
        z: position[Z],
    }
}

/// A model tracing the field line geometry alone.
///
/// The state vector is the position, and the derivative is the unit field
/// direction, making the path parameter coincide with arc length.
#[derive(Clone, Debug)]
pub struct FieldLineModel<'a, M> {
    model: &'a M,
    sense: SteppingSense,
}

impl<'a, M: FieldModel> FieldLineModel<'a, M> {
    /// Creates a new field line model stepping in the given sense.
    pub fn new(model: &'a M, sense: SteppingSense) -> Self {
        Self { model, sense }
    }
}

impl<M: FieldModel> TraceModel for FieldLineModel<'_, M> {
    fn state_len(&self) -> usize {
        3
    }

    fn initial_state(&self, position: &Point3<ftr>) -> TraceResult<Vec<ftr>> {
        if self.model.field_vector(position).is_zero() {
            return Err(null_field_error(position));
        }
        Ok(vec![position[X], position[Y], position[Z]])
    }

    fn derivative(&self, y: &[ftr], _s: ftr) -> Vec<ftr> {
        let position = position_of(y);
        match stepping_direction(self.model, self.sense, &position) {
            Some(direction) => vec![direction[X], direction[Y], direction[Z]],
            // A vanishing field leaves the direction undefined; returning a
            // zero derivative stalls the trace instead of producing NaNs
            None => vec![0.0; 3],
        }
    }
}

/// A model co-evolving two infinitesimal field line separation vectors
/// with the traced position.
///
/// The separation vectors start out as the unit azimuthal and meridional
/// directions transverse to the field and pick up the stretching and
/// rotation of neighboring field lines along the trace, which is what the
/// electric field mapping in [`efield`](crate::efield) consumes.
#[derive(Clone, Debug)]
pub struct SeparationModel<'a, M> {
    model: &'a M,
    sense: SteppingSense,
}

impl<'a, M: FieldModel> SeparationModel<'a, M> {
    /// Creates a new separation model stepping in the given sense.
    pub fn new(model: &'a M, sense: SteppingSense) -> Self {
        Self { model, sense }
    }

    /// Computes the transverse field gradient `T = (I - mu mu^T) (dB/dx) / |B|`.
    fn transverse_gradient(&self, position: &Point3<ftr>, direction: &Vec3<ftr>) -> Mat3<ftr> {
        let field_strength = self.model.field_vector(position).length();
        let jacobian = self.model.field_jacobian(position);
        let transverse_projection = &Mat3::identity() - &Mat3::outer(direction, direction);
        &transverse_projection * &jacobian / field_strength
    }
}

impl<M: FieldModel> TraceModel for SeparationModel<'_, M> {
    fn state_len(&self) -> usize {
        9
    }

    fn initial_state(&self, position: &Point3<ftr>) -> TraceResult<Vec<ftr>> {
        let direction = stepping_direction(self.model, self.sense, position)
            .ok_or_else(|| null_field_error(position))?;
        let radial_dir = position.to_vec3().normalized();
        let (azimuthal, meridional) = efield::transverse_basis(&direction, &radial_dir);

        Ok(vec![
            position[X],
            position[Y],
            position[Z],
            azimuthal[X],
            azimuthal[Y],
            azimuthal[Z],
            meridional[X],
            meridional[Y],
            meridional[Z],
        ])
    }

    fn derivative(&self, y: &[ftr], _s: ftr) -> Vec<ftr> {
        let position = position_of(y);
        let field = self.model.field_vector(&position);
        if field.is_zero() {
            return vec![0.0; 9];
        }
        let direction = field.normalized();
        let transverse_gradient = self.transverse_gradient(&position, &direction);
        let gradient_along_field = transverse_gradient.mul_vec3(&direction);

        let sign = self.sense.sign();
        let signed_direction = &direction * sign;
        let mut derivative = Vec::with_capacity(9);
        for dim in [X, Y, Z] {
            derivative.push(signed_direction[dim]);
        }
        for separation in [Vec3::from_slice(&y[3..6]), Vec3::from_slice(&y[6..9])] {
            let stretch = transverse_gradient.mul_vec3(&separation)
                - &direction * separation.dot(&gradient_along_field);
            for dim in [X, Y, Z] {
                derivative.push(sign * stretch[dim]);
            }
        }
        derivative
    }

    fn verify_step(&self, y: &[ftr], s: ftr) {
        let position = position_of(y);
        let field = self.model.field_vector(&position);
        if field.is_zero() {
            return;
        }
        let direction = field.normalized();
        let drift_1 = Vec3::from_slice(&y[3..6]).dot(&direction);
        let drift_2 = Vec3::from_slice(&y[6..9]).dot(&direction);
        if drift_1.abs() > ORTHOGONALITY_TOLERANCE || drift_2.abs() > ORTHOGONALITY_TOLERANCE {
            eprintln!(
                "Warning: separation vectors drifting out of the transverse plane \
                 at arc length {}: w1.b = {:e}, w2.b = {:e}",
                s, drift_1, drift_2
            );
        }
    }
}
