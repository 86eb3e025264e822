//! Error types for trace and field mapping operations.

use crate::integrate::RootFindError;
use thiserror::Error;

/// Errors that can occur while tracing a field line or mapping an
/// electric field along it.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum TraceError {
    /// Refinement of the stopping-condition crossing failed.
    #[error("crossing refinement failed: {0}")]
    RootFind(#[from] RootFindError),

    /// The field model returned a vanishing field vector, leaving the
    /// trace direction undefined.
    #[error("magnetic field vanishes at [{x}, {y}, {z}]")]
    NullField { x: f64, y: f64, z: f64 },

    /// The separation vectors have become too short or too close to
    /// parallel for the field mapping to be defined.
    #[error(
        "separation vectors have collapsed \
         (lengths {length_1:e} and {length_2:e}, cosine of angle {cos_angle})"
    )]
    DegenerateGeometry {
        length_1: f64,
        length_2: f64,
        cos_angle: f64,
    },

    /// The trace record does not carry separation vectors.
    #[error("trace record carries no separation vectors")]
    SeparationUnavailable,
}

pub type TraceResult<T> = Result<T, TraceError>;
