//! Tracing field lines of a geomagnetic field model.

pub mod driver;
pub mod model;
pub mod stopping;

use crate::{
    constants::R_EARTH_KM,
    geometry::{Point3, Vec3},
};

#[cfg(feature = "serialization")]
use serde::Serialize;

/// Floating-point precision to use for tracing.
#[allow(non_camel_case_types)]
pub type ftr = f64;

/// Stepping along the field line in the same direction as the field or opposite.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub enum SteppingSense {
    Same,
    Opposite,
}

impl SteppingSense {
    /// Returns the sign to apply to the field direction when stepping.
    pub fn sign(self) -> ftr {
        match self {
            Self::Same => 1.0,
            Self::Opposite => -1.0,
        }
    }
}

/// Whether to print progress information.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Verbose {
    Yes,
    No,
}

impl Verbose {
    pub fn is_yes(self) -> bool {
        self == Self::Yes
    }
}

/// How a completed trace ended.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub enum TraceStatus {
    /// The stopping condition was detected and the crossing refined.
    CompletedNormally,
    /// The step budget ran out before any stopping condition was detected.
    ///
    /// For traces without a stopping condition this is the expected outcome;
    /// otherwise the caller may retry with a larger budget.
    MaxStepsReached,
}

/// The integration state and field sample recorded at one point along a trace.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct TraceSample {
    arc_length: ftr,
    state: Vec<ftr>,
    field: Vec3<ftr>,
}

impl TraceSample {
    pub(crate) fn new(arc_length: ftr, state: Vec<ftr>, field: Vec3<ftr>) -> Self {
        debug_assert!(state.len() == 3 || state.len() == 9);
        Self {
            arc_length,
            state,
            field,
        }
    }

    /// Returns the arc length along the field line at which the sample was taken.
    pub fn arc_length(&self) -> ftr {
        self.arc_length
    }

    /// Returns the full integration state vector (of length 3, or 9 when
    /// separation vectors are co-evolved).
    pub fn state(&self) -> &[ftr] {
        &self.state
    }

    /// Returns the sampled position [Earth radii, geocentric Cartesian].
    pub fn position(&self) -> Point3<ftr> {
        Point3::from_slice(&self.state)
    }

    /// Returns the separation vectors, if the trace co-evolved them.
    pub fn separation_vectors(&self) -> Option<(Vec3<ftr>, Vec3<ftr>)> {
        if self.state.len() == 9 {
            Some((
                Vec3::from_slice(&self.state[3..6]),
                Vec3::from_slice(&self.state[6..9]),
            ))
        } else {
            None
        }
    }

    /// Returns the magnetic field vector [nT] sampled at the position.
    pub fn field(&self) -> &Vec3<ftr> {
        &self.field
    }

    /// Returns the radial distance of the position from the Earth's center
    /// [Earth radii].
    pub fn radius(&self) -> ftr {
        self.position().to_vec3().length()
    }

    /// Returns the height of the position above the surface [km].
    pub fn height(&self) -> ftr {
        R_EARTH_KM * (self.radius() - 1.0)
    }
}

/// The ordered samples produced by tracing a single field line.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct TraceRecord {
    samples: Vec<TraceSample>,
    status: TraceStatus,
    refinement_iterations: Option<u32>,
}

impl TraceRecord {
    pub(crate) fn new(
        samples: Vec<TraceSample>,
        status: TraceStatus,
        refinement_iterations: Option<u32>,
    ) -> Self {
        assert!(!samples.is_empty());
        Self {
            samples,
            status,
            refinement_iterations,
        }
    }

    /// Returns the recorded samples, ordered by arc length.
    pub fn samples(&self) -> &[TraceSample] {
        &self.samples
    }

    /// Returns how the trace ended.
    pub fn status(&self) -> TraceStatus {
        self.status
    }

    /// Returns the number of regula-falsi iterations spent refining the
    /// stopping-condition crossing, if refinement took place.
    pub fn refinement_iterations(&self) -> Option<u32> {
        self.refinement_iterations
    }

    /// Returns the sample at the start of the trace.
    pub fn origin(&self) -> &TraceSample {
        self.samples.first().unwrap()
    }

    /// Returns the sample at the end of the trace.
    pub fn terminus(&self) -> &TraceSample {
        self.samples.last().unwrap()
    }

    /// Returns the total arc length covered by the trace.
    pub fn total_length(&self) -> ftr {
        self.terminus().arc_length() - self.origin().arc_length()
    }
}
