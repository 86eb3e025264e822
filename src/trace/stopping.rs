//! Stopping conditions for field line traces.

use super::ftr;
use crate::{constants::R_EARTH_KM, geometry::Vec3};

#[cfg(feature = "serialization")]
use serde::Serialize;

/// Condition under which a trace stops before its step budget runs out.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub enum StoppingCriterion {
    /// Never stop early; run until the step budget is exhausted.
    None,
    /// Stop when descending below the given height above the surface [km].
    HeightThreshold { height: ftr },
    /// Stop when crossing the magnetic equator, detected as the radial
    /// distance starting to decrease.
    MagneticEquator,
}

impl StoppingCriterion {
    /// Whether a detected stop is followed by regula-falsi refinement of
    /// the crossing location.
    pub fn requires_refinement(self) -> bool {
        !matches!(self, Self::None)
    }

    pub(super) fn validate(self) {
        if let Self::HeightThreshold { height } = self {
            assert!(
                height >= 0.0,
                "Threshold height must be larger than or equal to zero."
            );
        }
    }
}

/// Evaluates the per-step stopping predicate for one trace run.
///
/// The magnetic equator criterion compares the radial distance against the
/// previous step, so each run needs a fresh detector; the driver constructs
/// one per trace and never shares it.
#[derive(Clone, Debug)]
pub(super) struct StoppingDetector {
    criterion: StoppingCriterion,
    last_radius: Option<ftr>,
}

impl StoppingDetector {
    pub fn new(criterion: StoppingCriterion) -> Self {
        Self {
            criterion,
            last_radius: None,
        }
    }

    /// Inspects the position components of a freshly accepted state and
    /// decides whether the trace should stop.
    pub fn should_stop(&mut self, state: &[ftr]) -> bool {
        let radius = Vec3::from_slice(state).length();
        match self.criterion {
            StoppingCriterion::None => false,
            StoppingCriterion::HeightThreshold { height } => {
                R_EARTH_KM * (radius - 1.0) < height
            }
            StoppingCriterion::MagneticEquator => {
                let decreased = self
                    .last_radius
                    .map_or(false, |last_radius| radius < last_radius);
                self.last_radius = Some(radius);
                decreased
            }
        }
    }
}

/// Signed residual whose root marks the height-threshold crossing [km].
pub(super) fn height_residual(state: &[ftr], threshold_height: ftr) -> ftr {
    let radius = Vec3::from_slice(state).length();
    R_EARTH_KM * (radius - 1.0) - threshold_height
}

/// Radial expansion rate `dr/ds` along the traversal direction, whose root
/// marks the apex of the field line.
pub(super) fn radial_rate(state: &[ftr], direction: &Vec3<ftr>) -> ftr {
    let radial_dir = Vec3::from_slice(state).normalized();
    direction.dot(&radial_dir)
}
