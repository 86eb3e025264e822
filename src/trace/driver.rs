//! Driving field line traces through a geomagnetic field model.

use super::{
    ftr,
    model::{FieldLineModel, SeparationModel, TraceModel},
    stopping::{height_residual, radial_rate, StoppingCriterion, StoppingDetector},
    SteppingSense, TraceRecord, TraceSample, TraceStatus, Verbose,
};
use crate::{
    error::TraceResult,
    field::{FieldModel, GeographicPosition},
    geometry::{Point3, Vec3},
    integrate::{find_root, rk4_step},
};
use rayon::prelude::*;

/// Configuration parameters for field line tracers.
#[derive(Clone, Debug)]
pub struct FieldLineTracerConfig {
    /// Direction to trace the field line relative to the field direction.
    pub sense: SteppingSense,
    /// Condition under which the trace stops before its step budget runs out.
    pub stopping_criterion: StoppingCriterion,
    /// Arc length to advance per step [Earth radii].
    pub step_length: ftr,
    /// Maximum number of steps before terminating.
    pub max_steps: usize,
    /// Largest acceptable bracket shrinkage when refining the
    /// stopping-condition crossing [Earth radii].
    pub refinement_tolerance: ftr,
    /// Maximum number of regula-falsi iterations when refining.
    pub max_refinement_iterations: u32,
}

impl FieldLineTracerConfig {
    pub const DEFAULT_SENSE: SteppingSense = SteppingSense::Same;
    pub const DEFAULT_STOPPING_CRITERION: StoppingCriterion = StoppingCriterion::None;
    pub const DEFAULT_STEP_LENGTH: ftr = 1e-2;
    pub const DEFAULT_MAX_STEPS: usize = 10_000;
    pub const DEFAULT_REFINEMENT_TOLERANCE: ftr = 1e-6;
    pub const DEFAULT_MAX_REFINEMENT_ITERATIONS: u32 = 100;

    fn validate(&self) {
        assert!(
            self.step_length > 0.0,
            "Step length must be larger than zero."
        );
        assert!(
            self.max_steps > 0,
            "Maximum number of steps must be larger than zero."
        );
        assert!(
            self.refinement_tolerance > 0.0,
            "Refinement tolerance must be larger than zero."
        );
        assert!(
            self.max_refinement_iterations > 0,
            "Maximum number of refinement iterations must be larger than zero."
        );
        self.stopping_criterion.validate();
    }
}

impl Default for FieldLineTracerConfig {
    fn default() -> Self {
        FieldLineTracerConfig {
            sense: Self::DEFAULT_SENSE,
            stopping_criterion: Self::DEFAULT_STOPPING_CRITERION,
            step_length: Self::DEFAULT_STEP_LENGTH,
            max_steps: Self::DEFAULT_MAX_STEPS,
            refinement_tolerance: Self::DEFAULT_REFINEMENT_TOLERANCE,
            max_refinement_iterations: Self::DEFAULT_MAX_REFINEMENT_ITERATIONS,
        }
    }
}

/// Traces field lines of a geomagnetic field model.
#[derive(Clone, Debug)]
pub struct FieldLineTracer<'a, M> {
    config: FieldLineTracerConfig,
    model: &'a M,
}

impl<'a, M: FieldModel> FieldLineTracer<'a, M> {
    /// Creates a new field line tracer for the given field model.
    pub fn new(model: &'a M, config: FieldLineTracerConfig) -> Self {
        config.validate();
        FieldLineTracer { config, model }
    }

    /// Returns a reference to the tracer configuration.
    pub fn config(&self) -> &FieldLineTracerConfig {
        &self.config
    }

    /// Traces the field line geometry from the given start position.
    ///
    /// # Returns
    ///
    /// A `Result` which is either:
    ///
    /// - `Ok`: Contains a `TraceRecord` with the ordered samples and the
    ///   status of the trace.
    /// - `Err`: Contains a `TraceError` describing why the trace failed.
    pub fn trace(&self, start_position: &GeographicPosition) -> TraceResult<TraceRecord> {
        self.run(
            &FieldLineModel::new(self.model, self.config.sense),
            start_position,
        )
    }

    /// Traces the field line from the given start position, co-evolving the
    /// pair of separation vectors needed for electric field mapping.
    pub fn trace_with_separation(
        &self,
        start_position: &GeographicPosition,
    ) -> TraceResult<TraceRecord> {
        self.run(
            &SeparationModel::new(self.model, self.config.sense),
            start_position,
        )
    }

    /// Traces one field line for each of the given seed positions in parallel.
    pub fn trace_set(
        &self,
        seed_positions: &[GeographicPosition],
        verbose: Verbose,
    ) -> Vec<TraceResult<TraceRecord>> {
        if verbose.is_yes() {
            println!("Tracing {} field lines", seed_positions.len());
        }
        seed_positions
            .par_iter()
            .map(|seed_position| self.trace(seed_position))
            .collect()
    }

    fn run<T: TraceModel>(
        &self,
        trace_model: &T,
        start_position: &GeographicPosition,
    ) -> TraceResult<TraceRecord> {
        let step_length = self.config.step_length;
        let rhs = |y: &[ftr], s: ftr| trace_model.derivative(y, s);

        let mut y = trace_model.initial_state(&start_position.to_geocentric())?;
        debug_assert_eq!(y.len(), trace_model.state_len());
        let mut s = 0.0;
        let mut detector = StoppingDetector::new(self.config.stopping_criterion);
        // Prime the detector with the starting radius
        detector.should_stop(&y);

        let mut samples = Vec::with_capacity(self.config.max_steps + 1);
        samples.push(self.sample_at(s, y.clone()));

        let mut stopped = false;
        for _ in 0..self.config.max_steps {
            y = rk4_step(&rhs, &y, s, step_length);
            s += step_length;
            trace_model.verify_step(&y, s);
            samples.push(self.sample_at(s, y.clone()));
            if detector.should_stop(&y) {
                stopped = true;
                break;
            }
        }

        if !(stopped && self.config.stopping_criterion.requires_refinement()) {
            return Ok(TraceRecord::new(samples, TraceStatus::MaxStepsReached, None));
        }

        if let StoppingCriterion::MagneticEquator = self.config.stopping_criterion {
            self.discard_overshot_equator_sample(trace_model, &mut samples);
        }

        let refinement_iterations = self.refine_crossing(trace_model, &mut samples)?;

        Ok(TraceRecord::new(
            samples,
            TraceStatus::CompletedNormally,
            Some(refinement_iterations),
        ))
    }

    fn sample_at(&self, s: ftr, y: Vec<ftr>) -> TraceSample {
        let field = self.model.field_vector(&Point3::from_slice(&y));
        TraceSample::new(s, y, field)
    }

    /// The radius-decrease detection of the magnetic equator is only a
    /// proxy, so the apex may actually lie between the two samples *before*
    /// the detected one. The exact radial rate decides which interval the
    /// refinement should bracket.
    fn discard_overshot_equator_sample<T: TraceModel>(
        &self,
        trace_model: &T,
        samples: &mut Vec<TraceSample>,
    ) {
        if samples.len() < 3 {
            return;
        }
        let predecessor = &samples[samples.len() - 2];
        if self.residual_at(trace_model, predecessor.state(), predecessor.arc_length()) < 0.0 {
            samples.pop();
        }
    }

    fn refine_crossing<T: TraceModel>(
        &self,
        trace_model: &T,
        samples: &mut Vec<TraceSample>,
    ) -> TraceResult<u32> {
        let rhs = |y: &[ftr], s: ftr| trace_model.derivative(y, s);

        let predecessor = &samples[samples.len() - 2];
        let y_start = predecessor.state().to_vec();
        let s_start = predecessor.arc_length();
        let bracket_width = samples.last().unwrap().arc_length() - s_start;

        let residual = |sub_step: ftr| {
            let y_trial = rk4_step(&rhs, &y_start, s_start, sub_step);
            self.residual_at(trace_model, &y_trial, s_start + sub_step)
        };
        let (refined_step, iterations) = find_root(
            residual,
            (0.0, bracket_width),
            self.config.refinement_tolerance,
            self.config.max_refinement_iterations,
        )?;

        let y_refined = rk4_step(&rhs, &y_start, s_start, refined_step);
        samples.pop();
        samples.push(self.sample_at(s_start + refined_step, y_refined));
        Ok(iterations)
    }

    fn residual_at<T: TraceModel>(&self, trace_model: &T, y: &[ftr], s: ftr) -> ftr {
        match self.config.stopping_criterion {
            StoppingCriterion::HeightThreshold { height } => height_residual(y, height),
            StoppingCriterion::MagneticEquator => {
                let direction = Vec3::from_slice(&trace_model.derivative(y, s));
                radial_rate(y, &direction)
            }
            StoppingCriterion::None => unreachable!("unconditional traces are never refined"),
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::{
        constants::R_EARTH_KM,
        field::{DipoleField, RadialField},
        trace::model::ORTHOGONALITY_TOLERANCE,
    };
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn tracer_config(
        sense: SteppingSense,
        stopping_criterion: StoppingCriterion,
        max_steps: usize,
    ) -> FieldLineTracerConfig {
        FieldLineTracerConfig {
            sense,
            stopping_criterion,
            max_steps,
            ..FieldLineTracerConfig::default()
        }
    }

    #[test]
    fn unconditional_trace_consumes_the_whole_step_budget() {
        let field = RadialField::new(1000.0);
        let tracer = FieldLineTracer::new(
            &field,
            tracer_config(SteppingSense::Same, StoppingCriterion::None, 50),
        );
        let record = tracer
            .trace(&GeographicPosition::new(45.0, 10.0, 500.0))
            .unwrap();

        assert_eq!(record.status(), TraceStatus::MaxStepsReached);
        assert_eq!(record.samples().len(), 51);
        assert_eq!(record.refinement_iterations(), None);
    }

    #[test]
    fn unconditional_trace_advances_arc_length_uniformly() {
        let field = RadialField::new(1000.0);
        let tracer = FieldLineTracer::new(
            &field,
            tracer_config(SteppingSense::Same, StoppingCriterion::None, 10),
        );
        let record = tracer
            .trace(&GeographicPosition::new(0.0, 0.0, 0.0))
            .unwrap();

        for (idx, sample) in record.samples().iter().enumerate() {
            assert_relative_eq!(
                sample.arc_length(),
                idx as ftr * FieldLineTracerConfig::DEFAULT_STEP_LENGTH,
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn radial_trace_reaches_the_height_threshold_exactly() {
        // Stepping against the outward radial field descends toward the surface
        let field = RadialField::new(1000.0);
        let tracer = FieldLineTracer::new(
            &field,
            tracer_config(
                SteppingSense::Opposite,
                StoppingCriterion::HeightThreshold { height: 100.0 },
                10_000,
            ),
        );
        let record = tracer
            .trace(&GeographicPosition::new(30.0, -60.0, 500.0))
            .unwrap();

        assert_eq!(record.status(), TraceStatus::CompletedNormally);
        assert_abs_diff_eq!(record.terminus().height(), 100.0, epsilon = 1e-2);
        // The trace is a straight radial descent, so the covered arc length
        // must equal the height difference
        assert_relative_eq!(
            record.total_length(),
            400.0 / R_EARTH_KM,
            max_relative = 1e-6
        );
    }

    #[test]
    fn dipole_trace_reaches_the_height_threshold_exactly() {
        let field = DipoleField::axial(31000.0);
        let tracer = FieldLineTracer::new(
            &field,
            tracer_config(
                SteppingSense::Same,
                StoppingCriterion::HeightThreshold { height: 100.0 },
                10_000,
            ),
        );
        // In the northern hemisphere of an Earth-like dipole the field
        // points down into the ground
        let record = tracer
            .trace(&GeographicPosition::new(70.0, 0.0, 500.0))
            .unwrap();

        assert_eq!(record.status(), TraceStatus::CompletedNormally);
        assert_abs_diff_eq!(record.terminus().height(), 100.0, epsilon = 1e-2);
        assert!(record.refinement_iterations().unwrap() <= 20);
    }

    #[test]
    fn dipole_trace_stops_at_the_magnetic_equator_apex() {
        let field = DipoleField::axial(31000.0);
        let tracer = FieldLineTracer::new(
            &field,
            tracer_config(
                SteppingSense::Opposite,
                StoppingCriterion::MagneticEquator,
                10_000,
            ),
        );
        let start = GeographicPosition::new(30.0, 45.0, 500.0);
        let record = tracer.trace(&start).unwrap();

        assert_eq!(record.status(), TraceStatus::CompletedNormally);
        // The apex radius of a dipole field line through radius r0 at
        // magnetic latitude lambda is r0 / cos^2(lambda)
        let start_radius = 1.0 + 500.0 / R_EARTH_KM;
        let apex_radius = start_radius / (30.0_f64).to_radians().cos().powi(2);
        assert_relative_eq!(record.terminus().radius(), apex_radius, max_relative = 1e-6);
    }

    #[test]
    fn separation_vectors_stay_transverse_in_a_radial_field() {
        let field = RadialField::new(1000.0);
        let tracer = FieldLineTracer::new(
            &field,
            tracer_config(SteppingSense::Same, StoppingCriterion::None, 200),
        );
        let record = tracer
            .trace_with_separation(&GeographicPosition::new(20.0, 100.0, 0.0))
            .unwrap();

        let start_radius = record.origin().radius();
        for sample in record.samples() {
            let direction = sample.field().normalized();
            let (w1, w2) = sample.separation_vectors().unwrap();
            assert!(w1.dot(&direction).abs() <= ORTHOGONALITY_TOLERANCE);
            assert!(w2.dot(&direction).abs() <= ORTHOGONALITY_TOLERANCE);
            // Transverse separations grow linearly with radius in a radial field
            let expected_length = sample.radius() / start_radius;
            assert_relative_eq!(w1.length(), expected_length, max_relative = 1e-8);
            assert_relative_eq!(w2.length(), expected_length, max_relative = 1e-8);
        }
    }

    #[test]
    fn max_steps_with_a_stopping_criterion_is_reported_as_a_status() {
        // Too few steps to descend 400 km
        let field = RadialField::new(1000.0);
        let tracer = FieldLineTracer::new(
            &field,
            tracer_config(
                SteppingSense::Opposite,
                StoppingCriterion::HeightThreshold { height: 100.0 },
                3,
            ),
        );
        let record = tracer
            .trace(&GeographicPosition::new(0.0, 0.0, 500.0))
            .unwrap();
        assert_eq!(record.status(), TraceStatus::MaxStepsReached);
        assert_eq!(record.refinement_iterations(), None);
    }

    #[test]
    fn tracing_a_seed_set_preserves_order_and_count() {
        let field = DipoleField::axial(31000.0);
        let tracer = FieldLineTracer::new(
            &field,
            tracer_config(SteppingSense::Same, StoppingCriterion::None, 20),
        );
        let seed_positions: Vec<_> = (0..8)
            .map(|idx| GeographicPosition::new(40.0 + idx as f64, 15.0, 300.0))
            .collect();
        let records = tracer.trace_set(&seed_positions, Verbose::No);

        assert_eq!(records.len(), seed_positions.len());
        for (record, seed_position) in records.iter().zip(&seed_positions) {
            let record = record.as_ref().unwrap();
            assert_abs_diff_eq!(
                record.origin().position(),
                seed_position.to_geocentric(),
                epsilon = 1e-12
            );
        }
    }
}
