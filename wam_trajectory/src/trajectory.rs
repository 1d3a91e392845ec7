//! Piecewise-cubic joint trajectories through Cartesian waypoints.
//!
//! Every waypoint is mapped to joint space with inverse kinematics, then each
//! joint gets one cubic per segment. The cubics are solved together so that
//! position, velocity and acceleration are continuous at every inner
//! waypoint, and the arm starts and ends at rest.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::errors::{JointError, LinalgError, PlannerError, WorkspaceError};
use crate::joints::JointVector;
use crate::kinematics::Manipulator;
use crate::line;
use crate::linalg;
use crate::point::Point;

/// Floor for every segment duration, in seconds.
pub const MIN_SEGMENT_DURATION: f64 = 0.1;

/// Samples taken per segment by [`curves_values`].
pub const DEFAULT_SAMPLES_PER_SEGMENT: usize = 100;

/// Chord length used by [`TrajectoryPlanner::line_between_points`], in metres.
pub const LINE_MAX_CHORD: f64 = 0.1;

/// `f(t) = c0 + c1 t + c2 t² + c3 t³`, with `t` local to its segment.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct PolynomialCurve {
    pub coeffs: [f64; 4],
}

impl PolynomialCurve {
    pub const fn new(c0: f64, c1: f64, c2: f64, c3: f64) -> Self {
        Self {
            coeffs: [c0, c1, c2, c3],
        }
    }

    pub fn value(&self, t: f64) -> f64 {
        let [c0, c1, c2, c3] = self.coeffs;
        c0 + t * (c1 + t * (c2 + t * c3))
    }

    pub fn velocity(&self, t: f64) -> f64 {
        let [_, c1, c2, c3] = self.coeffs;
        c1 + t * (2.0 * c2 + t * 3.0 * c3)
    }

    pub fn acceleration(&self, t: f64) -> f64 {
        let [_, _, c2, c3] = self.coeffs;
        2.0 * c2 + 6.0 * c3 * t
    }
}

/// Cubic segments for every joint, sharing one duration per segment.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Trajectory {
    curves: Vec<Vec<PolynomialCurve>>,
    durations: Vec<f64>,
}

impl Trajectory {
    fn new(curves: Vec<Vec<PolynomialCurve>>, durations: Vec<f64>) -> Self {
        debug_assert!(curves.iter().all(|c| c.len() == durations.len()));
        Self { curves, durations }
    }

    /// Per joint, per segment.
    pub fn curves(&self) -> &[Vec<PolynomialCurve>] {
        &self.curves
    }

    pub fn durations(&self) -> &[f64] {
        &self.durations
    }

    pub fn dof(&self) -> usize {
        self.curves.len()
    }

    pub fn segment_count(&self) -> usize {
        self.durations.len()
    }

    pub fn total_duration(&self) -> f64 {
        self.durations.iter().sum()
    }

    /// Absolute start time of each segment.
    pub fn segment_starts(&self) -> Vec<f64> {
        segment_starts(&self.durations)
    }

    /// Joint values at absolute time `t`, clamped to the trajectory span.
    pub fn positions_at(&self, t: f64) -> Vec<f64> {
        if self.durations.is_empty() {
            return Vec::new();
        }
        let starts = self.segment_starts();
        let t = t.clamp(0.0, self.total_duration());
        let segment = starts
            .iter()
            .rposition(|&start| start <= t)
            .unwrap_or(0)
            .min(self.segment_count().saturating_sub(1));
        let local = t - starts[segment];

        self.curves
            .iter()
            .map(|joint| joint[segment].value(local))
            .collect()
    }

    pub fn into_parts(self) -> (Vec<Vec<PolynomialCurve>>, Vec<f64>) {
        (self.curves, self.durations)
    }
}

/// Result of a planning call that got past input validation.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanOutcome {
    Planned(Trajectory),
    /// Some waypoint is outside the workspace; nothing was solved.
    OutsideWorkspace,
}

impl PlanOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, PlanOutcome::Planned(_))
    }

    pub fn trajectory(&self) -> Option<&Trajectory> {
        match self {
            PlanOutcome::Planned(trajectory) => Some(trajectory),
            PlanOutcome::OutsideWorkspace => None,
        }
    }

    pub fn into_trajectory(self) -> Option<Trajectory> {
        match self {
            PlanOutcome::Planned(trajectory) => Some(trajectory),
            PlanOutcome::OutsideWorkspace => None,
        }
    }

    /// `(success, coefficients, durations)`; both collections are empty on
    /// failure.
    pub fn into_parts(self) -> (bool, Vec<Vec<PolynomialCurve>>, Vec<f64>) {
        match self {
            PlanOutcome::Planned(trajectory) => {
                let (curves, durations) = trajectory.into_parts();
                (true, curves, durations)
            }
            PlanOutcome::OutsideWorkspace => (false, Vec::new(), Vec::new()),
        }
    }
}

/// Sampled joint curves.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Samples {
    /// Per joint, one value per entry of `times`.
    pub values: Vec<Vec<f64>>,
    /// Absolute time of each sample, non-decreasing.
    pub times: Vec<f64>,
}

impl Samples {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Joint values of sample `index`, in joint order.
    pub fn joint_values(&self, index: usize) -> Vec<f64> {
        self.values.iter().map(|joint| joint[index]).collect()
    }
}

fn segment_starts(durations: &[f64]) -> Vec<f64> {
    durations
        .iter()
        .scan(0.0, |elapsed, duration| {
            let start = *elapsed;
            *elapsed += duration;
            Some(start)
        })
        .collect()
}

/// Duration of each segment: travel time at `speed`, floored at
/// [`MIN_SEGMENT_DURATION`].
pub fn estimate_durations(points: &[Point], speed: f64) -> Vec<f64> {
    points
        .windows(2)
        .map(|pair| (pair[0].distance(&pair[1]) / speed).max(MIN_SEGMENT_DURATION))
        .collect()
}

/// Linear system whose solution holds the cubic coefficients of every
/// segment, four per segment.
///
/// Row 0 sets the start velocity to zero. For segment `i` (columns
/// `4i..4i+4`), rows `4i+1` and `4i+2` fix the end positions, row `4i+3`
/// matches the exit velocity with the next segment's start velocity (zero
/// after the last segment) and row `4i+4` matches accelerations.
///
/// `values` must hold one entry more than `durations`.
pub fn spline_system(
    values: &[f64],
    durations: &[f64],
) -> Result<(DMatrix<f64>, DVector<f64>), LinalgError> {
    if values.len() != durations.len() + 1 {
        return Err(LinalgError::DimensionMismatch {
            expected: durations.len() + 1,
            found: values.len(),
        });
    }

    let segments = durations.len();
    let size = 4 * segments;
    let mut a = DMatrix::zeros(size, size);
    let mut b = DVector::zeros(size);

    if segments > 0 {
        a[(0, 1)] = 1.0;
    }

    for (i, &t) in durations.iter().enumerate() {
        let c = 4 * i;

        a[(c + 1, c)] = 1.0;
        b[c + 1] = values[i];

        a[(c + 2, c)] = 1.0;
        a[(c + 2, c + 1)] = t;
        a[(c + 2, c + 2)] = t * t;
        a[(c + 2, c + 3)] = t * t * t;
        b[c + 2] = values[i + 1];

        a[(c + 3, c + 1)] = 1.0;
        a[(c + 3, c + 2)] = 2.0 * t;
        a[(c + 3, c + 3)] = 3.0 * t * t;

        if i + 1 < segments {
            a[(c + 3, c + 5)] = -1.0;

            a[(c + 4, c + 2)] = 2.0;
            a[(c + 4, c + 3)] = 6.0 * t;
            a[(c + 4, c + 6)] = -2.0;
        }
    }

    Ok((a, b))
}

/// Solve one joint's cubics through `values`, one per duration.
pub fn fit_cubic_segments(
    values: &[f64],
    durations: &[f64],
) -> Result<Vec<PolynomialCurve>, LinalgError> {
    let (a, b) = spline_system(values, durations)?;
    if durations.is_empty() {
        return Ok(Vec::new());
    }

    let mut x = linalg::solve(&a, &b)?;
    // Row 0 pins the start velocity, keep it free of rounding
    x[1] = 0.0;

    Ok(x.as_slice()
        .chunks_exact(4)
        .map(|c| PolynomialCurve::new(c[0], c[1], c[2], c[3]))
        .collect())
}

/// Sample every joint curve over the whole trajectory.
///
/// Each segment but the last contributes `samples_per_segment` points,
/// excluding its end instant; the last one also includes its end, so shared
/// boundaries appear once. Every joint needs one curve per duration.
pub fn curves_values(
    curves: &[Vec<PolynomialCurve>],
    durations: &[f64],
    samples_per_segment: usize,
) -> Result<Samples, LinalgError> {
    if let Some(joint) = curves.iter().find(|joint| joint.len() != durations.len()) {
        return Err(LinalgError::DimensionMismatch {
            expected: durations.len(),
            found: joint.len(),
        });
    }
    Ok(sample_curves(curves, durations, samples_per_segment))
}

fn sample_curves(
    curves: &[Vec<PolynomialCurve>],
    durations: &[f64],
    samples_per_segment: usize,
) -> Samples {
    let per_segment = samples_per_segment.max(1);
    let starts = segment_starts(durations);
    let last = durations.len().saturating_sub(1);

    let mut local_times = Vec::with_capacity(durations.len());
    let mut times = Vec::with_capacity(durations.len() * per_segment + 1);
    for (segment, (&start, &duration)) in starts.iter().zip(durations).enumerate() {
        let count = if segment == last { per_segment + 1 } else { per_segment };
        let step = duration / per_segment as f64;
        let locals: Vec<f64> = (0..count).map(|k| k as f64 * step).collect();
        times.extend(locals.iter().map(|t| start + t));
        local_times.push(locals);
    }

    let values: Vec<Vec<f64>> = curves
        .iter()
        .map(|joint| {
            joint
                .iter()
                .zip(&local_times)
                .flat_map(|(curve, locals)| locals.iter().map(move |&t| curve.value(t)))
                .collect()
        })
        .collect();

    Samples { values, times }
}

/// Plans joint trajectories through Cartesian waypoints for one manipulator.
///
/// The manipulator speed is captured when the planner is built; the borrow
/// keeps it from changing while the planner is alive.
pub struct TrajectoryPlanner<'a, M: Manipulator> {
    manipulator: &'a M,
    speed: f64,
    samples_per_segment: usize,
}

impl<'a, M: Manipulator> TrajectoryPlanner<'a, M> {
    pub fn new(manipulator: &'a M) -> Self {
        Self {
            manipulator,
            speed: manipulator.speed(),
            samples_per_segment: DEFAULT_SAMPLES_PER_SEGMENT,
        }
    }

    /// Override the end-effector speed used for duration estimates.
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_samples_per_segment(mut self, samples: usize) -> Self {
        self.samples_per_segment = samples.max(1);
        self
    }

    pub fn manipulator(&self) -> &M {
        self.manipulator
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn samples_per_segment(&self) -> usize {
        self.samples_per_segment
    }

    /// Plan a trajectory through `points`, in order.
    ///
    /// Fewer than two points is an error. A path leaving the workspace is
    /// not: it yields [`PlanOutcome::OutsideWorkspace`].
    pub fn trajectory_through_points(&self, points: &[Point]) -> Result<PlanOutcome, PlannerError> {
        if points.len() < 2 {
            return Err(PlannerError::InsufficientWaypoints {
                found: points.len(),
            });
        }
        if !self.speed.is_finite() || self.speed <= 0.0 {
            return Err(PlannerError::InvalidSpeed(self.speed));
        }

        if !self.manipulator.all_in_workspace(points) {
            warn!(
                "Trajectory goes outside the workspace of {}",
                self.manipulator.name()
            );
            return Ok(PlanOutcome::OutsideWorkspace);
        }
        trace!("{} waypoints inside the workspace", points.len());

        let joint_values = self.joint_values_on_path(points)?;
        let durations = estimate_durations(points, self.speed);
        debug!(
            "{} segments, {:.3} s total",
            durations.len(),
            durations.iter().sum::<f64>()
        );

        let curves = joint_values
            .iter()
            .map(|values| fit_cubic_segments(values, &durations))
            .collect::<Result<Vec<_>, _>>()?;
        trace!("solved {} joint systems", curves.len());

        Ok(PlanOutcome::Planned(Trajectory::new(curves, durations)))
    }

    /// Straight-line trajectory from `start` to `end`, chopped into chords of
    /// at most [`LINE_MAX_CHORD`].
    pub fn line_between_points(
        &self,
        start: Point,
        end: Point,
    ) -> Result<PlanOutcome, PlannerError> {
        self.trajectory_through_points(&line::subdivide(&[start, end], LINE_MAX_CHORD))
    }

    pub fn curves_values(&self, trajectory: &Trajectory) -> Samples {
        sample_curves(
            trajectory.curves(),
            trajectory.durations(),
            self.samples_per_segment,
        )
    }

    /// End-effector position for every sample.
    ///
    /// The cubics can overshoot the joint limits between waypoints. Such
    /// samples still get a position; see [`Self::first_limit_violation`].
    pub fn end_effector_path(&self, samples: &Samples) -> Vec<Point> {
        if let Some((index, e)) = self.first_limit_violation(samples) {
            warn!(
                "Sample {} at t = {:.3} s: {}",
                index,
                samples.times[index],
                e
            );
        }
        (0..samples.len())
            .map(|index| self.manipulator.fkine_values(&samples.joint_values(index)))
            .collect()
    }

    /// Index of the first sample outside the joint limits, with the
    /// offending joint.
    pub fn first_limit_violation(&self, samples: &Samples) -> Option<(usize, JointError)> {
        let specs = self.manipulator.joint_specs();
        (0..samples.len()).find_map(|index| {
            JointVector::check_limits(specs, &samples.joint_values(index))
                .err()
                .map(|e| (index, e))
        })
    }

    /// One value sequence per joint, one entry per waypoint.
    fn joint_values_on_path(&self, points: &[Point]) -> Result<Vec<Vec<f64>>, WorkspaceError> {
        let path = self.manipulator.ikine_all(points)?;
        Ok((0..self.manipulator.dof())
            .map(|joint| path.iter().map(|q| q.get(joint).unwrap_or(0.0)).collect())
            .collect())
    }
}
