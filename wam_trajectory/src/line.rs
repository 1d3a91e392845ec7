//! Straight-line trajectories.
//!
//! A cubic through two far-apart waypoints bows away from the chord between
//! them. Inserting evenly spaced points on the chord keeps the end-effector
//! close to the straight line; a shorter maximum chord means a straighter
//! path and larger linear systems.

use tracing::debug;

use crate::errors::PlannerError;
use crate::kinematics::Manipulator;
use crate::point::Point;
use crate::trajectory::{PlanOutcome, Samples, Trajectory, TrajectoryPlanner};

/// Default maximum distance between consecutive points, in metres.
pub const DEFAULT_MAX_CHORD: f64 = 0.05;

/// Points evenly spaced strictly between `start` and `end` so that no chord
/// is longer than `max_chord`.
///
/// A non-positive `max_chord` inserts nothing.
pub fn intermediate_points(start: &Point, end: &Point, max_chord: f64) -> Vec<Point> {
    if max_chord.is_nan() || max_chord <= 0.0 {
        return Vec::new();
    }
    let count = (start.distance(end) / max_chord).ceil() - 1.0;
    if !count.is_finite() || count < 1.0 {
        return Vec::new();
    }
    let count = count as usize;
    let step = (*end - *start) / (count + 1) as f64;

    (1..=count).map(|k| *start + step * k as f64).collect()
}

/// The path with intermediate points inserted between every pair of
/// consecutive waypoints. Original waypoints are kept and never repeated.
pub fn subdivide(points: &[Point], max_chord: f64) -> Vec<Point> {
    let Some(first) = points.first() else {
        return Vec::new();
    };

    let mut path = vec![*first];
    for pair in points.windows(2) {
        path.extend(intermediate_points(&pair[0], &pair[1], max_chord));
        path.push(pair[1]);
    }
    path
}

/// Plans trajectories that follow straight lines between waypoints.
pub struct LineTrajectoryPlanner<'a, M: Manipulator> {
    planner: TrajectoryPlanner<'a, M>,
    max_chord: f64,
}

impl<'a, M: Manipulator> LineTrajectoryPlanner<'a, M> {
    pub fn new(manipulator: &'a M) -> Self {
        Self::from_planner(TrajectoryPlanner::new(manipulator))
    }

    pub fn from_planner(planner: TrajectoryPlanner<'a, M>) -> Self {
        Self {
            planner,
            max_chord: DEFAULT_MAX_CHORD,
        }
    }

    pub fn with_max_chord(mut self, max_chord: f64) -> Self {
        self.max_chord = max_chord;
        self
    }

    pub fn max_chord(&self) -> f64 {
        self.max_chord
    }

    pub fn planner(&self) -> &TrajectoryPlanner<'a, M> {
        &self.planner
    }

    /// Like [`TrajectoryPlanner::trajectory_through_points`], on the
    /// subdivided path.
    pub fn trajectory_through_points(&self, points: &[Point]) -> Result<PlanOutcome, PlannerError> {
        if points.len() < 2 {
            return Err(PlannerError::InsufficientWaypoints {
                found: points.len(),
            });
        }
        let path = subdivide(points, self.max_chord);
        debug!(
            "line path: {} waypoints -> {} points",
            points.len(),
            path.len()
        );
        self.planner.trajectory_through_points(&path)
    }

    pub fn curves_values(&self, trajectory: &Trajectory) -> Samples {
        self.planner.curves_values(trajectory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_units_with_unit_chord() {
        let start = Point::new(0.0, 0.0, 0.0);
        let end = Point::new(3.0, 0.0, 0.0);

        let inserted = intermediate_points(&start, &end, 1.0);
        assert_eq!(
            inserted,
            vec![Point::new(1.0, 0.0, 0.0), Point::new(2.0, 0.0, 0.0)]
        );

        let path = subdivide(&[start, end], 1.0);
        assert_eq!(path.len(), 4);
        for pair in path.windows(2) {
            assert!((pair[0].distance(&pair[1]) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_short_chord_is_untouched() {
        let start = Point::new(0.0, 0.0, 0.0);
        let end = Point::new(0.5, 0.0, 0.0);
        assert!(intermediate_points(&start, &end, 1.0).is_empty());
        assert!(intermediate_points(&start, &start, 1.0).is_empty());
        assert_eq!(subdivide(&[start, end], 1.0), vec![start, end]);
    }

    #[test]
    fn test_subdivide_keeps_shared_waypoints_once() {
        let a = Point::new(0.0, 0.0, 0.0);
        let b = Point::new(0.0, 2.0, 0.0);
        let c = Point::new(0.0, 2.0, 4.0);

        let path = subdivide(&[a, b, c], 1.0);
        // a, +1, b, +3, c
        assert_eq!(path.len(), 7);
        assert_eq!(path[0], a);
        assert_eq!(path[2], b);
        assert_eq!(path[6], c);
        assert_eq!(path.iter().filter(|p| **p == b).count(), 1);
    }

    #[test]
    fn test_subdivide_degenerate_inputs() {
        assert!(subdivide(&[], 1.0).is_empty());
        let p = Point::new(1.0, 1.0, 1.0);
        assert_eq!(subdivide(&[p], 1.0), vec![p]);
    }

    #[test]
    fn test_unusable_chord_inserts_nothing() {
        let start = Point::new(0.0, 0.0, 0.0);
        let end = Point::new(3.0, 0.0, 0.0);
        for max_chord in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(intermediate_points(&start, &end, max_chord).is_empty());
        }
        // A non-finite endpoint gives a non-finite count
        let far = Point::new(f64::INFINITY, 0.0, 0.0);
        assert!(intermediate_points(&start, &far, 1.0).is_empty());
    }
}
