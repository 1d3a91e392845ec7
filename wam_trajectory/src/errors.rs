use thiserror::Error;

use crate::point::Point;

/// Rejected write into a [`JointVector`](crate::joints::JointVector).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum JointError {
    #[error("joint {index} value {value:.4} outside limits [{lo:.4}, {hi:.4}]")]
    OutOfLimits {
        index: usize,
        value: f64,
        lo: f64,
        hi: f64,
    },
    #[error("joint index {index} out of range for {dof} joints")]
    NoSuchJoint { index: usize, dof: usize },
}

/// Workspace-membership failures.
///
/// An unreachable point and a joint-limit violation land in the same
/// category: from the caller's side both mean "the arm cannot get there".
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkspaceError {
    #[error("point {point} is out of reach (asin argument {k:.4})")]
    OutOfReach { point: Point, k: f64 },
    #[error("point {point} is a degenerate configuration")]
    Degenerate { point: Point },
    #[error("joint limit violated: {0}")]
    JointLimit(#[from] JointError),
    #[error("waypoint {index}: {source}")]
    AtWaypoint {
        index: usize,
        #[source]
        source: Box<WorkspaceError>,
    },
}

impl WorkspaceError {
    /// Index of the failing waypoint when raised by a batch operation.
    pub fn waypoint(&self) -> Option<usize> {
        match self {
            WorkspaceError::AtWaypoint { index, .. } => Some(*index),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LinalgError {
    #[error("matrix is empty")]
    Empty,
    #[error("matrix must be square, got {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },
    #[error("right-hand side has {found} rows, expected {expected}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("singular matrix")]
    Singular,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlannerError {
    #[error("needs at least 2 points to calculate a trajectory, got {found}")]
    InsufficientWaypoints { found: usize },
    #[error("speed must be positive and finite, got {0}")]
    InvalidSpeed(f64),
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
    #[error(transparent)]
    Linalg(#[from] LinalgError),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("manipulator must have at least one joint")]
    NoJoints,
    #[error("{model} needs {expected} joints, configuration has {found}")]
    WrongDof {
        model: String,
        expected: usize,
        found: usize,
    },
    #[error("joint {index} has an empty or non-finite limit range")]
    InvalidLimit { index: usize },
    #[error("link lengths must be finite and positive")]
    InvalidLinkLength,
    #[error("speed must be positive and finite, got {0}")]
    InvalidSpeed(f64),
}
