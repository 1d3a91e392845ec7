// Trajectory planning for the 4 DOF Barrett WAM

pub mod errors;
pub mod joints;
pub mod kinematics;
pub mod linalg;
pub mod line;
pub mod point;
pub mod robot_config;
pub mod trajectory;

pub use errors::*;
pub use joints::{JointKind, JointLimit, JointSpec, JointVector};
pub use kinematics::{BarrettWam4, Manipulator};
pub use line::LineTrajectoryPlanner;
pub use point::Point;
pub use robot_config::{ManipulatorConfig, ManipulatorModel};
pub use trajectory::{PlanOutcome, PolynomialCurve, Samples, Trajectory, TrajectoryPlanner};
