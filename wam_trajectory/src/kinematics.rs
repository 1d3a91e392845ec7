// Kinematics for the Barrett WAM reduced to 4 revolute joints
//
// Position-only model: the end-effector is the wrist centre. The third joint
// is redundant for pure positioning, so the closed-form inverse pins q3 = 0.

use tracing::debug;

use crate::errors::{ConfigError, WorkspaceError};
use crate::joints::{JointSpec, JointVector};
use crate::point::Point;
use crate::robot_config::ManipulatorConfig;

/// Capability set shared by every manipulator geometry
///
/// Each geometry supplies its own closed-form `fkine`/`ikine`; the batch
/// forms and the workspace test are derived from those.
pub trait Manipulator {
    fn name(&self) -> &str;

    fn joint_specs(&self) -> &[JointSpec];

    /// Average end-effector speed in m/s
    fn speed(&self) -> f64;

    /// Forward kinematics on raw joint values, limits not checked.
    ///
    /// Missing trailing values are read as 0.
    fn fkine_values(&self, values: &[f64]) -> Point;

    /// Forward kinematics: end-effector position for the given joint values
    fn fkine(&self, joints: &JointVector) -> Point {
        self.fkine_values(&joints.to_vec())
    }

    /// Inverse kinematics: joint values placing the end-effector at `point`
    fn ikine(&self, point: &Point) -> Result<JointVector, WorkspaceError>;

    fn dof(&self) -> usize {
        self.joint_specs().len()
    }

    fn is_in_workspace(&self, point: &Point) -> bool {
        match self.ikine(point) {
            Ok(_) => true,
            Err(e) => {
                debug!("{} outside workspace: {}", point, e);
                false
            }
        }
    }

    /// True only if every point is reachable.
    fn all_in_workspace(&self, points: &[Point]) -> bool {
        points.iter().all(|p| self.is_in_workspace(p))
    }

    fn fkine_all(&self, joints: &[JointVector]) -> Vec<Point> {
        joints.iter().map(|j| self.fkine(j)).collect()
    }

    /// Inverse kinematics over a path, in order.
    ///
    /// The first unreachable point aborts the whole batch; the error carries
    /// its index.
    fn ikine_all(&self, points: &[Point]) -> Result<Vec<JointVector>, WorkspaceError> {
        points
            .iter()
            .enumerate()
            .map(|(index, point)| {
                self.ikine(point).map_err(|e| WorkspaceError::AtWaypoint {
                    index,
                    source: Box::new(e),
                })
            })
            .collect()
    }
}

/// Barrett WAM, first 4 joints (RRRR)
#[derive(Debug, Clone)]
pub struct BarrettWam4 {
    config: ManipulatorConfig,
}

impl BarrettWam4 {
    const DOF: usize = 4;

    /// Create kinematics from a manipulator configuration
    pub fn from_config(config: ManipulatorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        if config.dof() != Self::DOF {
            return Err(ConfigError::WrongDof {
                model: config.name.clone(),
                expected: Self::DOF,
                found: config.dof(),
            });
        }
        Ok(Self { config })
    }

    /// Get the manipulator configuration
    pub fn config(&self) -> &ManipulatorConfig {
        &self.config
    }

    /// Change the average end-effector speed used for new trajectories.
    pub fn set_speed(&mut self, speed: f64) -> Result<(), ConfigError> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(ConfigError::InvalidSpeed(speed));
        }
        self.config.speed = speed;
        Ok(())
    }
}

impl Default for BarrettWam4 {
    fn default() -> Self {
        Self {
            config: ManipulatorConfig::barrett_wam_4(),
        }
    }
}

impl Manipulator for BarrettWam4 {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn joint_specs(&self) -> &[JointSpec] {
        &self.config.joints
    }

    fn speed(&self) -> f64 {
        self.config.speed
    }

    fn fkine_values(&self, values: &[f64]) -> Point {
        let la = self.config.la;
        let lc = self.config.lc;
        let q = |index: usize| values.get(index).copied().unwrap_or(0.0);
        let (s1, c1) = q(0).sin_cos();
        let (s2, c2) = q(1).sin_cos();
        let (s3, c3) = q(2).sin_cos();
        let (s4, c4) = q(3).sin_cos();

        let x = la * c1 * s2 - lc * c4 * (s1 * s3 - c1 * c2 * c3) - lc * c1 * s2 * s4;
        let y = lc * c4 * (c1 * s3 + c2 * c3 * s1) + la * s1 * s2 - lc * s1 * s2 * s4;
        let z = la * c2 - lc * c2 * s4 - lc * c3 * c4 * s2;

        Point::new(x, y, z)
    }

    fn ikine(&self, point: &Point) -> Result<JointVector, WorkspaceError> {
        if !point.is_finite() {
            return Err(WorkspaceError::Degenerate { point: *point });
        }

        let la = self.config.la;
        let lc = self.config.lc;
        let Point { x, y, z } = *point;

        let q1 = y.atan2(x);
        let q3 = 0.0;

        // Radial distance in the arm plane
        let (s1, c1) = q1.sin_cos();
        let r = x * c1 + y * s1;

        let k = (r * r + z * z - lc * lc - la * la) / (-2.0 * la * lc);
        if k.abs() > 1.0 {
            return Err(WorkspaceError::OutOfReach { point: *point, k });
        }
        let q4 = k.asin();

        // r = a·sin(q2) + b·cos(q2), z = a·cos(q2) - b·sin(q2)
        let a = la - lc * q4.sin();
        let b = lc * q4.cos();
        if b == 0.0 {
            return Err(WorkspaceError::Degenerate { point: *point });
        }
        let divisor = a * a / b + b;
        if divisor == 0.0 {
            return Err(WorkspaceError::Degenerate { point: *point });
        }

        let sin_q2 = (a * r / b - z) / divisor;
        let cos_q2 = (r - a * sin_q2) / b;
        let q2 = sin_q2.atan2(cos_q2);

        let joints = JointVector::from_values(self.joint_specs(), &[q1, q2, q3, q4])?;
        Ok(joints)
    }
}
