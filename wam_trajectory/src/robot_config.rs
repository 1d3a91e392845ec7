//! Manipulator configuration
//!
//! Geometry, joint table and nominal end-effector speed for the supported
//! manipulators. The link lengths feed the closed-form kinematics in
//! [`crate::kinematics`]; the speed feeds the segment duration estimate in
//! [`crate::trajectory`].

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::joints::JointSpec;

/// Supported manipulator models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManipulatorModel {
    /// Barrett WAM restricted to its first 4 revolute joints (RRRR)
    BarrettWam4,
}

/// Manipulator configuration with geometry and joint table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManipulatorConfig {
    pub model: ManipulatorModel,

    /// Display name
    pub name: String,

    /// One entry per joint; the degrees of freedom are `joints.len()`
    pub joints: Vec<JointSpec>,

    // Link lengths in metres
    pub la: f64, // shoulder to elbow
    pub lc: f64, // elbow to wrist

    /// Average end-effector speed in m/s
    pub speed: f64,
}

impl ManipulatorConfig {
    /// Default end-effector speed for the WAM, m/s
    pub const DEFAULT_SPEED: f64 = 0.05;

    /// Create configuration for the 4 DOF Barrett WAM
    ///
    /// Joint limits (degrees):
    /// - J1: -150 .. 150
    /// - J2: -113 .. 113
    /// - J3: -157 .. 157
    /// - J4: -140 .. 90
    ///
    /// Links: la = 0.55 m, lc = 0.35 m (the elbow offset is zero)
    pub fn barrett_wam_4() -> Self {
        Self {
            model: ManipulatorModel::BarrettWam4,
            name: "Barrett-WAM (4 DOF)".to_string(),
            joints: vec![
                JointSpec::rotative_degrees(-150.0, 150.0),
                JointSpec::rotative_degrees(-113.0, 113.0),
                JointSpec::rotative_degrees(-157.0, 157.0),
                JointSpec::rotative_degrees(-140.0, 90.0),
            ],
            la: 0.55,
            lc: 0.35,
            speed: Self::DEFAULT_SPEED,
        }
    }

    /// Create configuration for a specific manipulator model
    pub fn from_model(model: ManipulatorModel) -> Self {
        match model {
            ManipulatorModel::BarrettWam4 => Self::barrett_wam_4(),
        }
    }

    pub fn dof(&self) -> usize {
        self.joints.len()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.joints.is_empty() {
            return Err(ConfigError::NoJoints);
        }
        for (index, joint) in self.joints.iter().enumerate() {
            let limit = joint.limit;
            if !limit.lo.is_finite() || !limit.hi.is_finite() || limit.lo > limit.hi {
                return Err(ConfigError::InvalidLimit { index });
            }
        }
        let links_ok = [self.la, self.lc].iter().all(|l| l.is_finite() && *l > 0.0);
        if !links_ok {
            return Err(ConfigError::InvalidLinkLength);
        }
        if !self.speed.is_finite() || self.speed <= 0.0 {
            return Err(ConfigError::InvalidSpeed(self.speed));
        }
        Ok(())
    }
}

impl Default for ManipulatorConfig {
    fn default() -> Self {
        Self::barrett_wam_4()
    }
}
