//! Joint descriptions and the bounded joint-value vector.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::JointError;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum JointKind {
    /// Angle in radians.
    Rotative,
    /// Displacement in metres.
    Prismatic,
}

/// Inclusive `[lo, hi]` range for a joint value.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct JointLimit {
    pub lo: f64,
    pub hi: f64,
}

impl JointLimit {
    pub const fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    /// Build a rotative limit from degrees.
    pub fn degrees(lo: f64, hi: f64) -> Self {
        Self::new(lo.to_radians(), hi.to_radians())
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lo && value <= self.hi
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct JointSpec {
    pub kind: JointKind,
    pub limit: JointLimit,
}

impl JointSpec {
    pub fn rotative_degrees(lo: f64, hi: f64) -> Self {
        Self {
            kind: JointKind::Rotative,
            limit: JointLimit::degrees(lo, hi),
        }
    }
}

/// Fixed-size joint values, each checked against its limit on write.
///
/// Slots start unset. A rejected write leaves the vector untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct JointVector {
    specs: Vec<JointSpec>,
    values: Vec<Option<f64>>,
}

impl JointVector {
    /// An all-unset vector shaped by `specs`.
    pub fn new(specs: &[JointSpec]) -> Self {
        Self {
            specs: specs.to_vec(),
            values: vec![None; specs.len()],
        }
    }

    /// First value outside its joint's limits, without building a vector.
    pub fn check_limits(specs: &[JointSpec], values: &[f64]) -> Result<(), JointError> {
        for (index, value) in values.iter().enumerate() {
            let spec = specs.get(index).ok_or(JointError::NoSuchJoint {
                index,
                dof: specs.len(),
            })?;
            if !spec.limit.contains(*value) {
                return Err(JointError::OutOfLimits {
                    index,
                    value: *value,
                    lo: spec.limit.lo,
                    hi: spec.limit.hi,
                });
            }
        }
        Ok(())
    }

    /// Fill every slot in order, failing on the first out-of-limit value.
    pub fn from_values(specs: &[JointSpec], values: &[f64]) -> Result<Self, JointError> {
        let mut joints = Self::new(specs);
        for (index, value) in values.iter().enumerate() {
            joints.set(index, *value)?;
        }
        Ok(joints)
    }

    pub fn set(&mut self, index: usize, value: f64) -> Result<(), JointError> {
        let dof = self.dof();
        let spec = self
            .specs
            .get(index)
            .ok_or(JointError::NoSuchJoint { index, dof })?;

        if !spec.limit.contains(value) {
            return Err(JointError::OutOfLimits {
                index,
                value,
                lo: spec.limit.lo,
                hi: spec.limit.hi,
            });
        }

        self.values[index] = Some(value);
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    pub fn dof(&self) -> usize {
        self.specs.len()
    }

    pub fn specs(&self) -> &[JointSpec] {
        &self.specs
    }

    pub fn is_complete(&self) -> bool {
        self.values.iter().all(Option::is_some)
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        self.values.iter().copied()
    }

    /// All values, with unset slots read as `0.0`.
    pub fn to_vec(&self) -> Vec<f64> {
        self.values.iter().map(|v| v.unwrap_or(0.0)).collect()
    }
}

impl fmt::Display for JointVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (index, (value, spec)) in self.values.iter().zip(&self.specs).enumerate() {
            if index > 0 {
                write!(f, " ; ")?;
            }
            match (value, spec.kind) {
                (None, _) => write!(f, "-")?,
                (Some(v), JointKind::Rotative) => write!(f, "{:.2}°", v.to_degrees())?,
                (Some(v), JointKind::Prismatic) => write!(f, "{:.2}m", v)?,
            }
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specs() -> Vec<JointSpec> {
        vec![
            JointSpec::rotative_degrees(-150.0, 150.0),
            JointSpec {
                kind: JointKind::Prismatic,
                limit: JointLimit::new(0.0, 0.5),
            },
        ]
    }

    #[test]
    fn test_new_vector_is_unset() {
        let joints = JointVector::new(&specs());
        assert_eq!(joints.dof(), 2);
        assert!(!joints.is_complete());
        assert_eq!(joints.get(0), None);
        assert_eq!(joints.to_vec(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_set_within_limits() {
        let mut joints = JointVector::new(&specs());
        joints.set(0, 1.0).unwrap();
        joints.set(1, 0.5).unwrap();
        assert_eq!(joints.get(0), Some(1.0));
        assert_eq!(joints.get(1), Some(0.5));
        assert!(joints.is_complete());
    }

    #[test]
    fn test_rejected_write_does_not_mutate() {
        let mut joints = JointVector::new(&specs());
        joints.set(1, 0.25).unwrap();

        let err = joints.set(1, 0.75).unwrap_err();
        assert!(matches!(err, JointError::OutOfLimits { index: 1, .. }));
        assert_eq!(joints.get(1), Some(0.25));

        let err = joints.set(0, 200.0_f64.to_radians()).unwrap_err();
        assert!(matches!(err, JointError::OutOfLimits { index: 0, .. }));
        assert_eq!(joints.get(0), None);
    }

    #[test]
    fn test_no_such_joint() {
        let mut joints = JointVector::new(&specs());
        assert_eq!(
            joints.set(5, 0.0),
            Err(JointError::NoSuchJoint { index: 5, dof: 2 })
        );
    }

    #[test]
    fn test_check_limits() {
        let specs = specs();
        assert!(JointVector::check_limits(&specs, &[1.0, 0.5]).is_ok());
        assert!(matches!(
            JointVector::check_limits(&specs, &[1.0, 0.6]),
            Err(JointError::OutOfLimits { index: 1, .. })
        ));
        assert_eq!(
            JointVector::check_limits(&specs, &[0.0, 0.0, 0.0]),
            Err(JointError::NoSuchJoint { index: 2, dof: 2 })
        );
    }

    #[test]
    fn test_display_formats_units() {
        let joints = JointVector::from_values(&specs(), &[90.0_f64.to_radians(), 0.12]).unwrap();
        assert_eq!(joints.to_string(), "(90.00° ; 0.12m)");

        let unset = JointVector::new(&specs());
        assert_eq!(unset.to_string(), "(- ; -)");
    }
}
