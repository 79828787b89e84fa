//! Pose value type and its canonical JSON encoding
//!
//! A pose is a complete or partial mapping of joint name to display angle
//! (degrees). The wire and persistence encoding is a flat JSON object:
//! `{"A1": 45.0, "A3": 10.0}`. Joints missing from a pose are left
//! unchanged when it is restored.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::joint::JointName;

/// Mapping of joint name to display angle in degrees
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pose {
    joints: BTreeMap<JointName, f64>,
}

impl Pose {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one joint's display angle
    pub fn set(&mut self, name: impl Into<JointName>, display_deg: f64) {
        self.joints.insert(name.into(), display_deg);
    }

    /// Get one joint's display angle, if present
    pub fn get(&self, name: &JointName) -> Option<f64> {
        self.joints.get(name).copied()
    }

    pub fn contains(&self, name: &JointName) -> bool {
        self.joints.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    /// Iterate joint/angle pairs in name order
    pub fn iter(&self) -> impl Iterator<Item = (&JointName, f64)> {
        self.joints.iter().map(|(name, deg)| (name, *deg))
    }

    /// Encode to the canonical flat JSON object
    pub fn to_json(&self) -> String {
        // A flat string→number map cannot fail to serialize
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Decode from the canonical flat JSON object
    pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }
}

impl FromIterator<(JointName, f64)> for Pose {
    fn from_iter<T: IntoIterator<Item = (JointName, f64)>>(iter: T) -> Self {
        Self {
            joints: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_round_trip() {
        let mut pose = Pose::new();
        pose.set("A1", 45.0);
        pose.set("A3", -10.5);
        let decoded = Pose::from_json(&pose.to_json()).unwrap();
        assert_eq!(decoded, pose);
    }

    #[test]
    fn test_from_json_rejects_non_map() {
        assert!(Pose::from_json("not json").is_err());
        assert!(Pose::from_json("[1, 2]").is_err());
        assert!(Pose::from_json("{\"A1\": \"fast\"}").is_err());
    }

    #[test]
    fn test_partial_pose() {
        let pose = Pose::from_json("{\"A2\": 30.0}").unwrap();
        assert_eq!(pose.len(), 1);
        assert_eq!(pose.get(&JointName::new("A2")), Some(30.0));
        assert!(!pose.contains(&JointName::new("A1")));
    }
}
