//! Joint identifiers and per-axis profiles

use serde::{Deserialize, Serialize};

/// Unique identifier for a joint, e.g. "A1".."A6"
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JointName(pub String);

impl JointName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JointName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for JointName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Immutable per-axis description: identity, home offset, display-angle
/// bounds, and the fixed mechanical hinge direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JointProfile {
    /// Joint identifier, also the scene node name registered at load time
    pub name: JointName,
    /// Mechanical-zero correction in degrees
    pub home_offset_deg: f64,
    /// Lower display-angle bound (inclusive, degrees)
    pub min_display_deg: f64,
    /// Upper display-angle bound (inclusive, degrees)
    pub max_display_deg: f64,
    /// Unit vector of the hinge axis; never changes at runtime
    pub rotation_axis: [f64; 3],
}

impl JointProfile {
    /// Clamp a display angle into this joint's bounds
    pub fn clamp(&self, display_deg: f64) -> f64 {
        display_deg.clamp(self.min_display_deg, self.max_display_deg)
    }

    /// Whether a display angle lies within bounds
    pub fn contains(&self, display_deg: f64) -> bool {
        display_deg >= self.min_display_deg && display_deg <= self.max_display_deg
    }
}

/// The built-in six-axis table. Offsets and limits can be overridden from
/// configuration; axis vectors are fixed by the model geometry.
pub fn default_profiles() -> Vec<JointProfile> {
    let entry = |name: &str, offset: f64, min: f64, max: f64, axis: [f64; 3]| JointProfile {
        name: JointName::new(name),
        home_offset_deg: offset,
        min_display_deg: min,
        max_display_deg: max,
        rotation_axis: axis,
    };

    vec![
        entry("A1", 0.0, -185.0, 185.0, [0.0, 0.0, 1.0]),
        entry("A2", -90.0, -140.0, 60.0, [0.0, 1.0, 0.0]),
        entry("A3", 90.0, -120.0, 155.0, [0.0, 1.0, 0.0]),
        entry("A4", 0.0, -350.0, 350.0, [1.0, 0.0, 0.0]),
        entry("A5", 0.0, -125.0, 125.0, [0.0, 1.0, 0.0]),
        entry("A6", 0.0, -345.0, 345.0, [1.0, 0.0, 0.0]),
    ]
}
