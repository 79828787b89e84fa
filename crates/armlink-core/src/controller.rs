//! One controller per robot axis
//!
//! A controller owns the display-angle value for its joint and the wiring
//! between the control surface and the scene node: display writes go to the
//! scene through the home-offset conversion, scene changes come back through
//! the drained event pump and are accepted only past a dead-band that
//! filters out the controller's own write echoes.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::angle;
use crate::joint::{JointName, JointProfile};
use crate::scene::{SceneGraph, SceneNode};

/// Minimum display-angle difference (degrees) for a scene-originated change
/// to be accepted as genuine rather than the echo of this controller's own
/// write-back. Without it, floating-point rounding in the angle round trip
/// would keep re-triggering the controller from its own writes.
pub const SCENE_ECHO_DEADBAND_DEG: f64 = 0.5;

/// Resolution attempts made for a scene node before giving up for the session
pub const MAX_ATTACH_ATTEMPTS: u32 = 3;

/// Delay before the next attachment attempt; grows linearly with the number
/// of attempts already made.
pub fn attach_retry_delay(attempts_made: u32) -> Duration {
    Duration::from_millis(500) * attempts_made
}

/// Scene-attachment lifecycle for one controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentState {
    /// Node not yet resolved; `attempts` resolutions tried so far
    Pending { attempts: u32 },
    /// Node resolved; scene writes are live
    Attached,
    /// Gave up for this session; scene writes stay no-ops
    Failed,
}

/// Outcome of one attachment attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachProgress {
    Attached,
    RetryAfter(Duration),
    GaveUp,
}

pub struct JointController {
    profile: JointProfile,
    display_deg: f64,
    attachment: AttachmentState,
    node: Option<Arc<dyn SceneNode>>,
    hovered: bool,
}

impl JointController {
    /// Create a detached controller resting at the home display angle
    pub fn new(profile: JointProfile) -> Self {
        let display_deg = profile.clamp(0.0);
        Self {
            profile,
            display_deg,
            attachment: AttachmentState::Pending { attempts: 0 },
            node: None,
            hovered: false,
        }
    }

    pub fn name(&self) -> &JointName {
        &self.profile.name
    }

    pub fn profile(&self) -> &JointProfile {
        &self.profile
    }

    /// Current display angle, available whether or not the scene node is
    /// attached yet.
    pub fn display_angle(&self) -> f64 {
        self.display_deg
    }

    pub fn attachment(&self) -> AttachmentState {
        self.attachment
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    /// Set the display angle: clamp to bounds, store, and when a scene node
    /// is attached write the mechanical angle through. Returns whether the
    /// stored value changed. While detached the stored value still updates
    /// so the control surface stays responsive; the scene catches up with
    /// one corrective write at attachment.
    pub fn set_display_angle(&mut self, value: f64) -> bool {
        if !value.is_finite() {
            warn!(joint = %self.profile.name, value, "Ignoring non-finite display angle");
            return false;
        }
        let clamped = self.profile.clamp(value);
        let changed = clamped != self.display_deg;
        self.display_deg = clamped;
        if let Some(node) = &self.node {
            node.set_rotation(
                self.profile.rotation_axis,
                angle::to_mechanical(clamped, self.profile.home_offset_deg),
            );
        }
        changed
    }

    /// Scene-originated rotation change (including echoes of this
    /// controller's own writes). Converts back to display space, clamps,
    /// and accepts the value only past the dead-band. Never writes back to
    /// the scene node. Returns whether the change was accepted, which is
    /// what drives the control-surface echo.
    pub fn on_scene_rotation_changed(&mut self, mechanical_rad: f64) -> bool {
        if !mechanical_rad.is_finite() {
            return false;
        }
        let candidate = self
            .profile
            .clamp(angle::to_display(mechanical_rad, self.profile.home_offset_deg));
        if (candidate - self.display_deg).abs() > SCENE_ECHO_DEADBAND_DEG {
            self.display_deg = candidate;
            true
        } else {
            false
        }
    }

    /// Hover/proximity change from the scene
    pub fn on_hover_changed(&mut self, hovered: bool) {
        self.hovered = hovered;
    }

    /// Try to resolve this joint's scene node. On success the stored display
    /// angle is pushed to the node so the scene ends up in sync with values
    /// set while detached. After [`MAX_ATTACH_ATTEMPTS`] failures the node is
    /// treated as permanently unavailable for the session.
    pub fn try_attach(&mut self, scene: &dyn SceneGraph) -> AttachProgress {
        let attempts = match self.attachment {
            AttachmentState::Attached => return AttachProgress::Attached,
            AttachmentState::Failed => return AttachProgress::GaveUp,
            AttachmentState::Pending { attempts } => attempts,
        };

        match scene.resolve_node(self.profile.name.as_str()) {
            Ok(node) => {
                if !node.supports_hover() {
                    warn!(joint = %self.profile.name, "Scene node lacks hover events");
                }
                node.set_rotation(
                    self.profile.rotation_axis,
                    angle::to_mechanical(self.display_deg, self.profile.home_offset_deg),
                );
                self.node = Some(node);
                self.attachment = AttachmentState::Attached;
                debug!(joint = %self.profile.name, "Scene node attached");
                AttachProgress::Attached
            }
            Err(e) => {
                let attempts = attempts + 1;
                if attempts >= MAX_ATTACH_ATTEMPTS {
                    self.attachment = AttachmentState::Failed;
                    warn!(
                        joint = %self.profile.name,
                        error = %e,
                        "Scene node unavailable, giving up for this session"
                    );
                    AttachProgress::GaveUp
                } else {
                    self.attachment = AttachmentState::Pending { attempts };
                    debug!(joint = %self.profile.name, attempts, "Scene node not ready, will retry");
                    AttachProgress::RetryAfter(attach_retry_delay(attempts))
                }
            }
        }
    }
}
