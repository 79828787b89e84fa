//! Registry of all active joint controllers
//!
//! An explicit object rather than ambient static state: whoever needs joint
//! enumeration (dispatch, animation, snapshots) gets handed a reference.

use tracing::debug;

use crate::controller::JointController;
use crate::joint::{JointName, JointProfile};
use crate::pose::Pose;
use crate::scene::SceneEvent;

/// Collection of joint controllers, keyed by joint name, iterated in
/// registration order.
#[derive(Default)]
pub struct JointRegistry {
    controllers: Vec<JointController>,
}

impl JointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with one controller per profile, in table order
    pub fn from_profiles(profiles: impl IntoIterator<Item = JointProfile>) -> Self {
        let mut registry = Self::new();
        for profile in profiles {
            registry.register(JointController::new(profile));
        }
        registry
    }

    /// Register a controller. A controller with the same joint name replaces
    /// the earlier registration.
    pub fn register(&mut self, controller: JointController) {
        self.unregister(controller.name().clone());
        self.controllers.push(controller);
    }

    /// Remove a controller by joint name
    pub fn unregister(&mut self, name: impl Into<JointName>) -> Option<JointController> {
        let name = name.into();
        let idx = self.controllers.iter().position(|c| c.name() == &name)?;
        Some(self.controllers.remove(idx))
    }

    /// All controllers in registration order
    pub fn all(&self) -> impl Iterator<Item = &JointController> {
        self.controllers.iter()
    }

    pub fn all_mut(&mut self) -> impl Iterator<Item = &mut JointController> {
        self.controllers.iter_mut()
    }

    pub fn find_by_name(&self, name: &str) -> Option<&JointController> {
        self.controllers.iter().find(|c| c.name().as_str() == name)
    }

    pub fn find_by_name_mut(&mut self, name: &str) -> Option<&mut JointController> {
        self.controllers
            .iter_mut()
            .find(|c| c.name().as_str() == name)
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    /// Read every controller's display angle into a pose. No side effects.
    pub fn snapshot(&self) -> Pose {
        self.controllers
            .iter()
            .map(|c| (c.name().clone(), c.display_angle()))
            .collect()
    }

    /// Apply a pose directly, without animation. Joints named in the pose
    /// but not registered are ignored; registered joints missing from the
    /// pose are left unchanged. Returns how many controllers changed value.
    pub fn restore(&mut self, pose: &Pose) -> usize {
        let mut changed = 0;
        for (name, display_deg) in pose.iter() {
            match self.find_by_name_mut(name.as_str()) {
                Some(controller) => {
                    if controller.set_display_angle(display_deg) {
                        changed += 1;
                    }
                }
                None => debug!(joint = %name, "Ignoring pose entry for unregistered joint"),
            }
        }
        changed
    }

    /// Route one drained scene event to the controller owning that node.
    /// Returns the joint and its new display angle when a rotation change
    /// was accepted past the dead-band (the control-surface echo).
    pub fn apply_scene_event(&mut self, event: &SceneEvent) -> Option<(JointName, f64)> {
        match event {
            SceneEvent::RotationChanged { node, angle_rad } => {
                let controller = self.find_by_name_mut(node)?;
                if controller.on_scene_rotation_changed(*angle_rad) {
                    Some((controller.name().clone(), controller.display_angle()))
                } else {
                    None
                }
            }
            SceneEvent::HoverChanged { node, hovered } => {
                if let Some(controller) = self.find_by_name_mut(node) {
                    controller.on_hover_changed(*hovered);
                }
                None
            }
        }
    }
}
