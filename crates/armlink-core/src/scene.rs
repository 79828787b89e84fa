//! Scene collaborator contract and the in-memory simulated scene
//!
//! The renderer is an external collaborator; the engine only needs node
//! lookup by name, a mutable rotation per node, and rotation/hover change
//! events. Changes flow out of the scene through a drained event queue
//! rather than re-entrant callbacks: a controller's own write comes back as
//! a queued echo on the next pump, where the controller's dead-band
//! suppresses it.
//!
//! [`MemoryScene`] is the simulated renderer used by the daemon and tests.
//! Node names are registered once at scene-load time; there is no runtime
//! tree search.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SceneError {
    #[error("scene node not available: {0}")]
    NodeUnavailable(String),
}

/// A change originating in the scene, delivered by the host's event pump.
/// Rotation events include echoes of controller write-backs; the controller
/// dead-band decides which are genuine.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    RotationChanged { node: String, angle_rad: f64 },
    HoverChanged { node: String, hovered: bool },
}

/// Handle to one scene-graph node
pub trait SceneNode: Send + Sync {
    /// Current rotation angle around the node's hinge axis, in radians
    fn rotation(&self) -> f64;

    /// Write the rotation. The axis vector is the joint's fixed hinge
    /// direction; only the angle component changes.
    fn set_rotation(&self, axis: [f64; 3], angle_rad: f64);

    /// Whether hover/proximity events are available for this node
    fn supports_hover(&self) -> bool;
}

/// Scene-graph lookup by node name
pub trait SceneGraph: Send + Sync {
    /// Resolve a node registered under `name`. Best-effort: depending on
    /// scene-load timing the node may not exist yet.
    fn resolve_node(&self, name: &str) -> Result<Arc<dyn SceneNode>, SceneError>;

    /// Take all events queued since the last drain, oldest first
    fn drain_events(&self) -> Vec<SceneEvent>;
}

/// Lock helper that survives poisoning; scene state stays usable even if a
/// holder panicked mid-update.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// One node of the simulated scene
pub struct MemoryNode {
    name: String,
    rotation: Mutex<(f64, [f64; 3])>,
    events: Arc<Mutex<Vec<SceneEvent>>>,
}

impl MemoryNode {
    /// Last axis vector written, for inspection
    pub fn axis(&self) -> [f64; 3] {
        lock(&self.rotation).1
    }
}

impl SceneNode for MemoryNode {
    fn rotation(&self) -> f64 {
        lock(&self.rotation).0
    }

    fn set_rotation(&self, axis: [f64; 3], angle_rad: f64) {
        *lock(&self.rotation) = (angle_rad, axis);
        lock(&self.events).push(SceneEvent::RotationChanged {
            node: self.name.clone(),
            angle_rad,
        });
    }

    fn supports_hover(&self) -> bool {
        true
    }
}

/// In-memory scene graph standing in for the 3D renderer
#[derive(Default)]
pub struct MemoryScene {
    nodes: Mutex<HashMap<String, Arc<MemoryNode>>>,
    events: Arc<Mutex<Vec<SceneEvent>>>,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scene with the given nodes registered up front
    pub fn with_nodes<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let scene = Self::new();
        for name in names {
            scene.add_node(name);
        }
        scene
    }

    /// Register a node. Registration is how the scene loader publishes
    /// nodes the engine may attach to.
    pub fn add_node(&self, name: &str) {
        let node = Arc::new(MemoryNode {
            name: name.to_string(),
            rotation: Mutex::new((0.0, [0.0, 0.0, 1.0])),
            events: self.events.clone(),
        });
        lock(&self.nodes).insert(name.to_string(), node);
    }

    /// Rotate a node from "inside" the scene, as direct 3D manipulation
    /// would. Queues a rotation-changed event like any other write.
    pub fn rotate_node(&self, name: &str, angle_rad: f64) -> Result<(), SceneError> {
        let node = self.get(name)?;
        let axis = node.axis();
        node.set_rotation(axis, angle_rad);
        Ok(())
    }

    /// Report a hover/proximity change for a node
    pub fn set_hovered(&self, name: &str, hovered: bool) -> Result<(), SceneError> {
        self.get(name)?;
        lock(&self.events).push(SceneEvent::HoverChanged {
            node: name.to_string(),
            hovered,
        });
        Ok(())
    }

    /// Current rotation of a node, for inspection
    pub fn rotation_of(&self, name: &str) -> Option<f64> {
        lock(&self.nodes).get(name).map(|n| n.rotation())
    }

    fn get(&self, name: &str) -> Result<Arc<MemoryNode>, SceneError> {
        lock(&self.nodes)
            .get(name)
            .cloned()
            .ok_or_else(|| SceneError::NodeUnavailable(name.to_string()))
    }
}

impl SceneGraph for MemoryScene {
    fn resolve_node(&self, name: &str) -> Result<Arc<dyn SceneNode>, SceneError> {
        Ok(self.get(name)?)
    }

    fn drain_events(&self) -> Vec<SceneEvent> {
        std::mem::take(&mut *lock(&self.events))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_unregistered_node() {
        let scene = MemoryScene::new();
        assert!(scene.resolve_node("A1").is_err());
        scene.add_node("A1");
        assert!(scene.resolve_node("A1").is_ok());
    }

    #[test]
    fn test_writes_queue_events() {
        let scene = MemoryScene::with_nodes(["A1", "A2"]);
        let node = scene.resolve_node("A1").unwrap();
        node.set_rotation([0.0, 0.0, 1.0], 1.5);
        scene.rotate_node("A2", -0.5).unwrap();

        let events = scene.drain_events();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0],
            SceneEvent::RotationChanged {
                node: "A1".to_string(),
                angle_rad: 1.5
            }
        );
        // Drained queue starts empty again
        assert!(scene.drain_events().is_empty());
    }

    #[test]
    fn test_hover_events() {
        let scene = MemoryScene::with_nodes(["A3"]);
        scene.set_hovered("A3", true).unwrap();
        assert!(scene.set_hovered("A9", true).is_err());
        let events = scene.drain_events();
        assert_eq!(
            events[0],
            SceneEvent::HoverChanged {
                node: "A3".to_string(),
                hovered: true
            }
        );
    }
}
