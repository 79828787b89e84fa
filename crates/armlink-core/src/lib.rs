//! Armlink Core - Joint synchronization engine for a simulated 6-axis arm
//!
//! This crate provides the foundational pieces of the Armlink system:
//! - Display/mechanical angle mapping with per-joint home offsets
//! - Joint controllers wiring the control surface to scene-node rotation
//! - A registry of controllers with pose snapshot/restore
//! - Smooth pose transitions with preemptive animation runs
//! - Pose persistence with an active slot and named configurations

pub mod angle;
pub mod animator;
pub mod controller;
pub mod joint;
pub mod pose;
pub mod registry;
pub mod scene;
pub mod store;

pub use animator::{PoseTransitionAnimator, RunToken, TickOutcome, DEFAULT_TRANSITION_MS};
pub use controller::{
    AttachProgress, AttachmentState, JointController, MAX_ATTACH_ATTEMPTS, SCENE_ECHO_DEADBAND_DEG,
};
pub use joint::{default_profiles, JointName, JointProfile};
pub use pose::Pose;
pub use registry::JointRegistry;
pub use scene::{MemoryScene, SceneError, SceneEvent, SceneGraph, SceneNode};
pub use store::{FileBackend, KvBackend, MemoryBackend, PoseStore, StoreError};
