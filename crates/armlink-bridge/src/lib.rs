//! Armlink Bridge - broker connectivity for the arm
//!
//! This crate carries the network side of the system:
//! - The wire protocol: inbound commands, outbound pose reports
//! - Dispatch of commands into the joint registry and animator
//! - Rate-gated periodic pose publishing behind a transport trait

pub mod dispatch;
pub mod protocol;
pub mod publisher;

pub use dispatch::{CommandDispatcher, DispatchOutcome};
pub use protocol::{
    Command, CommandError, PoseReport, DEFAULT_COMMAND_TOPIC, DEFAULT_POSE_TOPIC,
};
pub use publisher::{PosePublisher, Transport, DEFAULT_PUBLISH_RATE_HZ};
