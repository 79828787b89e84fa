//! Wire protocol between the broker and the arm
//!
//! Inbound messages carry a `type` discriminator; unknown types are
//! surfaced as [`CommandError::UnknownType`] so the dispatcher can log and
//! ignore them rather than fail. Outbound pose reports use the `clientId`
//! wire name for compatibility with the browser-side consumers.

use armlink_core::Pose;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default topic the bridge listens on for commands
pub const DEFAULT_COMMAND_TOPIC: &str = "robot/command";

/// Default topic pose reports are published to
pub const DEFAULT_POSE_TOPIC: &str = "robot/pose";

const KNOWN_TYPES: [&str; 4] = ["move", "move_joint", "home", "get_pose"];

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("unknown command type: {0}")]
    UnknownType(String),
    #[error("malformed command: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Inbound command from the broker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Drive several joints to a target pose
    Move {
        pose: Pose,
        #[serde(default)]
        animate: Option<bool>,
        #[serde(default)]
        duration_ms: Option<u64>,
    },
    /// Drive a single joint to a display angle
    MoveJoint { joint: String, angle: f64 },
    /// Return every joint to its home display angle
    Home {
        #[serde(default)]
        animate: Option<bool>,
        #[serde(default)]
        duration_ms: Option<u64>,
    },
    /// Request a one-shot pose report
    GetPose,
}

impl Command {
    /// Parse an inbound payload, distinguishing a well-formed message with
    /// an unrecognized discriminator from outright bad JSON.
    pub fn parse(payload: &str) -> Result<Self, CommandError> {
        match serde_json::from_str::<Command>(payload) {
            Ok(command) => Ok(command),
            Err(e) => {
                if let Ok(value) = serde_json::from_str::<serde_json::Value>(payload) {
                    if let Some(kind) = value.get("type").and_then(|t| t.as_str()) {
                        if !KNOWN_TYPES.contains(&kind) {
                            return Err(CommandError::UnknownType(kind.to_string()));
                        }
                    }
                }
                Err(CommandError::Malformed(e))
            }
        }
    }
}

/// Outbound pose report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseReport {
    /// Epoch milliseconds at report time
    pub timestamp: i64,
    /// Joint name to display angle, degrees
    pub joints: Pose,
    #[serde(rename = "clientId")]
    pub client_id: String,
}

impl PoseReport {
    pub fn new(joints: Pose, client_id: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now().timestamp_millis(),
            joints,
            client_id: client_id.into(),
        }
    }

    pub fn to_json(&self) -> String {
        // Numbers, strings, and a flat map cannot fail to serialize
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_move() {
        let command =
            Command::parse("{\"type\": \"move\", \"pose\": {\"A1\": 45.0}, \"duration_ms\": 500}")
                .unwrap();
        match command {
            Command::Move {
                pose,
                animate,
                duration_ms,
            } => {
                assert_eq!(pose.get(&"A1".into()), Some(45.0));
                assert_eq!(animate, None);
                assert_eq!(duration_ms, Some(500));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_move_joint() {
        let command = Command::parse("{\"type\": \"move_joint\", \"joint\": \"A3\", \"angle\": -12.5}")
            .unwrap();
        assert_eq!(
            command,
            Command::MoveJoint {
                joint: "A3".to_string(),
                angle: -12.5
            }
        );
    }

    #[test]
    fn test_parse_bare_home_and_get_pose() {
        assert!(matches!(
            Command::parse("{\"type\": \"home\"}").unwrap(),
            Command::Home {
                animate: None,
                duration_ms: None
            }
        ));
        assert!(matches!(
            Command::parse("{\"type\": \"get_pose\"}").unwrap(),
            Command::GetPose
        ));
    }

    #[test]
    fn test_unknown_type_is_distinguished_from_malformed() {
        match Command::parse("{\"type\": \"dance\"}") {
            Err(CommandError::UnknownType(kind)) => assert_eq!(kind, "dance"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(matches!(
            Command::parse("{\"type\": \"move\"}"),
            Err(CommandError::Malformed(_))
        ));
        assert!(matches!(
            Command::parse("not json"),
            Err(CommandError::Malformed(_))
        ));
    }

    #[test]
    fn test_pose_report_wire_shape() {
        let mut joints = Pose::new();
        joints.set("A1", 10.0);
        let report = PoseReport::new(joints, "bridge-1");
        let value: serde_json::Value = serde_json::from_str(&report.to_json()).unwrap();
        assert!(value.get("timestamp").unwrap().is_i64());
        assert_eq!(value["joints"]["A1"], 10.0);
        assert_eq!(value["clientId"], "bridge-1");
    }
}
