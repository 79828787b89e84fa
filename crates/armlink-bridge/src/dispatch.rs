//! Command dispatch into the registry and animator
//!
//! Remote commands reach the joints through the same write path as slider
//! input: direct sets go through the registry, animated moves through the
//! transition animator. A bad command degrades to a logged no-op.

use armlink_core::{JointRegistry, Pose, PoseTransitionAnimator, RunToken, DEFAULT_TRANSITION_MS};
use tracing::{debug, info, warn};

use crate::protocol::{Command, CommandError, PoseReport};

/// What a dispatched command did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DispatchOutcome {
    /// Joints set directly; count of controllers whose value changed
    Applied { changed: usize },
    /// An animated transition was started
    TransitionStarted { token: RunToken },
    /// Caller should publish a one-shot pose report
    PoseRequested,
    /// Unknown joint, unknown command type, or malformed payload
    Ignored,
}

pub struct CommandDispatcher {
    client_id: String,
    default_duration_ms: u64,
}

impl CommandDispatcher {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            default_duration_ms: DEFAULT_TRANSITION_MS,
        }
    }

    pub fn with_default_duration(mut self, duration_ms: u64) -> Self {
        self.default_duration_ms = duration_ms;
        self
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Parse and dispatch one raw inbound payload. Unknown command types
    /// and malformed payloads are logged and ignored, never fatal.
    pub fn handle_payload(
        &self,
        payload: &str,
        registry: &mut JointRegistry,
        animator: &mut PoseTransitionAnimator,
        now_ms: f64,
    ) -> DispatchOutcome {
        match Command::parse(payload) {
            Ok(command) => self.dispatch(command, registry, animator, now_ms),
            Err(CommandError::UnknownType(kind)) => {
                warn!(kind = %kind, "Ignoring unknown command type");
                DispatchOutcome::Ignored
            }
            Err(e) => {
                warn!(error = %e, "Ignoring malformed command payload");
                DispatchOutcome::Ignored
            }
        }
    }

    pub fn dispatch(
        &self,
        command: Command,
        registry: &mut JointRegistry,
        animator: &mut PoseTransitionAnimator,
        now_ms: f64,
    ) -> DispatchOutcome {
        match command {
            Command::Move {
                pose,
                animate,
                duration_ms,
            } => {
                debug!(joints = pose.len(), "Move command");
                self.apply_pose(pose, animate, duration_ms, registry, animator, now_ms)
            }
            Command::MoveJoint { joint, angle } => match registry.find_by_name_mut(&joint) {
                Some(controller) => {
                    let changed = controller.set_display_angle(angle);
                    debug!(joint = %joint, angle, "Joint moved");
                    DispatchOutcome::Applied {
                        changed: changed as usize,
                    }
                }
                None => {
                    warn!(joint = %joint, "Ignoring move for unknown joint");
                    DispatchOutcome::Ignored
                }
            },
            Command::Home {
                animate,
                duration_ms,
            } => {
                info!("Homing all joints");
                let target: Pose = registry
                    .all()
                    .map(|c| (c.name().clone(), c.profile().clamp(0.0)))
                    .collect();
                self.apply_pose(target, animate, duration_ms, registry, animator, now_ms)
            }
            Command::GetPose => DispatchOutcome::PoseRequested,
        }
    }

    /// Build a pose report for the registry's current state
    pub fn pose_report(&self, registry: &JointRegistry) -> PoseReport {
        PoseReport::new(registry.snapshot(), self.client_id.clone())
    }

    fn apply_pose(
        &self,
        target: Pose,
        animate: Option<bool>,
        duration_ms: Option<u64>,
        registry: &mut JointRegistry,
        animator: &mut PoseTransitionAnimator,
        now_ms: f64,
    ) -> DispatchOutcome {
        // A driven arm glides unless the sender asks for a direct set
        if animate.unwrap_or(true) {
            let duration = duration_ms.unwrap_or(self.default_duration_ms);
            let token = animator.start(registry, &target, duration, now_ms);
            DispatchOutcome::TransitionStarted { token }
        } else {
            DispatchOutcome::Applied {
                changed: registry.restore(&target),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use armlink_core::default_profiles;

    fn fixture() -> (JointRegistry, PoseTransitionAnimator, CommandDispatcher) {
        (
            JointRegistry::from_profiles(default_profiles()),
            PoseTransitionAnimator::new(),
            CommandDispatcher::new("test-bridge"),
        )
    }

    #[test]
    fn test_move_joint_sets_directly() {
        let (mut registry, mut animator, dispatcher) = fixture();
        let outcome = dispatcher.handle_payload(
            "{\"type\": \"move_joint\", \"joint\": \"A2\", \"angle\": 25.0}",
            &mut registry,
            &mut animator,
            0.0,
        );
        assert_eq!(outcome, DispatchOutcome::Applied { changed: 1 });
        assert_eq!(registry.find_by_name("A2").unwrap().display_angle(), 25.0);
        assert!(!animator.is_running());
    }

    #[test]
    fn test_move_animates_by_default() {
        let (mut registry, mut animator, dispatcher) = fixture();
        let outcome = dispatcher.handle_payload(
            "{\"type\": \"move\", \"pose\": {\"A1\": 90.0}}",
            &mut registry,
            &mut animator,
            0.0,
        );
        assert!(matches!(outcome, DispatchOutcome::TransitionStarted { .. }));
        assert!(animator.is_running());

        // Run to completion through the default duration
        animator.tick(&mut registry, DEFAULT_TRANSITION_MS as f64 + 1.0);
        assert_eq!(registry.find_by_name("A1").unwrap().display_angle(), 90.0);
    }

    #[test]
    fn test_move_direct_when_animate_false() {
        let (mut registry, mut animator, dispatcher) = fixture();
        let outcome = dispatcher.handle_payload(
            "{\"type\": \"move\", \"pose\": {\"A1\": 45.0, \"A3\": 10.0}, \"animate\": false}",
            &mut registry,
            &mut animator,
            0.0,
        );
        assert_eq!(outcome, DispatchOutcome::Applied { changed: 2 });
        assert!(!animator.is_running());
        assert_eq!(registry.find_by_name("A3").unwrap().display_angle(), 10.0);
    }

    #[test]
    fn test_home_targets_every_joint() {
        let (mut registry, mut animator, dispatcher) = fixture();
        for controller in registry.all_mut() {
            controller.set_display_angle(33.0);
        }

        let outcome = dispatcher.dispatch(
            Command::Home {
                animate: Some(false),
                duration_ms: None,
            },
            &mut registry,
            &mut animator,
            0.0,
        );
        assert!(matches!(outcome, DispatchOutcome::Applied { .. }));
        for controller in registry.all() {
            assert_eq!(controller.display_angle(), 0.0);
        }
    }

    #[test]
    fn test_get_pose_requests_report() {
        let (mut registry, mut animator, dispatcher) = fixture();
        registry.find_by_name_mut("A6").unwrap().set_display_angle(-345.0);

        let outcome = dispatcher.dispatch(Command::GetPose, &mut registry, &mut animator, 0.0);
        assert_eq!(outcome, DispatchOutcome::PoseRequested);

        let report = dispatcher.pose_report(&registry);
        assert_eq!(report.client_id, "test-bridge");
        assert_eq!(report.joints.get(&"A6".into()), Some(-345.0));
        assert_eq!(report.joints.len(), 6);
    }

    #[test]
    fn test_bad_payloads_are_ignored() {
        let (mut registry, mut animator, dispatcher) = fixture();
        let before = registry.snapshot();

        for payload in [
            "{\"type\": \"dance\"}",
            "not json",
            "{\"type\": \"move_joint\", \"joint\": \"A9\", \"angle\": 1.0}",
        ] {
            let outcome =
                dispatcher.handle_payload(payload, &mut registry, &mut animator, 0.0);
            assert_eq!(outcome, DispatchOutcome::Ignored, "payload: {payload}");
        }
        assert_eq!(registry.snapshot(), before);
    }
}
