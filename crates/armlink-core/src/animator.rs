//! Smooth pose transitions
//!
//! Drives one or many joints from their current display angles to a target
//! pose over a fixed duration with an ease-in-out curve. The animator holds
//! no timers; the host ticks it at its frame rate and supplies the clock,
//! which also keeps every run deterministic under test.
//!
//! One run at a time: starting a new run preempts the one in flight. The
//! fresh token invalidates the old run, so two transitions never race over
//! the same joints.

use tracing::debug;

use crate::joint::JointName;
use crate::pose::Pose;
use crate::registry::JointRegistry;

/// Transition duration used when a caller does not specify one
pub const DEFAULT_TRANSITION_MS: u64 = 1_000;

/// Identity of one animation run. A token stays unique for the life of the
/// animator, so a completed or preempted run can never be confused with the
/// current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunToken(u64);

/// Ease-in-out curve over normalized progress. Reaches exactly 1 at
/// progress 1, so transitions land on their targets.
pub fn ease_in_out(progress: f64) -> f64 {
    if progress < 0.5 {
        2.0 * progress * progress
    } else {
        1.0 - (-2.0 * progress + 2.0).powi(2) / 2.0
    }
}

struct JointTrack {
    name: JointName,
    start_deg: f64,
    target_deg: f64,
}

struct Run {
    token: RunToken,
    started_ms: f64,
    duration_ms: u64,
    tracks: Vec<JointTrack>,
}

/// What one tick did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// No run in flight
    Idle,
    /// Run advanced; `progress` is normalized elapsed time
    Running { token: RunToken, progress: f64 },
    /// Run reached its target this tick and was retired
    Completed(RunToken),
}

#[derive(Default)]
pub struct PoseTransitionAnimator {
    next_token: u64,
    run: Option<Run>,
}

impl PoseTransitionAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a transition from the registry's current angles to `target`.
    /// The start pose is captured immediately, restricted to the joints
    /// named in `target`; targets are clamped to each joint's bounds so the
    /// whole path stays in range. Any in-flight run is preempted.
    pub fn start(
        &mut self,
        registry: &JointRegistry,
        target: &Pose,
        duration_ms: u64,
        now_ms: f64,
    ) -> RunToken {
        self.next_token += 1;
        let token = RunToken(self.next_token);

        let tracks: Vec<JointTrack> = target
            .iter()
            .filter_map(|(name, target_deg)| {
                registry.find_by_name(name.as_str()).map(|controller| JointTrack {
                    name: name.clone(),
                    start_deg: controller.display_angle(),
                    target_deg: controller.profile().clamp(target_deg),
                })
            })
            .collect();

        if let Some(previous) = &self.run {
            debug!(
                preempted = previous.token.0,
                token = token.0,
                "Preempting in-flight transition"
            );
        }
        self.run = Some(Run {
            token,
            started_ms: now_ms,
            duration_ms,
            tracks,
        });
        token
    }

    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    pub fn current_token(&self) -> Option<RunToken> {
        self.run.as_ref().map(|run| run.token)
    }

    /// Advance the in-flight run to `now_ms`, applying interpolated display
    /// angles through the registry's normal write path. At full progress the
    /// exact target values are applied, so no interpolation residue is left
    /// on the joints.
    pub fn tick(&mut self, registry: &mut JointRegistry, now_ms: f64) -> TickOutcome {
        let Some(run) = &self.run else {
            return TickOutcome::Idle;
        };

        let progress = if run.duration_ms == 0 {
            1.0
        } else {
            ((now_ms - run.started_ms) / run.duration_ms as f64).clamp(0.0, 1.0)
        };

        if progress >= 1.0 {
            for track in &run.tracks {
                if let Some(controller) = registry.find_by_name_mut(track.name.as_str()) {
                    controller.set_display_angle(track.target_deg);
                }
            }
            let token = run.token;
            self.run = None;
            TickOutcome::Completed(token)
        } else {
            let eased = ease_in_out(progress);
            for track in &run.tracks {
                if let Some(controller) = registry.find_by_name_mut(track.name.as_str()) {
                    let current = track.start_deg + (track.target_deg - track.start_deg) * eased;
                    controller.set_display_angle(current);
                }
            }
            TickOutcome::Running {
                token: run.token,
                progress,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joint::default_profiles;

    fn registry() -> JointRegistry {
        JointRegistry::from_profiles(default_profiles())
    }

    #[test]
    fn test_ease_curve_shape() {
        assert_eq!(ease_in_out(0.0), 0.0);
        assert!((ease_in_out(0.5) - 0.5).abs() < 1e-12);
        assert_eq!(ease_in_out(1.0), 1.0);

        // Monotone non-decreasing across the whole range
        let mut previous = 0.0;
        for i in 0..=100 {
            let eased = ease_in_out(i as f64 / 100.0);
            assert!(eased >= previous);
            previous = eased;
        }
    }

    #[test]
    fn test_run_lands_exactly_on_target() {
        let mut registry = registry();
        let mut animator = PoseTransitionAnimator::new();

        let mut target = Pose::new();
        target.set("A1", 45.0);
        target.set("A3", 10.0);

        let token = animator.start(&registry, &target, 600, 0.0);
        assert_eq!(animator.tick(&mut registry, 150.0), TickOutcome::Running { token, progress: 0.25 });
        assert_eq!(animator.tick(&mut registry, 900.0), TickOutcome::Completed(token));

        // Exact equality: completion writes the targets, not a lerp result
        assert_eq!(registry.find_by_name("A1").unwrap().display_angle(), 45.0);
        assert_eq!(registry.find_by_name("A3").unwrap().display_angle(), 10.0);
        assert!(!animator.is_running());
        assert_eq!(animator.tick(&mut registry, 1000.0), TickOutcome::Idle);
    }

    #[test]
    fn test_only_targeted_joints_move() {
        let mut registry = registry();
        let mut animator = PoseTransitionAnimator::new();
        let before = registry.snapshot();

        let mut target = Pose::new();
        target.set("A2", 30.0);
        animator.start(&registry, &target, 100, 0.0);
        animator.tick(&mut registry, 50.0);
        animator.tick(&mut registry, 100.0);

        for name in ["A1", "A3", "A4", "A5", "A6"] {
            assert_eq!(
                registry.find_by_name(name).unwrap().display_angle(),
                before.get(&crate::joint::JointName::new(name)).unwrap()
            );
        }
        assert_eq!(registry.find_by_name("A2").unwrap().display_angle(), 30.0);
    }

    #[test]
    fn test_midpoint_is_halfway() {
        let mut registry = registry();
        let mut animator = PoseTransitionAnimator::new();

        let mut target = Pose::new();
        target.set("A1", 100.0);
        animator.start(&registry, &target, 1000, 0.0);
        animator.tick(&mut registry, 500.0);

        // eased(0.5) == 0.5, so the joint sits exactly between start and target
        assert!((registry.find_by_name("A1").unwrap().display_angle() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_new_run_preempts_previous() {
        let mut registry = registry();
        let mut animator = PoseTransitionAnimator::new();

        let mut first = Pose::new();
        first.set("A1", 100.0);
        let first_token = animator.start(&registry, &first, 1000, 0.0);
        animator.tick(&mut registry, 500.0);

        let mut second = Pose::new();
        second.set("A1", -20.0);
        let second_token = animator.start(&registry, &second, 1000, 500.0);
        assert_ne!(first_token, second_token);
        assert_eq!(animator.current_token(), Some(second_token));

        assert_eq!(
            animator.tick(&mut registry, 1500.0),
            TickOutcome::Completed(second_token)
        );
        assert_eq!(registry.find_by_name("A1").unwrap().display_angle(), -20.0);
    }

    #[test]
    fn test_zero_duration_completes_immediately() {
        let mut registry = registry();
        let mut animator = PoseTransitionAnimator::new();

        let mut target = Pose::new();
        target.set("A4", 90.0);
        let token = animator.start(&registry, &target, 0, 10.0);
        assert_eq!(animator.tick(&mut registry, 10.0), TickOutcome::Completed(token));
        assert_eq!(registry.find_by_name("A4").unwrap().display_angle(), 90.0);
    }

    #[test]
    fn test_out_of_range_target_clamped_at_capture() {
        let mut registry = registry();
        let mut animator = PoseTransitionAnimator::new();

        let mut target = Pose::new();
        target.set("A5", 500.0); // A5 bounds are [-125, 125]
        let token = animator.start(&registry, &target, 100, 0.0);
        assert_eq!(animator.tick(&mut registry, 100.0), TickOutcome::Completed(token));
        assert_eq!(registry.find_by_name("A5").unwrap().display_angle(), 125.0);
    }
}
