//! Application state management
//!
//! `AppState` owns the joint registry, animator, publisher, pose store, and
//! the simulated scene, and runs the control tick loop: drain scene events
//! into the registry, advance transitions, retry scene attachment, publish
//! pose reports, and autosave the active pose.

use anyhow::Result;
use armlink_bridge::{Command, CommandDispatcher, DispatchOutcome, PosePublisher, Transport};
use armlink_core::{
    AttachProgress, AttachmentState, FileBackend, JointName, JointRegistry, MemoryScene, Pose,
    PoseStore, PoseTransitionAnimator, SceneEvent, SceneGraph, TickOutcome,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;

/// Display-angle change below which the control surface is not re-echoed
const ECHO_EPSILON_DEG: f64 = 1e-9;

/// Events fanned out to WebSocket clients
#[derive(Debug, Clone)]
pub enum ArmEvent {
    /// A joint's display angle changed (slider echo)
    JointMoved { joint: JointName, display_deg: f64 },
    /// Hover/proximity changed on a joint's scene node
    HoverChanged { joint: JointName, hovered: bool },
    /// The in-flight pose transition reached its target
    TransitionCompleted,
    /// A payload went out on the broker side
    Published { topic: String, payload: String },
}

/// One joint as presented to the API and control surface
#[derive(Debug, Clone, Serialize)]
pub struct JointInfo {
    pub name: String,
    pub display_angle: f64,
    pub min_display_deg: f64,
    pub max_display_deg: f64,
    pub home_offset_deg: f64,
    pub hovered: bool,
    pub attached: bool,
}

/// Mutable control-path state, locked as one unit so a tick sees a
/// consistent registry/animator/publisher.
pub struct ControlState {
    pub registry: JointRegistry,
    pub animator: PoseTransitionAnimator,
    pub publisher: PosePublisher,
}

/// Transport that fans published payloads out over the event channel; the
/// WebSocket clients are the broker connection.
struct BroadcastTransport {
    events: broadcast::Sender<ArmEvent>,
}

impl Transport for BroadcastTransport {
    fn publish(&self, topic: &str, payload: &str) {
        let _ = self.events.send(ArmEvent::Published {
            topic: topic.to_string(),
            payload: payload.to_string(),
        });
    }
}

/// Shared application state
pub struct AppState {
    /// Registry, animator, and publisher behind one lock
    pub control: RwLock<ControlState>,
    /// Pose persistence
    pub store: RwLock<PoseStore>,
    /// Simulated scene standing in for the renderer
    pub scene: Arc<MemoryScene>,
    /// Command dispatch into the control path
    pub dispatcher: CommandDispatcher,
    /// Configuration
    pub config: Config,
    /// Event broadcast for WebSocket clients
    pub events: broadcast::Sender<ArmEvent>,
    transport: Arc<dyn Transport>,
    started: Instant,
}

impl AppState {
    /// Create new application state and start the tick loop
    pub async fn new(config: Config) -> Result<Arc<Self>> {
        let profiles = config.joint_profiles();

        // Scene nodes are registered once up front; controllers attach by
        // name, never by searching the scene tree.
        let scene = Arc::new(MemoryScene::new());
        for profile in &profiles {
            scene.add_node(profile.name.as_str());
        }

        let mut registry = JointRegistry::from_profiles(profiles);
        for controller in registry.all_mut() {
            controller.try_attach(scene.as_ref());
        }

        // Load pose storage and bring the arm back to its last pose
        let backend = FileBackend::open(&config.storage.path)?;
        let store = PoseStore::new(backend);
        match store.load_active() {
            Ok(Some(pose)) => {
                let changed = registry.restore(&pose);
                info!(joints = changed, "Restored active pose");
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Stored active pose unreadable, starting from home"),
        }

        let client_id = Uuid::new_v4().to_string();
        info!(client_id = %client_id, "Bridge identity assigned");

        let publisher = PosePublisher::new(config.bridge.publish_rate_hz, config.bridge.auto_publish);
        let (events, _) = broadcast::channel(100);
        let transport: Arc<dyn Transport> = Arc::new(BroadcastTransport {
            events: events.clone(),
        });

        let state = Arc::new(Self {
            control: RwLock::new(ControlState {
                registry,
                animator: PoseTransitionAnimator::new(),
                publisher,
            }),
            store: RwLock::new(store),
            scene,
            dispatcher: CommandDispatcher::new(client_id),
            config,
            events,
            transport,
            started: Instant::now(),
        });

        let state_clone = state.clone();
        tokio::spawn(async move {
            state_clone.run_tick_loop().await;
        });

        Ok(state)
    }

    /// Milliseconds since daemon start; the clock handed to the animator
    /// and publisher.
    pub fn now_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1_000.0
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<ArmEvent> {
        self.events.subscribe()
    }

    /// Current pose of all joints
    pub async fn snapshot(&self) -> Pose {
        self.control.read().await.registry.snapshot()
    }

    /// All joints with profile and live state
    pub async fn joint_infos(&self) -> Vec<JointInfo> {
        let control = self.control.read().await;
        control
            .registry
            .all()
            .map(|controller| {
                let profile = controller.profile();
                JointInfo {
                    name: profile.name.as_str().to_string(),
                    display_angle: controller.display_angle(),
                    min_display_deg: profile.min_display_deg,
                    max_display_deg: profile.max_display_deg,
                    home_offset_deg: profile.home_offset_deg,
                    hovered: controller.is_hovered(),
                    attached: controller.attachment() == AttachmentState::Attached,
                }
            })
            .collect()
    }

    /// Dispatch a parsed command through the control path
    pub async fn dispatch(&self, command: Command) -> DispatchOutcome {
        let now_ms = self.now_ms();
        let mut control = self.control.write().await;
        let ControlState {
            registry, animator, ..
        } = &mut *control;
        let outcome = self.dispatcher.dispatch(command, registry, animator, now_ms);
        if outcome == DispatchOutcome::PoseRequested {
            self.publish_report(registry);
        }
        outcome
    }

    /// Dispatch a raw inbound command payload (WebSocket frame)
    pub async fn handle_command_payload(&self, payload: &str) -> DispatchOutcome {
        let now_ms = self.now_ms();
        let mut control = self.control.write().await;
        let ControlState {
            registry, animator, ..
        } = &mut *control;
        let outcome = self
            .dispatcher
            .handle_payload(payload, registry, animator, now_ms);
        if outcome == DispatchOutcome::PoseRequested {
            self.publish_report(registry);
        }
        outcome
    }

    /// Write the current pose to the active slot immediately
    pub async fn save_active_pose(&self) -> Pose {
        let pose = self.snapshot().await;
        self.store.write().await.save_active(&pose);
        pose
    }

    fn publish_report(&self, registry: &JointRegistry) {
        let report = self.dispatcher.pose_report(registry);
        self.transport
            .publish(&self.config.bridge.pose_topic, &report.to_json());
    }

    /// The control tick: scene events in, animation frames out, attachment
    /// retries, periodic publishing, autosave. Runs for the process
    /// lifetime at the configured frame rate.
    async fn run_tick_loop(self: Arc<Self>) {
        let rate = self.config.daemon.tick_rate_hz.max(1.0);
        let mut interval = tokio::time::interval(Duration::from_secs_f64(1.0 / rate));
        let autosave = Duration::from_secs(self.config.storage.autosave_interval_secs);

        let mut retry_due: HashMap<JointName, Instant> = HashMap::new();
        let mut last_pose = self.snapshot().await;
        let mut last_saved_pose = last_pose.clone();
        let mut last_save = Instant::now();

        loop {
            interval.tick().await;
            let now = Instant::now();
            let now_ms = self.now_ms();

            let mut hover_changes = Vec::new();
            let mut transition_completed = false;

            {
                let mut control = self.control.write().await;
                let ControlState {
                    registry,
                    animator,
                    publisher,
                } = &mut *control;

                for event in self.scene.drain_events() {
                    if let SceneEvent::HoverChanged { node, hovered } = &event {
                        if registry.find_by_name(node).is_some() {
                            hover_changes.push((JointName::new(node.clone()), *hovered));
                        }
                    }
                    registry.apply_scene_event(&event);
                }

                for controller in registry.all_mut() {
                    if let AttachmentState::Pending { .. } = controller.attachment() {
                        let due = retry_due
                            .get(controller.name())
                            .map_or(true, |at| now >= *at);
                        if due {
                            match controller.try_attach(self.scene.as_ref()) {
                                AttachProgress::RetryAfter(delay) => {
                                    retry_due.insert(controller.name().clone(), now + delay);
                                }
                                _ => {
                                    retry_due.remove(controller.name());
                                }
                            }
                        }
                    }
                }

                if let TickOutcome::Completed(_) = animator.tick(registry, now_ms) {
                    transition_completed = true;
                }

                if publisher.poll(now_ms) {
                    self.publish_report(registry);
                }
            }

            for (joint, hovered) in hover_changes {
                let _ = self.events.send(ArmEvent::HoverChanged { joint, hovered });
            }
            if transition_completed {
                debug!("Pose transition completed");
                let _ = self.events.send(ArmEvent::TransitionCompleted);
            }

            // Control-surface echo: any joint that moved since the last tick,
            // regardless of which input source moved it.
            let pose = self.snapshot().await;
            for (joint, display_deg) in pose.iter() {
                let moved = last_pose
                    .get(joint)
                    .map_or(true, |prev| (prev - display_deg).abs() > ECHO_EPSILON_DEG);
                if moved {
                    let _ = self.events.send(ArmEvent::JointMoved {
                        joint: joint.clone(),
                        display_deg,
                    });
                }
            }
            last_pose = pose;

            if !autosave.is_zero()
                && last_save.elapsed() >= autosave
                && last_pose != last_saved_pose
            {
                self.store.write().await.save_active(&last_pose);
                last_saved_pose = last_pose.clone();
                last_save = Instant::now();
                debug!("Autosaved active pose");
            }
        }
    }
}
