//! REST API handlers

use armlink_bridge::Command;
use armlink_core::{Pose, StoreError};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::state::AppState;

/// API error response
#[derive(Serialize)]
struct ApiError {
    error: String,
}

impl ApiError {
    fn new(msg: impl Into<String>) -> Self {
        Self { error: msg.into() }
    }
}

/// Current pose of all joints
pub async fn get_pose(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.snapshot().await)
}

/// Restore request body
#[derive(Deserialize)]
pub struct RestoreRequest {
    pub joints: Pose,
    #[serde(default)]
    pub animate: Option<bool>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

/// Apply a pose to the arm
pub async fn restore_pose(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RestoreRequest>,
) -> impl IntoResponse {
    let outcome = state
        .dispatch(Command::Move {
            pose: req.joints,
            animate: req.animate,
            duration_ms: req.duration_ms,
        })
        .await;
    Json(serde_json::json!({ "status": outcome_label(&outcome) }))
}

/// Persist the current pose to the active slot immediately
pub async fn save_pose(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let pose = state.save_active_pose().await;
    info!(joints = pose.len(), "Saved active pose");
    Json(serde_json::json!({ "status": "saved" }))
}

/// Motion options for home/apply requests
#[derive(Deserialize, Default)]
pub struct MotionRequest {
    #[serde(default)]
    pub animate: Option<bool>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

/// Return every joint to its home display angle
pub async fn home(
    State(state): State<Arc<AppState>>,
    body: Option<Json<MotionRequest>>,
) -> impl IntoResponse {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let outcome = state
        .dispatch(Command::Home {
            animate: req.animate,
            duration_ms: req.duration_ms,
        })
        .await;
    Json(serde_json::json!({ "status": outcome_label(&outcome) }))
}

/// Publisher settings body
#[derive(Deserialize)]
pub struct PublishRequest {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub rate_hz: Option<f64>,
}

/// Read the pose-publisher settings
pub async fn get_publish(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let control = state.control.read().await;
    Json(serde_json::json!({
        "enabled": control.publisher.is_enabled(),
        "rate_hz": control.publisher.rate_hz(),
    }))
}

/// Change the pose-publisher settings
pub async fn configure_publish(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PublishRequest>,
) -> impl IntoResponse {
    let mut control = state.control.write().await;
    if let Some(enabled) = req.enabled {
        control.publisher.set_enabled(enabled);
        info!(enabled, "Auto-publish toggled");
    }
    if let Some(rate_hz) = req.rate_hz {
        control.publisher.set_rate_hz(rate_hz);
    }
    Json(serde_json::json!({
        "enabled": control.publisher.is_enabled(),
        "rate_hz": control.publisher.rate_hz(),
    }))
}

/// List all joints with profile and live state
pub async fn list_joints(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.joint_infos().await)
}

/// Names of all saved configurations
pub async fn list_configs(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let store = state.store.read().await;
    Json(store.list_names())
}

/// Get one saved configuration
pub async fn get_saved_config(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    let store = state.store.read().await;
    match store.load_named(&name) {
        Ok(Some(pose)) => Json(pose).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiError::new("Configuration not found")),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::new(format!("Stored configuration unreadable: {}", e))),
        )
            .into_response(),
    }
}

/// Save a configuration under a name. With a pose body that pose is saved;
/// without one the arm's current pose is.
pub async fn save_config(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: Option<Json<Pose>>,
) -> impl IntoResponse {
    let pose = match body {
        Some(Json(pose)) => pose,
        None => state.snapshot().await,
    };
    state.store.write().await.save_named(&name, &pose);
    info!(name = %name, joints = pose.len(), "Saved configuration");
    Json(serde_json::json!({ "status": "saved", "name": name }))
}

/// Delete a saved configuration
pub async fn delete_config(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    state.store.write().await.delete_named(&name);
    info!(name = %name, "Deleted configuration");
    Json(serde_json::json!({ "status": "deleted" }))
}

/// Apply a saved configuration to the arm
pub async fn apply_config(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: Option<Json<MotionRequest>>,
) -> impl IntoResponse {
    let pose = {
        let store = state.store.read().await;
        match store.load_named(&name) {
            Ok(Some(pose)) => pose,
            Ok(None) => {
                return (
                    StatusCode::NOT_FOUND,
                    Json(ApiError::new("Configuration not found")),
                )
                    .into_response()
            }
            Err(e) => {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiError::new(format!("Stored configuration unreadable: {}", e))),
                )
                    .into_response()
            }
        }
    };

    let req = body.map(|Json(req)| req).unwrap_or_default();
    let outcome = state
        .dispatch(Command::Move {
            pose,
            animate: req.animate,
            duration_ms: req.duration_ms,
        })
        .await;
    Json(serde_json::json!({ "status": outcome_label(&outcome), "name": name })).into_response()
}

/// Export the current pose in the canonical text encoding
pub async fn export_pose(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let pose = state.snapshot().await;
    let text = state.store.read().await.export_text(&pose);
    (
        StatusCode::OK,
        [("content-type", "application/json")],
        text,
    )
}

/// Import a pose from the canonical text encoding and apply it directly
pub async fn import_pose(
    State(state): State<Arc<AppState>>,
    body: String,
) -> impl IntoResponse {
    let pose = {
        let store = state.store.read().await;
        match store.import_text(&body) {
            Ok(pose) => pose,
            Err(e @ StoreError::MalformedPayload(_)) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ApiError::new(format!("{}", e))),
                )
                    .into_response()
            }
            Err(e) => {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiError::new(format!("{}", e))),
                )
                    .into_response()
            }
        }
    };

    state
        .dispatch(Command::Move {
            pose: pose.clone(),
            animate: Some(false),
            duration_ms: None,
        })
        .await;
    Json(pose).into_response()
}

/// Current daemon configuration
pub async fn get_config(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.config.clone())
}

fn outcome_label(outcome: &armlink_bridge::DispatchOutcome) -> &'static str {
    use armlink_bridge::DispatchOutcome::*;
    match outcome {
        Applied { .. } => "applied",
        TransitionStarted { .. } => "transition",
        PoseRequested => "pose_requested",
        Ignored => "ignored",
    }
}
