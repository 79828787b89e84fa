//! WebSocket handler for real-time updates and inbound commands
//!
//! The socket is the bridge transport: inbound text frames are broker
//! commands, outbound frames carry slider echo, hover changes, transition
//! lifecycle, and published pose reports.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::state::{AppState, ArmEvent, JointInfo};

/// WebSocket message types
#[derive(Serialize)]
#[serde(tag = "type", content = "data")]
enum WsMessage {
    #[serde(rename = "joints")]
    Joints(Vec<JointInfo>),
    #[serde(rename = "joint_moved")]
    JointMoved { joint: String, angle: f64 },
    #[serde(rename = "hover_changed")]
    HoverChanged { joint: String, hovered: bool },
    #[serde(rename = "transition_completed")]
    TransitionCompleted,
    #[serde(rename = "publish")]
    Publish {
        topic: String,
        payload: serde_json::Value,
    },
    #[serde(rename = "pong")]
    Pong,
}

impl From<ArmEvent> for WsMessage {
    fn from(event: ArmEvent) -> Self {
        match event {
            ArmEvent::JointMoved { joint, display_deg } => WsMessage::JointMoved {
                joint: joint.as_str().to_string(),
                angle: display_deg,
            },
            ArmEvent::HoverChanged { joint, hovered } => WsMessage::HoverChanged {
                joint: joint.as_str().to_string(),
                hovered,
            },
            ArmEvent::TransitionCompleted => WsMessage::TransitionCompleted,
            ArmEvent::Published { topic, payload } => WsMessage::Publish {
                topic,
                payload: serde_json::from_str(&payload)
                    .unwrap_or(serde_json::Value::String(payload)),
            },
        }
    }
}

/// WebSocket upgrade handler
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut events = state.subscribe();

    info!("WebSocket client connected");

    // Send the full joint table on connect so the control surface can build
    // its sliders before any event arrives.
    let joints = state.joint_infos().await;
    if let Ok(json) = serde_json::to_string(&WsMessage::Joints(joints)) {
        if sender.send(Message::Text(json.into())).await.is_err() {
            return;
        }
    }

    loop {
        tokio::select! {
            // Forward arm events to the client
            event = events.recv() => {
                match event {
                    Ok(event) => {
                        let msg = WsMessage::from(event);
                        if let Ok(json) = serde_json::to_string(&msg) {
                            if sender.send(Message::Text(json.into())).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        debug!(skipped = n, "Event channel lagged");
                        // Continue - lagging is not fatal
                    }
                    Err(e) => {
                        debug!(error = %e, "Event channel error");
                        break;
                    }
                }
            }

            // Handle incoming frames from the client
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Text(text))) => {
                        if text.as_str() == "ping" {
                            if let Ok(pong) = serde_json::to_string(&WsMessage::Pong) {
                                if sender.send(Message::Text(pong.into())).await.is_err() {
                                    break;
                                }
                            }
                        } else {
                            // Anything else is a broker command payload
                            state.handle_command_payload(text.as_str()).await;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    info!("WebSocket client disconnected");
}
