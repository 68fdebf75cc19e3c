//! `WebSocket` streaming surface.
//!
//! Clients connect to `GET /api/v1/ws/swarm`. On connect the client is
//! admitted to the [`SubscriptionHub`](crate::hub::SubscriptionHub) and
//! immediately receives a `swarm_status` message; afterwards it receives
//! every `agent_status_batch` and `system` broadcast.
//!
//! The same socket accepts [`ClientCommand`]s. A command that succeeds is
//! announced to every subscriber with a `system` notice. A rejected
//! command, or a recognized action with a malformed body, is answered
//! with an `error` frame to the issuer only. Unrecognized input is logged
//! and ignored.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use resilience_types::{ClientCommand, ServerMessage};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::hub::Frame;
use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` subscriber connection.
///
/// # Route
///
/// `GET /api/v1/ws/swarm`
pub async fn ws_swarm(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Per-connection lifecycle: subscribe, pump frames both ways, unsubscribe.
async fn handle_ws(socket: WebSocket, state: AppState) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Frame>(state.subscriber_buffer);

    let initial = ServerMessage::swarm_status(state.orchestrator.snapshot().await);
    let id = match state.hub.subscribe(tx, &initial).await {
        Ok(id) => id,
        Err(e) => {
            warn!(error = %e, "Rejecting WebSocket subscriber");
            if let Ok(json) = serde_json::to_string(&ServerMessage::error(e.to_string())) {
                let _ = ws_tx.send(Message::Text(json.into())).await;
            }
            let _ = ws_tx.send(Message::Close(None)).await;
            return;
        }
    };

    loop {
        tokio::select! {
            () = state.shutdown.cancelled() => {
                let _ = ws_tx.send(Message::Close(None)).await;
                break;
            }

            // Frames from the hub. `None` means the hub dropped us.
            frame = rx.recv() => {
                let Some(frame) = frame else { break };
                if ws_tx.send(Message::Text(frame.to_string().into())).await.is_err() {
                    debug!(subscriber = %id, "WebSocket send failed");
                    break;
                }
            }

            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(reply) = handle_command(&state, text.as_str()).await {
                            let Ok(json) = serde_json::to_string(&reply) else { continue };
                            if ws_tx.send(Message::Text(json.into())).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if ws_tx.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        debug!(subscriber = %id, "WebSocket error: {e}");
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    state.hub.unsubscribe(id).await;
}

/// Apply one inbound channel command.
///
/// Returns a frame for the issuing subscriber when the command was
/// rejected or its body did not parse.
pub async fn handle_command(state: &AppState, text: &str) -> Option<ServerMessage> {
    let value: serde_json::Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Ignoring non-JSON channel input");
            return None;
        }
    };
    let action = value
        .get("action")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_owned();
    if !ClientCommand::ACTIONS.contains(&action.as_str()) {
        warn!(%action, "Ignoring unrecognized channel command");
        return None;
    }
    let command: ClientCommand = match serde_json::from_value(value) {
        Ok(command) => command,
        Err(e) => {
            warn!(%action, error = %e, "Malformed channel command");
            return Some(ServerMessage::error(format!("invalid {action} command: {e}")));
        }
    };
    info!(?command, "Channel command received");

    let outcome = match command {
        ClientCommand::ActivateSwarm => {
            let count = state.orchestrator.initialize_swarm().await;
            Ok(format!("Swarm activated - {count} agents initializing"))
        }
        ClientCommand::DeployAgents {
            disaster_type,
            location,
        } => state
            .orchestrator
            .deploy(&disaster_type, location)
            .await
            .map(|result| format!("Deployed {} agents", result.deployed_count)),
        ClientCommand::AgentAction {
            agent_id,
            action_type,
        } => state
            .orchestrator
            .apply_action(agent_id, action_type)
            .await
            .map(|agent| format!("Agent {} is now {}", agent.id, agent.status)),
    };

    match outcome {
        Ok(notice) => {
            announce(state, notice);
            None
        }
        Err(e) => {
            warn!(error = %e, "Channel command rejected");
            Some(ServerMessage::error(e.to_string()))
        }
    }
}

/// Broadcast a `system` notice without blocking the calling connection,
/// whose own sink is one of the recipients.
pub fn announce(state: &AppState, notice: String) {
    let hub = Arc::clone(&state.hub);
    tokio::spawn(async move {
        if let Err(e) = hub.broadcast(&ServerMessage::system(notice)).await {
            warn!(error = %e, "Failed to broadcast system notice");
        }
    });
}
