//! `WebSocket` handler for real-time galaxy state streaming.
//!
//! Clients connect to `GET /ws/galaxy` (after the origin and token
//! gates) and immediately receive an `INIT_STATE` frame, followed by a
//! `GALAXY_STATE_UPDATE` frame every time the active event list is
//! published.
//!
//! The socket task drains the client's registry queue. When the task
//! ends, for whatever reason, its [`ClientHandle`] is dropped and the
//! client count goes down.
//!
//! [`ClientHandle`]: crate::registry::ClientHandle

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use tracing::{debug, warn};

use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// streaming galaxy state.
///
/// # Route
///
/// `GET /ws/galaxy`
pub async fn ws_galaxy(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Handle the `WebSocket` lifecycle: register, then forward queued
/// frames until either side goes away.
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    let (handle, mut rx) = match state.connect_client().await {
        Ok(registered) => registered,
        Err(e) => {
            warn!("Failed to register WebSocket client: {e}");
            return;
        }
    };
    debug!(client = %handle.id(), "WebSocket client connected");

    loop {
        tokio::select! {
            // Frame queued by a broadcast (or the initial snapshot).
            frame = rx.recv() => {
                let Some(payload) = frame else {
                    debug!(client = %handle.id(), "Client queue closed, shutting down WebSocket");
                    break;
                };
                if socket.send(Message::Text(payload)).await.is_err() {
                    debug!(client = %handle.id(), "WebSocket client disconnected (send failed)");
                    break;
                }
            }
            // Check if the client sent a close frame or disconnected.
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(client = %handle.id(), "WebSocket client disconnected");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!(client = %handle.id(), "WebSocket client disconnected (pong failed)");
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        debug!(client = %handle.id(), "WebSocket error: {e}");
                        break;
                    }
                    _ => {
                        // Clients have nothing to say; ignore text and binary frames.
                    }
                }
            }
        }
    }

    drop(handle);
}
