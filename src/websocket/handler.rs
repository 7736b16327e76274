//! WebSocket Handler
//!
//! Handles WebSocket upgrade requests and manages the connection lifecycle.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::StreamExt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::connection::WsConnection;
use super::hub::ConnectionHub;
use crate::api::AppState;

/// WebSocket upgrade handler
///
/// This is the entry point for WebSocket connections.
/// It upgrades the HTTP connection to WebSocket and starts the lifecycle task.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    let hub = Arc::clone(&state.hub);
    let shutdown = state.shutdown.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, hub, shutdown))
}

/// Handle an established WebSocket connection
///
/// Registers the sending half with the hub, then idles on the receiving half
/// until the peer goes away or the server shuts down.
async fn handle_socket(socket: WebSocket, hub: Arc<ConnectionHub>, shutdown: CancellationToken) {
    let (sender, mut receiver) = socket.split();

    let connection_id = hub.add(Arc::new(WsConnection::new(sender))).await;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::debug!(connection_id = %connection_id, "Server shutting down");
                break;
            }
            frame = receiver.next() => match frame {
                Some(Ok(msg)) => {
                    if !keep_alive(&connection_id, msg) {
                        break;
                    }
                }
                Some(Err(e)) => {
                    tracing::debug!(
                        connection_id = %connection_id,
                        error = %e,
                        "WebSocket receive error"
                    );
                    break;
                }
                None => break,
            }
        }
    }

    // Broadcast may already have dropped us; removal is idempotent
    hub.remove(&connection_id).await;
}

/// Inspect an inbound frame
///
/// Returns false if the connection should be closed. Client payloads carry no
/// meaning for this server and are discarded.
fn keep_alive(connection_id: &str, message: Message) -> bool {
    match message {
        Message::Close(_) => {
            tracing::debug!(connection_id = %connection_id, "Client requested close");
            false
        }
        Message::Text(text) => {
            tracing::trace!(connection_id = %connection_id, len = text.len(), "Ignoring text frame");
            true
        }
        Message::Binary(data) => {
            tracing::trace!(connection_id = %connection_id, len = data.len(), "Ignoring binary frame");
            true
        }
        // Axum answers pings itself
        Message::Ping(_) | Message::Pong(_) => true,
    }
}
