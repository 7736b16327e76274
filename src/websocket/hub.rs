//! WebSocket Connection Hub
//!
//! Registry of every live connection. All structural edits go through a single
//! mutex that is held only for the edit itself; broadcast iterates a
//! point-in-time snapshot so churn during a long fanout never touches the
//! collection being walked.

use futures_util::future::join_all;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::connection::ConnectionHandle;

/// Upper bound on a single close handshake during `clear_all`
///
/// A peer that stopped reading can keep the close frame from ever flushing.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Unique identifier for a WebSocket connection
pub type ConnectionId = String;

/// Registry of live connections
#[derive(Default)]
pub struct ConnectionHub {
    /// Active connections: ConnectionId → ConnectionHandle
    connections: Mutex<HashMap<ConnectionId, ConnectionHandle>>,
}

impl ConnectionHub {
    /// Create an empty hub
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection and return its freshly generated ID
    pub async fn add(&self, handle: ConnectionHandle) -> ConnectionId {
        let id = Uuid::new_v4().to_string();
        self.connections.lock().await.insert(id.clone(), handle);

        tracing::info!(connection_id = %id, "WebSocket connected");
        id
    }

    /// Remove a connection if present
    ///
    /// Both the receive loop and the broadcast path may detect the same dead
    /// peer, so removing an unknown ID is a no-op. The removed handle is
    /// returned for callers that want to close it after the lock is released.
    pub async fn remove(&self, id: &str) -> Option<ConnectionHandle> {
        let handle = self.connections.lock().await.remove(id);

        if handle.is_some() {
            tracing::info!(connection_id = %id, "WebSocket disconnected");
        }
        handle
    }

    /// Point-in-time copy of all entries
    pub async fn snapshot(&self) -> Vec<(ConnectionId, ConnectionHandle)> {
        self.connections
            .lock()
            .await
            .iter()
            .map(|(id, handle)| (id.clone(), handle.clone()))
            .collect()
    }

    /// Remove and close every connection
    ///
    /// Closes run concurrently and each is bounded by [`CLOSE_TIMEOUT`], so a
    /// stalled peer cannot hold up the others or the caller.
    pub async fn clear_all(&self) {
        let entries = self.snapshot().await;

        let mut removed = Vec::with_capacity(entries.len());
        for (id, _) in entries {
            if let Some(handle) = self.remove(&id).await {
                removed.push((id, handle));
            }
        }
        let total = removed.len();

        let closes = removed.into_iter().map(|(id, handle)| async move {
            if tokio::time::timeout(CLOSE_TIMEOUT, handle.close()).await.is_err() {
                tracing::warn!(connection_id = %id, "Close timed out, dropping connection");
            }
        });
        join_all(closes).await;

        tracing::info!(closed = total, "All WebSocket connections cleared");
    }

    /// Check whether a connection is registered
    pub async fn contains(&self, id: &str) -> bool {
        self.connections.lock().await.contains_key(id)
    }

    /// Get the current connection count
    pub async fn len(&self) -> usize {
        self.connections.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
