//! Connection Handles
//!
//! The registry only needs two capabilities from a live session: writing a
//! text frame and closing it. Both are expressed by the [`Connection`] trait so
//! the hub and dispatcher never depend on the transport directly.

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::SinkExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// Shared reference to a live connection
pub type ConnectionHandle = Arc<dyn Connection>;

/// Send capability of a live session
#[async_trait]
pub trait Connection: Send + Sync {
    /// Write one text frame
    async fn send_text(&self, payload: &str) -> Result<(), ConnectionError>;

    /// Close the session; errors are swallowed since the peer may already be gone
    async fn close(&self);
}

/// Errors raised while writing to a connection
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Transport error: {0}")]
    Transport(#[from] axum::Error),

    #[error("Connection closed")]
    Closed,
}

/// Sending half of an upgraded WebSocket
///
/// The sink sits behind its own mutex so writes to one peer never contend with
/// registry access or with writes to other peers.
pub struct WsConnection {
    sink: Mutex<SplitSink<WebSocket, Message>>,
    closed: AtomicBool,
}

impl WsConnection {
    pub fn new(sink: SplitSink<WebSocket, Message>) -> Self {
        Self {
            sink: Mutex::new(sink),
            closed: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Connection for WsConnection {
    async fn send_text(&self, payload: &str) -> Result<(), ConnectionError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ConnectionError::Closed);
        }
        let mut sink = self.sink.lock().await;
        sink.send(Message::Text(payload.to_owned())).await?;
        Ok(())
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut sink = self.sink.lock().await;
        if let Err(e) = sink.send(Message::Close(None)).await {
            tracing::debug!(error = %e, "Close frame not delivered");
        }
        let _ = sink.close().await;
    }
}
