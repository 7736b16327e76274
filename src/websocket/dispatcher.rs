//! Broadcast Dispatcher
//!
//! Rate-limited fanout of a serialized payload to every registered connection.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::hub::ConnectionHub;

/// Minimum-interval throttle
///
/// Invocations inside the cooldown window are rejected outright; nothing is
/// queued for later delivery.
pub struct RateGate {
    min_interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl RateGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: Mutex::new(None),
        }
    }

    /// Admit the caller if the cooldown has elapsed
    ///
    /// The timestamp is recorded at admission, so the window is measured from
    /// invocation start rather than from the end of a slow fanout.
    pub async fn try_acquire(&self) -> bool {
        let now = Instant::now();
        let mut last = self.last.lock().await;

        match *last {
            Some(prev) if now.duration_since(prev) < self.min_interval => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

/// Rate-limited broadcaster over the connection hub
pub struct Dispatcher {
    hub: Arc<ConnectionHub>,
    gate: RateGate,
}

impl Dispatcher {
    pub fn new(hub: Arc<ConnectionHub>, min_interval: Duration) -> Self {
        Self {
            hub,
            gate: RateGate::new(min_interval),
        }
    }

    pub fn hub(&self) -> &Arc<ConnectionHub> {
        &self.hub
    }

    /// Send a payload to every connection registered at invocation time
    ///
    /// Connections that fail the write are deregistered; delivery to the rest
    /// continues. Nothing is reported back to the caller.
    pub async fn broadcast(&self, payload: &str) {
        if !self.gate.try_acquire().await {
            tracing::debug!(
                min_interval_ms = self.gate.min_interval().as_millis() as u64,
                "Broadcast dropped by rate gate"
            );
            return;
        }

        let recipients = self.hub.snapshot().await;
        let total = recipients.len();
        let mut failed = 0usize;

        for (id, connection) in recipients {
            if let Err(e) = connection.send_text(payload).await {
                tracing::warn!(connection_id = %id, error = %e, "Send failed, dropping connection");
                self.hub.remove(&id).await;
                failed += 1;
            }
        }

        tracing::debug!(recipients = total, failed, "Broadcast complete");
        tracing::trace!(payload = %payload, "Broadcast payload");
    }
}
