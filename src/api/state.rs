//! Application State
//!
//! Shared state accessible by all handlers and the production loop.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use crate::config::Config;
use crate::producer::{SampleSource, SimulatedMetrics};
use crate::websocket::{ConnectionHub, Dispatcher};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Registry of live WebSocket connections
    pub hub: Arc<ConnectionHub>,
    /// Rate-limited broadcaster over the hub
    pub dispatcher: Arc<Dispatcher>,
    /// Where samples come from
    pub source: Arc<dyn SampleSource>,
    /// Server configuration
    pub config: Arc<Config>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
    /// Cancelled once the server begins shutting down
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Create state with the simulated metrics source
    pub fn new(config: Config) -> Self {
        Self::with_source(config, Arc::new(SimulatedMetrics))
    }

    /// Create state with a custom sample source
    pub fn with_source(config: Config, source: Arc<dyn SampleSource>) -> Self {
        let hub = Arc::new(ConnectionHub::new());
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&hub),
            config.broadcast.min_interval(),
        ));

        Self {
            hub,
            dispatcher,
            source,
            config: Arc::new(config),
            start_time: Instant::now(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Get WebSocket connection count
    pub async fn connection_count(&self) -> usize {
        self.hub.len().await
    }
}
