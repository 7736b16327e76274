//! # Pulsecast
//!
//! Real-time metrics fanout server. Clients connect over WebSocket and receive
//! a simulated metrics sample every tick, throttled so bursts of production
//! never flood them.
//!
//! ## Modules
//!
//! - [`websocket`]: Connection registry, rate-limited dispatcher, lifecycle handler
//! - [`producer`]: Periodic sample production
//! - [`api`]: Axum router, CORS and server lifecycle
//! - [`config`]: TOML / environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pulsecast::{serve, AppState, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default()?;
//!     let server = config.server.clone();
//!
//!     serve(AppState::new(config), &server).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod producer;
pub mod websocket;

pub use api::{build_router, serve, serve_on, ApiError, ApiResult, AppState};

pub use config::{BroadcastConfig, Config, ConfigError, LoggingConfig, ServerConfig};

pub use producer::{ProductionLoop, SampleSource, SimulatedMetrics};

pub use websocket::{
    websocket_handler, Connection, ConnectionError, ConnectionHandle, ConnectionHub,
    ConnectionId, Dispatcher, MetricsSample, RateGate,
};
