//! Pulsecast HTTP Layer
//!
//! Router, CORS policy and server lifecycle, built with Axum.
//!
//! # Endpoints
//!
//! ## WebSocket
//! - `GET /ws` - Metrics stream
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```rust,ignore
//! use pulsecast::api::{serve, AppState};
//! use pulsecast::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let server = config.server.clone();
//!     serve(AppState::new(config), &server).await?;
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{http::HeaderValue, routing::get, Router};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::producer::ProductionLoop;
use crate::websocket::websocket_handler;

/// Build the router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let shared_state = Arc::new(state);

    Router::new()
        .route("/ws", get(websocket_handler))
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

/// CORS policy allowing exactly the configured origins
///
/// Credentials are allowed, so methods and headers are mirrored from the
/// request instead of using wildcards.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

/// Start the server on the configured address
pub async fn serve(state: AppState, config: &ServerConfig) -> ApiResult<()> {
    let addr = config.addr();
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!("Pulsecast listening on {}", addr);

    serve_on(listener, state, shutdown_signal()).await
}

/// Run the server on an already bound listener until `signal` resolves
///
/// Shutdown order: stop the production loop, release the per-connection
/// tasks, then close every registered connection. Closing is bounded per peer,
/// so a client that stopped reading cannot stall teardown.
pub async fn serve_on<F>(listener: TcpListener, state: AppState, signal: F) -> ApiResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let producer_cancel = CancellationToken::new();
    let producer = Arc::new(ProductionLoop::new(
        Arc::clone(&state.dispatcher),
        Arc::clone(&state.source),
        state.config.broadcast.tick_interval(),
    ));
    let producer_task = producer.start(producer_cancel.clone());

    let teardown = {
        let producer_cancel = producer_cancel.clone();
        let hub = Arc::clone(&state.hub);
        let shutdown = state.shutdown.clone();
        async move {
            signal.await;
            producer_cancel.cancel();
            shutdown.cancel();
            hub.clear_all().await;
        }
    };

    let router = build_router(state.clone());
    let result = axum::serve(listener, router)
        .with_graceful_shutdown(teardown)
        .await;

    producer_cancel.cancel();
    state.shutdown.cancel();
    if let Err(e) = producer_task.await {
        tracing::error!(error = %e, "Production loop task failed");
    }

    result.map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Pulsecast shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
