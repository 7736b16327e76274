//! Pulsecast Server
//!
//! Run with: cargo run -- [--config path/to/config.toml]
//!
//! # Configuration
//!
//! Environment variables (override the config file):
//! - `PULSECAST_HOST`: Host to bind to (default: 0.0.0.0)
//! - `PULSECAST_PORT`: Port to listen on (default: 8000)
//! - `PULSECAST_TICK_INTERVAL_MS`: Sample period (default: 1000)
//! - `PULSECAST_MIN_INTERVAL_MS`: Minimum broadcast spacing (default: 500)
//! - `PULSECAST_LOG_LEVEL`, `PULSECAST_LOG_FORMAT`: Logging
//! - `RUST_LOG`: Takes precedence over the configured level

use clap::Parser;
use pulsecast::config::{generate_default_config, Config, LoggingConfig};
use pulsecast::{serve, AppState};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pulsecast")]
#[command(about = "Real-time metrics fanout over WebSocket", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the default configuration and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.print_config {
        print!("{}", generate_default_config());
        return Ok(());
    }

    let source = cli.config.or_else(Config::default_path);
    let config = match &source {
        Some(path) => Config::load_with_env(path)?,
        None => Config::from_env()?,
    };

    init_tracing(&config.logging);

    tracing::info!("Starting Pulsecast v{}", env!("CARGO_PKG_VERSION"));
    match &source {
        Some(path) => tracing::info!("Loaded config from {:?}", path),
        None => tracing::info!("Using default config with environment overrides"),
    }
    tracing::info!(
        tick_interval_ms = config.broadcast.tick_interval_ms,
        min_interval_ms = config.broadcast.min_interval_ms,
        origins = ?config.server.cors_origins,
        "Broadcast settings"
    );

    let server = config.server.clone();
    serve(AppState::new(config), &server).await?;

    tracing::info!("Pulsecast stopped");
    Ok(())
}

/// Install the global subscriber
fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("pulsecast={},tower_http=info", logging.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);

    if logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
