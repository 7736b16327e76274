//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub broadcast: BroadcastConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP / WebSocket listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:3000".to_string(),
        "https://localhost:3000".to_string(),
        "https://127.0.0.1:3000".to_string(),
    ]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
        }
    }
}

impl ServerConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Sample production and fanout throttling
#[derive(Debug, Clone, Deserialize)]
pub struct BroadcastConfig {
    /// Period of the production loop
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,

    /// Minimum spacing between two admitted broadcasts
    #[serde(default = "default_min_interval")]
    pub min_interval_ms: u64,
}

fn default_tick_interval() -> u64 {
    1000
}

fn default_min_interval() -> u64 {
    500
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval(),
            min_interval_ms: default_min_interval(),
        }
    }
}

impl BroadcastConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults plus overrides read through `lookup`, validated
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Config::default();
        config.apply_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// First config file found in the default search locations
    pub fn default_path() -> Option<PathBuf> {
        [
            dirs::config_dir().map(|p| p.join("pulsecast").join("config.toml")),
            Some(PathBuf::from("/etc/pulsecast/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ]
        .into_iter()
        .flatten()
        .find(|path| path.exists())
    }

    /// Load from the default location, or from the environment if no file exists
    ///
    /// A file that exists but fails to load is an error, not a silent fallback.
    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) => Self::load_with_env(&path),
            None => Self::from_env(),
        }
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.broadcast.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "broadcast.tick_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply `PULSECAST_*` overrides read through `lookup`
    fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(host) = lookup("PULSECAST_HOST") {
            self.server.host = host;
        }
        if let Some(port) = parse_override(&lookup, "PULSECAST_PORT")? {
            self.server.port = port;
        }

        if let Some(ms) = parse_override(&lookup, "PULSECAST_TICK_INTERVAL_MS")? {
            self.broadcast.tick_interval_ms = ms;
        }
        if let Some(ms) = parse_override(&lookup, "PULSECAST_MIN_INTERVAL_MS")? {
            self.broadcast.min_interval_ms = ms;
        }

        if let Some(level) = lookup("PULSECAST_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("PULSECAST_LOG_FORMAT") {
            self.logging.format = format;
        }
        Ok(())
    }
}

fn parse_override<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid(format!("{key}={raw:?} is not a valid value"))),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Pulsecast Configuration
#
# Environment variables override these settings:
# - PULSECAST_HOST
# - PULSECAST_PORT
# - PULSECAST_TICK_INTERVAL_MS
# - PULSECAST_MIN_INTERVAL_MS
# - PULSECAST_LOG_LEVEL
# - PULSECAST_LOG_FORMAT

[server]
# Listener host
host = "0.0.0.0"

# Listener port
port = 8000

# Origins allowed to open the WebSocket
cors_origins = [
    "http://localhost:3000",
    "http://127.0.0.1:3000",
    "https://localhost:3000",
    "https://127.0.0.1:3000",
]

[broadcast]
# How often a sample is produced (ms)
tick_interval_ms = 1000

# Broadcasts closer together than this are dropped (ms)
min_interval_ms = 500

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
