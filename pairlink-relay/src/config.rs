//! Configuration loading for pairlink-relay.
//!
//! Configuration is loaded from a TOML file (default: `relay.toml`).

use serde::Deserialize;
use std::path::PathBuf;

/// Root configuration for pairlink-relay.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Entity lifetime configuration.
    #[serde(default)]
    pub ttl: TtlConfig,
    /// Request and payload limits.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Sweeper task configuration.
    #[serde(default)]
    pub cleanup: CleanupConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the HTTP server (default: 0.0.0.0:3000).
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

/// Entity lifetime configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TtlConfig {
    /// Signaling session lifetime in seconds from creation (default: 600).
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,
    /// Relay channel idle lifetime in seconds (default: 600).
    #[serde(default = "default_channel_ttl")]
    pub channel_ttl_secs: u64,
    /// How long a retired PIN stays visible as a tombstone, so that
    /// resolving it reports `session_expired` rather than `pin_not_found`
    /// (default: 300).
    #[serde(default = "default_tombstone_grace")]
    pub tombstone_grace_secs: u64,
}

/// Request and payload limits.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Maximum size of a single relay chunk payload in bytes (default: 256 KiB).
    #[serde(default = "default_max_chunk_bytes")]
    pub max_chunk_bytes: usize,
    /// Maximum `totalChunks` a sender may declare (default: 4096).
    #[serde(default = "default_max_total_chunks")]
    pub max_total_chunks: u32,
    /// Maximum requests per minute per PIN (default: 120).
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,
    /// Maximum requests per second across all callers (default: 1000).
    #[serde(default = "default_global_requests_per_second")]
    pub global_requests_per_second: u32,
    /// Maximum attempts to find a free PIN before giving up (default: 100).
    #[serde(default = "default_max_pin_attempts")]
    pub max_pin_attempts: u32,
}

/// Sweeper task configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CleanupConfig {
    /// Sweep interval in seconds (default: 60).
    #[serde(default = "default_cleanup_interval")]
    pub interval_secs: u64,
    /// Enable the sweeper task (default: true).
    #[serde(default = "default_cleanup_enabled")]
    pub enabled: bool,
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_session_ttl() -> u64 {
    600 // 10 minutes
}

fn default_channel_ttl() -> u64 {
    600 // 10 minutes idle
}

fn default_tombstone_grace() -> u64 {
    300 // 5 minutes
}

fn default_max_chunk_bytes() -> usize {
    256 * 1024 // 256 KiB
}

fn default_max_total_chunks() -> u32 {
    4096
}

fn default_requests_per_minute() -> u32 {
    120
}

fn default_global_requests_per_second() -> u32 {
    1000
}

fn default_max_pin_attempts() -> u32 {
    100
}

fn default_cleanup_interval() -> u64 {
    60
}

fn default_cleanup_enabled() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

impl Default for TtlConfig {
    fn default() -> Self {
        Self {
            session_ttl_secs: default_session_ttl(),
            channel_ttl_secs: default_channel_ttl(),
            tombstone_grace_secs: default_tombstone_grace(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_chunk_bytes: default_max_chunk_bytes(),
            max_total_chunks: default_max_total_chunks(),
            requests_per_minute: default_requests_per_minute(),
            global_requests_per_second: default_global_requests_per_second(),
            max_pin_attempts: default_max_pin_attempts(),
        }
    }
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_cleanup_interval(),
            enabled: default_cleanup_enabled(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
}
