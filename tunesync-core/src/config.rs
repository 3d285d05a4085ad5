//! Application configuration.
//!
//! A small TOML file controls how the shell reaches the backend service and
//! how aggressively the local clock ticks. Every field has a default; a
//! missing file or missing section behaves like the template below.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TunesyncConfig {
    pub backend: BackendConfig,
    pub sync: SyncConfig,
}

/// How to reach the external backend service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Backend host; the service only listens locally.
    pub host: String,
    /// Fixed local WebSocket port the backend listens on.
    pub port: u16,
    /// First reconnect delay after a dropped connection, milliseconds.
    pub reconnect_initial_ms: u64,
    /// Reconnect delay cap, milliseconds.
    pub reconnect_max_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6767,
            reconnect_initial_ms: 500,
            reconnect_max_ms: 30_000,
        }
    }
}

impl BackendConfig {
    /// WebSocket URL for the backend service.
    #[must_use]
    pub fn url(&self) -> String {
        format!("ws://{}:{}", self.host, self.port)
    }
}

/// Clock tick and optimistic-seek tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Highlight-cursor tick period while playing, milliseconds.
    pub tick_interval_ms: u64,
    /// A backend position within this many seconds of a pending seek target
    /// confirms the seek.
    pub seek_confirm_tolerance_secs: f64,
    /// An unconfirmed seek override expires after this long, milliseconds.
    pub seek_confirm_timeout_ms: i64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            seek_confirm_tolerance_secs: crate::clock::SEEK_CONFIRM_TOLERANCE_SECS,
            seek_confirm_timeout_ms: crate::clock::SEEK_CONFIRM_TIMEOUT_MS,
        }
    }
}

impl TunesyncConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Render this configuration as a TOML template, written on first run.
    pub fn to_template(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
