//! Telemetry configuration for the node.
//!
//! This module defines logging settings.

use serde::Deserialize;

/// Telemetry configuration settings.
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetrySettings {
    /// Service name attached to log records.
    pub service_name: String,
    /// Default log filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable ones.
    #[serde(default = "default_json")]
    pub json: bool,
}

pub(super) fn default_log_level() -> String {
    "info".to_string()
}

pub(super) fn default_json() -> bool {
    true
}
