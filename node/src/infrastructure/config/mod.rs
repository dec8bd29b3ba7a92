//! Configuration management for a QRP node.
//!
//! Settings are layered: built-in defaults first, then environment variables
//! prefixed with `QRP` and using `__` as the nesting separator
//! (e.g. `QRP__NODE__MAX_DATAGRAM_SIZE=1024`).
//!
//! # Example
//!
//! ```
//! use qrp_node::infrastructure::config::Settings;
//!
//! let settings = Settings::new().expect("Failed to load configuration");
//! assert!(settings.node.max_datagram_size > 0);
//! ```

pub mod node;
pub mod telemetry;

pub use node::NodeSettings;
pub use telemetry::TelemetrySettings;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment};
use serde::Deserialize;

use crate::DEFAULT_MAX_DATAGRAM_SIZE;

/// Top-level configuration for a node process.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Node transport and call settings.
    pub node: NodeSettings,
    /// Telemetry settings.
    pub telemetry: TelemetrySettings,
}

impl Settings {
    /// Loads settings from defaults and environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be built, deserialized,
    /// or fails validation.
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(Self::defaults()?.add_source(Environment::with_prefix("QRP").separator("__")))
    }

    /// Builder pre-populated with every default value.
    ///
    /// # Errors
    ///
    /// Returns an error if a default cannot be set.
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let max_datagram_size = u64::try_from(DEFAULT_MAX_DATAGRAM_SIZE)
            .map_err(|e| ConfigError::Message(e.to_string()))?;

        Config::builder()
            .set_default("node.listen_address", "0.0.0.0:7946")?
            .set_default("node.max_datagram_size", max_datagram_size)?
            .set_default("node.call_timeout_ms", 0)?
            .set_default("telemetry.service_name", "qrp-node")?
            .set_default("telemetry.log_level", "info")?
            .set_default("telemetry.json", true)
    }

    /// Builds, deserializes and validates settings from `builder`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be built, deserialized,
    /// or fails validation.
    pub fn load(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: Self = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks values the type system cannot.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Message` if the datagram size is zero or the
    /// listen address is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.node.max_datagram_size == 0 {
            return Err(ConfigError::Message(
                "node.max_datagram_size must be greater than zero".to_string(),
            ));
        }
        if self.node.listen_address.trim().is_empty() {
            return Err(ConfigError::Message(
                "node.listen_address cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
