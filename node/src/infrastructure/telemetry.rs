use anyhow::{Context, Result};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use super::config::TelemetrySettings;

/// Builder for setting up logging.
pub struct TelemetryBuilder {
    service_name: String,
    service_version: String,
    log_level: String,
    json: bool,
}

impl TelemetryBuilder {
    /// Creates a builder for `service_name` at `service_version`.
    pub fn new(service_name: impl Into<String>, service_version: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            service_version: service_version.into(),
            log_level: "info".to_string(),
            json: true,
        }
    }

    /// Creates a builder from configuration.
    #[must_use]
    pub fn from_settings(settings: &TelemetrySettings, service_version: impl Into<String>) -> Self {
        Self::new(settings.service_name.clone(), service_version)
            .with_log_level(settings.log_level.clone())
            .with_json(settings.json)
    }

    /// Sets the default filter used when `RUST_LOG` is unset.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Selects JSON or human-readable log lines.
    #[must_use]
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    /// Installs the global subscriber.
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber is already installed.
    pub fn init(self) -> Result<()> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.log_level));

        let fmt_layer = if self.json {
            fmt::layer().json().with_span_events(FmtSpan::CLOSE).boxed()
        } else {
            fmt::layer().with_target(true).boxed()
        };

        Registry::default()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .context("Failed to init subscriber")?;

        tracing::info!(
            service.name = %self.service_name,
            service.version = %self.service_version,
            "Telemetry initialized"
        );
        Ok(())
    }
}
