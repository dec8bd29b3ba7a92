//! Node configuration.
//!
//! This module defines the transport binding and call settings of a node.

use std::time::Duration;

use serde::Deserialize;

/// Node transport and call settings.
#[derive(Debug, Deserialize, Clone)]
pub struct NodeSettings {
    /// UDP address to bind to, e.g. `0.0.0.0:7946`.
    pub listen_address: String,
    /// Maximum datagram size in bytes.
    pub max_datagram_size: usize,
    /// Per-call timeout in milliseconds; `0` waits without bound.
    #[serde(default)]
    pub call_timeout_ms: u64,
}

impl NodeSettings {
    /// The per-call timeout, or `None` when calls wait without bound.
    #[must_use]
    pub fn call_timeout(&self) -> Option<Duration> {
        (self.call_timeout_ms > 0).then(|| Duration::from_millis(self.call_timeout_ms))
    }
}
