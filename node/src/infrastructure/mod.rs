/// Configuration management for the node.
pub mod config;
/// Telemetry setup for logging.
pub mod telemetry;
