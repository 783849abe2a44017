//! Logging initialization for floorwatch
//!
//! Structured logging via tracing, configured from the logging section of
//! the application configuration.

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

/// Telemetry error types
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TelemetryError {
    /// Failed to initialize the tracing subscriber
    #[error("Failed to initialize tracing: {0}")]
    Init(String),
}

/// Initialize the global tracing subscriber
///
/// Must be called once at startup, before any log statements.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), TelemetryError> {
    let filter = tracing_subscriber::filter::LevelFilter::from_level(parse_level(&config.level));

    if config.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| TelemetryError::Init(e.to_string()))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| TelemetryError::Init(e.to_string()))?;
    }

    Ok(())
}

/// Parse a log level string, defaulting to INFO for unknown values
fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}
