//! Telemetry error types.

use thiserror::Error;

/// Errors that can occur while setting up telemetry.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The level or filter directive could not be parsed.
    #[error("invalid log filter '{filter}': {source}")]
    InvalidFilter {
        /// The rejected directive string.
        filter: String,
        /// Parse failure.
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },

    /// Failed to install the global subscriber.
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),
}
