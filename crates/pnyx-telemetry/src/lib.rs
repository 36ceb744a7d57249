//! # Pnyx Telemetry
//!
//! Logging setup for Pnyx services.
//!
//! Every crate in the workspace reports through `tracing`; this crate
//! installs the subscriber that turns those events into lines on stderr,
//! in JSON for production or a readable format for development.
//!
//! | Target | Emitted by | Content |
//! |--------|-----------|---------|
//! | `pnyx::fault` | `pnyx-core` | classified message plus sanitised backtrace |
//! | `pnyx::access` | `pnyx-server` | status, latency, client, method, path |
//!
//! ```rust,no_run
//! use pnyx_telemetry::{init_logging, LogConfig, LogFormat};
//!
//! let config = LogConfig {
//!     format: LogFormat::Compact,
//!     ..LogConfig::production()
//! };
//! init_logging(&config)?;
//! # Ok::<(), pnyx_telemetry::TelemetryError>(())
//! ```

#![doc(html_root_url = "https://docs.rs/pnyx-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
