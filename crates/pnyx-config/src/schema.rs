//! Configuration schema types.

use std::time::Duration;

use pnyx_server::{
    ServerConfig, DEFAULT_BODY_TIMEOUT_SECS, DEFAULT_HTTP_ADDR, DEFAULT_SHUTDOWN_TIMEOUT_SECS,
};
use pnyx_telemetry::{LogConfig, LogFormat};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Complete service configuration.
///
/// ```
/// use pnyx_config::PnyxConfig;
///
/// let config = PnyxConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct PnyxConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerSection,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSection,
}

impl PnyxConfig {
    /// Readable debug logs with source locations.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.ansi = true;
        config.logging.include_location = true;
        config
    }

    /// JSON logs at info level.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config.logging.ansi = false;
        config
    }

    /// Checks values that deserialize fine but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.http_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        if !self.server.route_prefix.is_empty() && !self.server.route_prefix.starts_with('/') {
            return Err(ConfigError::invalid_value(
                "server.route_prefix",
                "must be empty or start with '/'",
            ));
        }

        if self.server.shutdown_timeout_secs == 0 {
            return Err(ConfigError::invalid_value(
                "server.shutdown_timeout_secs",
                "must be greater than zero",
            ));
        }

        if self.server.body_timeout_secs == 0 {
            return Err(ConfigError::invalid_value(
                "server.body_timeout_secs",
                "must be greater than zero",
            ));
        }

        if let Err(err) = pnyx_telemetry::create_env_filter(&self.logging.level) {
            return Err(ConfigError::invalid_value("logging.level", err.to_string()));
        }

        Ok(())
    }
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Path prefix every route is registered under.
    #[serde(default = "default_route_prefix")]
    pub route_prefix: String,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Time allowed to receive a request body, in seconds.
    #[serde(default = "default_body_timeout")]
    pub body_timeout_secs: u64,

    /// HTTP/1.1 keep-alive.
    #[serde(default = "default_true")]
    pub keep_alive: bool,
}

impl ServerSection {
    /// Converts into the server's runtime configuration.
    #[must_use]
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig::builder()
            .http_addr(self.http_addr.clone())
            .shutdown_timeout(Duration::from_secs(self.shutdown_timeout_secs))
            .body_timeout(Duration::from_secs(self.body_timeout_secs))
            .keep_alive(self.keep_alive)
            .build()
    }
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            route_prefix: default_route_prefix(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            body_timeout_secs: default_body_timeout(),
            keep_alive: true,
        }
    }
}

fn default_http_addr() -> String {
    DEFAULT_HTTP_ADDR.to_string()
}

fn default_route_prefix() -> String {
    "/api".to_string()
}

fn default_shutdown_timeout() -> u64 {
    DEFAULT_SHUTDOWN_TIMEOUT_SECS
}

fn default_body_timeout() -> u64 {
    DEFAULT_BODY_TIMEOUT_SECS
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directives (trace, debug, info, warn, error, or per target).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include ANSI colour codes in output.
    #[serde(default)]
    pub ansi: bool,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl LoggingSection {
    /// Converts into the telemetry crate's logging configuration.
    #[must_use]
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            format: self.format,
            ansi: self.ansi,
            span_events: false,
            include_location: self.include_location,
            include_target: true,
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            ansi: false,
            include_location: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}
