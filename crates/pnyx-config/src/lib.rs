//! Typed configuration for Pnyx services.
//!
//! - TOML and JSON configuration files
//! - `.env` files via `dotenvy`
//! - Environment variable overrides (`PREFIX__SECTION__KEY`)
//! - Strict parsing: unknown fields are errors
//!
//! # Example
//!
//! ```no_run
//! use pnyx_config::ConfigLoader;
//!
//! # fn main() -> Result<(), pnyx_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_file("pnyx.toml")?
//!     .with_env_prefix("PNYX")
//!     .load()?;
//!
//! println!("listening on {}{}", config.server.http_addr, config.server.route_prefix);
//! # Ok(())
//! # }
//! ```
//!
//! # File format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8080"
//! route_prefix = "/api"
//! shutdown_timeout_secs = 30
//! body_timeout_secs = 30
//! keep_alive = true
//!
//! [logging]
//! enabled = true
//! level = "info,pnyx::access=info"
//! format = "json"        # json | pretty | compact
//! ansi = false
//! include_location = false
//! ```

#![doc(html_root_url = "https://docs.rs/pnyx-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod loader;
mod schema;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{LoggingSection, PnyxConfig, ServerSection};
