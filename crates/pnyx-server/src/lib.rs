//! # Pnyx Server
//!
//! Route registration and the HTTP/1.1 server for Pnyx endpoints.
//!
//! - [`Router`] / [`RouteRegistrar`] - bind business logic under a path prefix
//! - [`Server`] - Hyper on Tokio, with graceful shutdown
//! - [`not_found`] - the plaintext fallback for unmatched requests
//! - [`AccessRecord`] - one access log event per request
//!
//! Every registered endpoint runs its logic through [`pnyx_core::adapt`]
//! and encodes the resulting envelope with
//! [`pnyx_extract::EnvelopeEncoder`], so handlers only return data or a
//! fault.

#![doc(html_root_url = "https://docs.rs/pnyx-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod access_log;
mod config;
mod error;
mod registrar;
mod router;
mod server;
mod shutdown;

pub use access_log::{AccessRecord, ACCESS_TARGET};
pub use config::{
    ServerConfig, ServerConfigBuilder, DEFAULT_BODY_TIMEOUT_SECS, DEFAULT_HTTP_ADDR,
    DEFAULT_SHUTDOWN_TIMEOUT_SECS,
};
pub use error::ServerError;
pub use registrar::RouteRegistrar;
pub use router::{not_found, BoxedEndpoint, Router, NOT_FOUND_BODY};
pub use server::Server;
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownSignal};
