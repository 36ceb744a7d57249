//! # Pnyx
//!
//! **Uniform response envelopes and fault recovery for HTTP endpoints**
//!
//! Business logic returns data or raises a fault; Pnyx turns either into
//! the same envelope shape, negotiated as JSON or XML:
//!
//! ```text
//! {"success":true,"data":{...}}
//! {"success":false,"error":{"code":-2,"message":"Invalid Parameter: limit"}}
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! Request → Router → adapt(handler) → EnvelopeEncoder → Response
//!              │            │
//!              │            └─ fault or panic → classify → diagnostics (stderr)
//!              └─ no match → 404 page not found
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pnyx::prelude::*;
//!
//! fn list(ctx: &RequestContext) -> HandlerResult<Vec<i64>> {
//!     let limit = ctx.query().get_int_min_max("limit", 10, 1, 100)?;
//!     Ok((0..limit).collect())
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ServerError> {
//!     let mut router = Router::with_prefix("/api");
//!     router.register(Method::GET, "/numbers", list);
//!
//!     Server::new(ServerConfig::default(), router).run().await
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/pnyx/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export fault, adapter and envelope types
pub use pnyx_core as core;

// Re-export request context, extractors and the encoder
pub use pnyx_extract as extract;

// Re-export router and server types
pub use pnyx_server as server;

// Re-export logging setup
pub use pnyx_telemetry as telemetry;

// Re-export configuration types
pub use pnyx_config as config;

/// Prelude module for convenient imports.
///
/// ```rust
/// use pnyx::prelude::*;
///
/// fn ping(_: &RequestContext) -> HandlerResult<&'static str> {
///     Ok("pong")
/// }
///
/// let mut router = Router::new();
/// router.register(Method::GET, "/ping", ping);
/// assert!(router.has_route(&Method::GET, "/ping"));
/// ```
pub mod prelude {
    pub use http::{Method, StatusCode};

    pub use pnyx_core::{
        adapt, raise, ErrorResponse, ErrorTemplate, Fault, FaultPayload, FaultResult,
        HandlerResult, Rejection, RequestId, ResponseEnvelope,
    };

    pub use pnyx_extract::{remap, EnvelopeEncoder, Format, QueryParams, RequestContext};

    pub use pnyx_server::{
        RouteRegistrar, Router, Server, ServerConfig, ServerError, ShutdownSignal,
    };

    pub use pnyx_config::{ConfigLoader, PnyxConfig};

    pub use pnyx_telemetry::{init_logging, LogConfig};
}
