//! # Pnyx Extract
//!
//! Request-side reading and response-side writing for Pnyx endpoints.
//!
//! | Item | Purpose |
//! |------|---------|
//! | [`RequestContext`] | method, URI, headers, body, path and query parameters |
//! | [`QueryParams`] | typed query getters that raise `InvalidParameter` faults |
//! | [`remap`] | static lookup table with pass-through |
//! | [`EnvelopeEncoder`] | JSON/XML negotiation for [`ResponseEnvelope`](pnyx_core::ResponseEnvelope) |
//!
//! ## Example
//!
//! ```rust
//! use http::Uri;
//! use pnyx_core::{adapt, HandlerResult};
//! use pnyx_extract::{EnvelopeEncoder, RequestContext};
//!
//! fn list(ctx: &RequestContext) -> HandlerResult<Vec<i64>> {
//!     let limit = ctx.query().get_int_min_max("limit", 5, 1, 3)?;
//!     Ok((1..=limit).collect())
//! }
//!
//! let ctx = RequestContext::builder()
//!     .uri(Uri::from_static("/items?limit=50"))
//!     .build();
//!
//! let envelope = adapt(|| list(&ctx));
//! let response = EnvelopeEncoder::from_query(ctx.query()).encode(&envelope);
//! assert_eq!(response.body().as_ref(), b"{\"success\":true,\"data\":[1,2,3]}\n");
//! ```

#![doc(html_root_url = "https://docs.rs/pnyx-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
mod query;
pub mod response;

pub use context::{PathParams, RequestContext, RequestContextBuilder};
pub use error::EncodeError;
pub use query::{remap, QueryParams};
pub use response::{EnvelopeEncoder, Format};
