//! # Pnyx Core
//!
//! Fault propagation and the response pipeline shared by every Pnyx
//! endpoint.
//!
//! - [`raise`] / [`Fault`] - abort the current operation with a typed payload
//! - [`RecoveryBlock`] - intercept a fault or panic exactly once
//! - [`adapt`] - run endpoint logic and classify its outcome
//! - [`ResponseEnvelope`] / [`ErrorResponse`] - the uniform response body
//! - [`RequestId`] - UUID v7 request identifier
//!
//! ```
//! use pnyx_core::{adapt, raise, FaultPayload, FaultResult, HandlerResult};
//!
//! fn check_limit(limit: i64) -> FaultResult<i64> {
//!     if limit < 0 {
//!         return raise(FaultPayload::invalid_parameter("limit"));
//!     }
//!     Ok(limit)
//! }
//!
//! fn endpoint() -> HandlerResult<Vec<i64>> {
//!     let limit = check_limit(-4)?;
//!     Ok((0..limit).collect())
//! }
//!
//! let envelope = adapt(endpoint);
//! assert_eq!(
//!     serde_json::to_string(&envelope).unwrap(),
//!     r#"{"success":false,"error":{"code":-2,"message":"Invalid Parameter: limit"}}"#,
//! );
//! ```

#![doc(html_root_url = "https://docs.rs/pnyx-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod adapter;
pub mod diagnostics;
mod fault;
mod recovery;
mod request_id;
mod response;

pub use adapter::{adapt, classify, HandlerResult, Rejection};
pub use fault::{raise, Fault, FaultPayload, FaultResult, Trace};
pub use recovery::RecoveryBlock;
pub use request_id::{RequestId, REQUEST_ID_HEADER};
pub use response::{ErrorResponse, ErrorTemplate, ResponseEnvelope};
