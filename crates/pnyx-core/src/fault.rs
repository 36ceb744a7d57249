//! Fault payloads and the raise primitive.
//!
//! A [`Fault`] aborts the current logical operation. Any function on the
//! handler's call path can return one through [`FaultResult`], and `?`
//! carries it up to the nearest [`RecoveryBlock`](crate::RecoveryBlock)
//! without further checks at intermediate call sites.
//!
//! # Example
//!
//! ```
//! use pnyx_core::{raise, FaultPayload, FaultResult};
//!
//! fn page_number(raw: &str) -> FaultResult<i64> {
//!     match raw.parse() {
//!         Ok(page) => Ok(page),
//!         Err(_) => raise(FaultPayload::invalid_parameter("page")),
//!     }
//! }
//!
//! let fault = page_number("abc").unwrap_err();
//! assert_eq!(fault.payload().parameter(), Some("page"));
//! ```

use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;

use thiserror::Error;

/// Result type alias using [`Fault`].
pub type FaultResult<T> = Result<T, Fault>;

/// The value carried by a raised fault.
///
/// The variant decides how the adapter classifies the fault into an
/// error response.
#[derive(Debug, Error)]
pub enum FaultPayload {
    /// A request parameter was present but could not be converted.
    #[error("invalid parameter: {parameter}")]
    InvalidParameter {
        /// Name of the offending parameter.
        parameter: String,
    },

    /// A plain diagnostic message.
    #[error("{0}")]
    Message(String),

    /// An existing error value.
    #[error("{0:#}")]
    Wrapped(anyhow::Error),

    /// Anything else, including panics intercepted at a recovery boundary.
    ///
    /// The detail is kept for diagnostics and never shown to clients.
    #[error("unknown fault: {0}")]
    Unknown(String),
}

impl FaultPayload {
    /// Creates an invalid parameter payload.
    #[must_use]
    pub fn invalid_parameter(parameter: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
        }
    }

    /// Returns the parameter name for [`FaultPayload::InvalidParameter`].
    #[must_use]
    pub fn parameter(&self) -> Option<&str> {
        match self {
            Self::InvalidParameter { parameter } => Some(parameter),
            _ => None,
        }
    }
}

impl From<&str> for FaultPayload {
    fn from(text: &str) -> Self {
        Self::Message(text.to_string())
    }
}

impl From<String> for FaultPayload {
    fn from(text: String) -> Self {
        Self::Message(text)
    }
}

impl From<anyhow::Error> for FaultPayload {
    fn from(error: anyhow::Error) -> Self {
        Self::Wrapped(error)
    }
}

/// Stack snapshot taken where a fault originated.
pub struct Trace {
    thread: String,
    frames: Backtrace,
}

impl Trace {
    /// Captures the current stack, regardless of `RUST_BACKTRACE`.
    #[inline(never)]
    #[must_use]
    pub fn capture() -> Self {
        let thread = std::thread::current()
            .name()
            .unwrap_or("<unnamed>")
            .to_string();
        Self {
            thread,
            frames: Backtrace::force_capture(),
        }
    }

    /// Returns the name of the thread the snapshot was taken on.
    #[must_use]
    pub fn thread(&self) -> &str {
        &self.thread
    }

    /// Returns `true` if frames were actually captured on this platform.
    #[must_use]
    pub fn is_captured(&self) -> bool {
        self.frames.status() == BacktraceStatus::Captured
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "fault backtrace (thread '{}'):", self.thread)?;
        write!(f, "{}", self.frames)
    }
}

impl fmt::Debug for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trace")
            .field("thread", &self.thread)
            .field("status", &self.frames.status())
            .finish_non_exhaustive()
    }
}

/// A raised fault: its payload plus the stack at the raise site.
#[derive(Debug, Error)]
#[error("{payload}")]
pub struct Fault {
    payload: FaultPayload,
    trace: Trace,
}

impl Fault {
    /// Captures a fault with the current stack.
    #[inline(never)]
    #[must_use]
    pub fn capture(payload: FaultPayload) -> Self {
        Self {
            payload,
            trace: Trace::capture(),
        }
    }

    pub(crate) fn with_trace(payload: FaultPayload, trace: Trace) -> Self {
        Self { payload, trace }
    }

    /// Creates an invalid parameter fault.
    #[must_use]
    pub fn invalid_parameter(parameter: impl Into<String>) -> Self {
        Self::capture(FaultPayload::invalid_parameter(parameter))
    }

    /// Creates a fault carrying a plain message.
    #[must_use]
    pub fn message(text: impl Into<String>) -> Self {
        Self::capture(FaultPayload::Message(text.into()))
    }

    /// Wraps an existing error value.
    #[must_use]
    pub fn wrap(error: impl Into<anyhow::Error>) -> Self {
        Self::capture(FaultPayload::Wrapped(error.into()))
    }

    /// Creates a fault the adapter will not recognise.
    #[must_use]
    pub fn unknown(detail: impl Into<String>) -> Self {
        Self::capture(FaultPayload::Unknown(detail.into()))
    }

    /// Returns the payload.
    #[must_use]
    pub fn payload(&self) -> &FaultPayload {
        &self.payload
    }

    /// Returns the stack snapshot taken at the raise site.
    #[must_use]
    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    /// Consumes the fault and returns its payload.
    #[must_use]
    pub fn into_payload(self) -> FaultPayload {
        self.payload
    }
}

impl From<anyhow::Error> for Fault {
    fn from(error: anyhow::Error) -> Self {
        Self::wrap(error)
    }
}

/// Aborts the current operation with `payload`.
///
/// Always returns `Err`; use it in tail position or follow it with `?`.
#[inline(never)]
pub fn raise<T>(payload: impl Into<FaultPayload>) -> FaultResult<T> {
    Err(Fault::capture(payload.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nested_raise(depth: usize) -> FaultResult<u32> {
        if depth == 0 {
            return raise("bottom reached");
        }
        let value = nested_raise(depth - 1)?;
        Ok(value + 1)
    }

    #[test]
    fn test_raise_is_always_err() {
        let result: FaultResult<()> = raise(FaultPayload::invalid_parameter("limit"));
        let fault = result.unwrap_err();
        assert_eq!(fault.payload().parameter(), Some("limit"));
    }

    #[test]
    fn test_raise_skips_remaining_statements() {
        let fault = nested_raise(5).unwrap_err();
        assert!(matches!(fault.payload(), FaultPayload::Message(m) if m == "bottom reached"));
    }

    #[test]
    fn test_payload_from_strings() {
        assert!(matches!(FaultPayload::from("oops"), FaultPayload::Message(_)));
        assert!(matches!(
            FaultPayload::from(String::from("oops")),
            FaultPayload::Message(_)
        ));
    }

    #[test]
    fn test_wrapped_display_includes_context() {
        let error = anyhow::anyhow!("connection refused").context("loading user");
        let fault = Fault::wrap(error);
        assert_eq!(fault.to_string(), "loading user: connection refused");
    }

    #[test]
    fn test_unknown_display() {
        let fault = Fault::unknown("index out of bounds");
        assert_eq!(fault.to_string(), "unknown fault: index out of bounds");
        assert!(fault.payload().parameter().is_none());
    }

    #[test]
    fn test_trace_header_names_thread() {
        let handle = std::thread::Builder::new()
            .name("fault-worker".into())
            .spawn(|| Fault::message("x").trace().to_string())
            .unwrap();
        let rendered = handle.join().unwrap();
        assert!(rendered.starts_with("fault backtrace (thread 'fault-worker'):\n"));
    }

    #[test]
    fn test_from_anyhow() {
        let fault: Fault = anyhow::anyhow!("disk full").into();
        assert!(matches!(fault.into_payload(), FaultPayload::Wrapped(_)));
    }
}
