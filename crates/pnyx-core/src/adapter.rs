//! The business-logic adapter.
//!
//! [`adapt`] runs one endpoint's logic inside a [`RecoveryBlock`] and turns
//! whatever comes out of it into a [`ResponseEnvelope`]:
//!
//! | Outcome | Envelope error | Status |
//! |---------|----------------|--------|
//! | `Ok(data)` | absent | 200 |
//! | `Rejection::Responded(e)` | `e` as-is | `e.status` |
//! | `FaultPayload::InvalidParameter` | `-2`, `Invalid Parameter: <name>` | 400 |
//! | `FaultPayload::Message` | `-1`, base message + text | 500 |
//! | `FaultPayload::Wrapped` | `-1`, base message + error chain | 500 |
//! | `FaultPayload::Unknown`, panics | `-1`, base message only | 500 |
//!
//! Every intercepted fault is also reported through
//! [`diagnostics::report`](crate::diagnostics::report). Explicit
//! `Responded` rejections are ordinary answers and are not reported.

use thiserror::Error;

use crate::diagnostics;
use crate::fault::{Fault, FaultPayload};
use crate::recovery::RecoveryBlock;
use crate::response::{ErrorResponse, ErrorTemplate, ResponseEnvelope};

/// Result type returned by endpoint logic.
pub type HandlerResult<T> = Result<T, Rejection>;

/// Why an endpoint did not produce data.
#[derive(Debug, Error)]
pub enum Rejection {
    /// A fault raised somewhere on the handler's call path.
    #[error(transparent)]
    Raised(#[from] Fault),

    /// An error response chosen by the handler itself.
    #[error("responded with {0}")]
    Responded(ErrorResponse),
}

impl From<ErrorResponse> for Rejection {
    fn from(error: ErrorResponse) -> Self {
        Self::Responded(error)
    }
}

impl From<anyhow::Error> for Rejection {
    fn from(error: anyhow::Error) -> Self {
        Self::Raised(Fault::wrap(error))
    }
}

/// Maps a fault onto the error taxonomy.
///
/// Each call builds a fresh response from the immutable templates.
#[must_use]
pub fn classify(fault: &Fault) -> ErrorResponse {
    match fault.payload() {
        FaultPayload::InvalidParameter { parameter } => ErrorResponse::invalid_parameter(parameter),
        FaultPayload::Message(text) => ErrorTemplate::INTERNAL_ERROR.with_detail(text),
        FaultPayload::Wrapped(error) => {
            ErrorTemplate::INTERNAL_ERROR.with_detail(format_args!("{error:#}"))
        }
        FaultPayload::Unknown(_) => ErrorTemplate::INTERNAL_ERROR.instantiate(),
    }
}

/// Runs `handler` and converts its outcome into an envelope.
///
/// Never fails and never panics on behalf of `handler`: faults and panics
/// alike end up as a failure envelope.
///
/// Intercepted faults are reported through `tracing`, so install a
/// subscriber (`pnyx_telemetry::init_logging`) to see them on stderr.
///
/// # Example
///
/// ```
/// use pnyx_core::{adapt, raise, FaultPayload, HandlerResult};
///
/// fn lookup(page: &str) -> HandlerResult<u32> {
///     let page = page
///         .parse()
///         .or_else(|_| raise(FaultPayload::invalid_parameter("page")))?;
///     Ok(page)
/// }
///
/// let envelope = adapt(|| lookup("x"));
/// assert!(!envelope.is_success());
/// assert_eq!(envelope.error().unwrap().message, "Invalid Parameter: page");
/// assert_eq!(envelope.status().as_u16(), 400);
/// ```
pub fn adapt<T, F>(handler: F) -> ResponseEnvelope<T>
where
    F: FnOnce() -> HandlerResult<T>,
{
    RecoveryBlock::new(
        || match handler() {
            Ok(data) => Ok(ResponseEnvelope::success(data)),
            Err(Rejection::Responded(error)) => Ok(ResponseEnvelope::failure(error)),
            Err(Rejection::Raised(fault)) => Err(fault),
        },
        |fault| {
            let error = classify(&fault);
            diagnostics::report(&error.message, fault.trace());
            ResponseEnvelope::failure(error)
        },
    )
    .execute()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::{raise, FaultResult};
    use http::StatusCode;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl CapturedLog {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Runs `adapt` with a subscriber that records formatted events.
    fn adapt_logged<T>(
        handler: impl FnOnce() -> HandlerResult<T>,
    ) -> (ResponseEnvelope<T>, String) {
        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .without_time()
            .with_max_level(tracing::Level::TRACE)
            .finish();

        let envelope = tracing::subscriber::with_default(subscriber, || adapt(handler));
        (envelope, log.contents())
    }

    fn fault_records(log: &str) -> usize {
        log.matches(" pnyx::fault: ").count()
    }

    /// Line following the trace header, i.e. the first kept frame.
    fn first_frame(log: &str) -> &str {
        let header = log.find("fault backtrace (thread '").unwrap();
        log[header..].lines().nth(1).unwrap_or_default()
    }

    fn parse_page(raw: &str) -> FaultResult<i64> {
        raw.parse()
            .or_else(|_| raise(FaultPayload::invalid_parameter("page")))
    }

    fn deep(level: u8) -> FaultResult<u8> {
        if level == 0 {
            return raise("storage offline");
        }
        Ok(deep(level - 1)? + 1)
    }

    #[test]
    fn test_success_envelope() {
        let envelope = adapt(|| Ok(vec![1, 2, 3]));
        assert!(envelope.is_success());
        assert!(envelope.error().is_none());
        assert_eq!(envelope.data(), Some(&vec![1, 2, 3]));
        assert_eq!(envelope.status(), StatusCode::OK);
    }

    #[test]
    fn test_invalid_parameter_classification() {
        let envelope = adapt(|| Ok(parse_page("abc")?));
        let error = envelope.error().unwrap();

        assert!(!envelope.is_success());
        assert_eq!(error.code, -2);
        assert_eq!(error.message, "Invalid Parameter: page");
        assert_eq!(error.status, StatusCode::BAD_REQUEST);

        let body = serde_json::to_string(&envelope).unwrap();
        assert_eq!(
            body,
            r#"{"success":false,"error":{"code":-2,"message":"Invalid Parameter: page"}}"#
        );
    }

    #[test]
    fn test_message_fault_appends_text() {
        let envelope = adapt(|| Ok(deep(4)?));
        let error = envelope.error().unwrap();
        assert_eq!(error.code, -1);
        assert_eq!(error.message, "Internal error: storage offline");
        assert_eq!(error.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_wrapped_error_appends_description() {
        let envelope: ResponseEnvelope<()> = adapt(|| {
            let io = std::io::Error::new(std::io::ErrorKind::NotFound, "users.db missing");
            Err(Fault::wrap(io).into())
        });
        assert_eq!(
            envelope.error().unwrap().message,
            "Internal error: users.db missing"
        );
    }

    #[test]
    fn test_anyhow_rejection_is_wrapped() {
        let envelope: ResponseEnvelope<()> = adapt(|| {
            let error = anyhow::anyhow!("timeout").context("fetching quota");
            Err(Rejection::from(error))
        });
        assert_eq!(
            envelope.error().unwrap().message,
            "Internal error: fetching quota: timeout"
        );
    }

    #[test]
    fn test_unknown_fault_uses_base_message_only() {
        let envelope: ResponseEnvelope<()> = adapt(|| Err(Fault::unknown("opaque value").into()));
        let error = envelope.error().unwrap();
        assert_eq!(error.code, -1);
        assert_eq!(error.message, ErrorTemplate::INTERNAL_ERROR.message());
        assert_eq!(error.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_panic_becomes_internal_error() {
        let envelope: ResponseEnvelope<u8> = adapt(|| {
            let values: Option<u8> = None;
            Ok(values.unwrap())
        });
        let error = envelope.error().unwrap();
        assert_eq!(error.code, -1);
        assert_eq!(error.message, "Internal error: ");
        assert!(envelope.data().is_none());
    }

    #[test]
    fn test_explicit_error_response_takes_precedence() {
        let explicit = ErrorResponse::new(404, "user not found", StatusCode::NOT_FOUND);
        let envelope: ResponseEnvelope<String> = adapt(|| Err(explicit.clone().into()));

        assert_eq!(envelope.error(), Some(&explicit));
        assert_eq!(envelope.status(), StatusCode::NOT_FOUND);
        assert!(envelope.data().is_none());
    }

    #[test]
    fn test_messages_do_not_accumulate() {
        for detail in ["first", "second", "third"] {
            let envelope: ResponseEnvelope<()> = adapt(|| Err(Fault::message(detail).into()));
            assert_eq!(
                envelope.error().unwrap().message,
                format!("Internal error: {detail}")
            );
        }
        assert_eq!(ErrorTemplate::INTERNAL_ERROR.message(), "Internal error: ");
    }

    #[test]
    fn test_concurrent_classification_is_isolated() {
        let handles: Vec<_> = (0..8)
            .map(|index| {
                std::thread::spawn(move || {
                    let envelope: ResponseEnvelope<()> =
                        adapt(|| Err(Fault::message(format!("worker {index}")).into()));
                    envelope.error().unwrap().message.clone()
                })
            })
            .collect();

        for (index, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.join().unwrap(), format!("Internal error: worker {index}"));
        }
    }

    #[test]
    fn test_classify_is_pure() {
        let fault = Fault::invalid_parameter("limit");
        assert_eq!(classify(&fault), classify(&fault));
    }

    #[test]
    fn test_invalid_parameter_emits_one_fault_record() {
        let (envelope, log) = adapt_logged(|| Ok(parse_page("abc")?));
        assert!(!envelope.is_success());

        assert_eq!(fault_records(&log), 1, "{log}");
        assert!(
            log.contains("ERROR pnyx::fault: Invalid Parameter: page\nfault backtrace (thread '"),
            "{log}"
        );
        assert!(first_frame(&log).contains("pnyx_core::fault::"), "{log}");
        assert!(!log.contains("force_capture"), "{log}");
    }

    #[test]
    fn test_message_fault_record_carries_classified_message() {
        let (_, log) = adapt_logged(|| Ok(deep(3)?));

        assert_eq!(fault_records(&log), 1, "{log}");
        assert!(
            log.contains("ERROR pnyx::fault: Internal error: storage offline\nfault backtrace"),
            "{log}"
        );
        assert!(log.contains("deep"), "{log}");
    }

    #[test]
    fn test_panic_record_has_base_message_only() {
        let (envelope, log) = adapt_logged(|| {
            let values: Option<u8> = None;
            Ok(values.unwrap())
        });
        assert_eq!(envelope.error().unwrap().message, "Internal error: ");

        assert_eq!(fault_records(&log), 1, "{log}");
        assert!(
            log.contains("ERROR pnyx::fault: Internal error: \nfault backtrace"),
            "{log}"
        );
        assert!(!log.contains("on a `None` value"), "{log}");
        assert!(first_frame(&log).contains("panicking::"), "{log}");
        assert!(!log.contains("install_hook"), "{log}");
    }

    #[test]
    fn test_explicit_response_and_success_are_silent() {
        let explicit = ErrorResponse::new(404, "user not found", StatusCode::NOT_FOUND);
        let (envelope, log) = adapt_logged::<()>(|| Err(explicit.into()));
        assert_eq!(envelope.status(), StatusCode::NOT_FOUND);
        assert!(log.is_empty(), "{log}");

        let (envelope, log) = adapt_logged(|| Ok(7));
        assert!(envelope.is_success());
        assert!(log.is_empty(), "{log}");
    }
}
