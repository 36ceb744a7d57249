//! Error responses and the uniform response envelope.
//!
//! Every endpoint answers with a [`ResponseEnvelope`]:
//!
//! ```json
//! {"success":true,"data":{"id":1}}
//! {"success":false,"error":{"code":-2,"message":"Invalid Parameter: page"}}
//! ```
//!
//! `error` and `data` are omitted when absent, and the HTTP status of an
//! [`ErrorResponse`] never appears in the body.
//!
//! # Templates
//!
//! The two canonical errors are [`ErrorTemplate`] constants. A template is
//! plain `Copy` data; every use produces a fresh [`ErrorResponse`], so
//! concurrent requests never observe each other's messages.
//!
//! | Template | Code | Status | Base message |
//! |----------|------|--------|--------------|
//! | [`ErrorTemplate::INTERNAL_ERROR`] | -1 | 500 | `Internal error: ` |
//! | [`ErrorTemplate::INVALID_PARAMETER`] | -2 | 400 | (empty) |

use std::fmt;

use http::StatusCode;
use serde::{Deserialize, Serialize};

/// An error as reported to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Application error code.
    pub code: i32,

    /// Human-readable message.
    pub message: String,

    /// HTTP status for the transport layer; never serialized.
    #[serde(skip)]
    pub status: StatusCode,
}

impl ErrorResponse {
    /// Creates an error response.
    #[must_use]
    pub fn new(code: i32, message: impl Into<String>, status: StatusCode) -> Self {
        Self {
            code,
            message: message.into(),
            status,
        }
    }

    /// Creates an internal error whose message is the base text plus `detail`.
    #[must_use]
    pub fn internal(detail: impl fmt::Display) -> Self {
        ErrorTemplate::INTERNAL_ERROR.with_detail(detail)
    }

    /// Creates the invalid parameter error for `parameter`.
    #[must_use]
    pub fn invalid_parameter(parameter: &str) -> Self {
        ErrorTemplate::INVALID_PARAMETER.with_message(format!("Invalid Parameter: {parameter}"))
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// Immutable blueprint for an [`ErrorResponse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorTemplate {
    code: i32,
    message: &'static str,
    status: StatusCode,
}

impl ErrorTemplate {
    /// Catch-all for server-side faults.
    pub const INTERNAL_ERROR: Self =
        Self::new(-1, "Internal error: ", StatusCode::INTERNAL_SERVER_ERROR);

    /// A request parameter could not be converted.
    pub const INVALID_PARAMETER: Self = Self::new(-2, "", StatusCode::BAD_REQUEST);

    /// Creates a template.
    #[must_use]
    pub const fn new(code: i32, message: &'static str, status: StatusCode) -> Self {
        Self {
            code,
            message,
            status,
        }
    }

    /// Returns the error code.
    #[must_use]
    pub const fn code(&self) -> i32 {
        self.code
    }

    /// Returns the base message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        self.message
    }

    /// Returns the HTTP status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Produces a response carrying the base message unchanged.
    #[must_use]
    pub fn instantiate(&self) -> ErrorResponse {
        ErrorResponse::new(self.code, self.message, self.status)
    }

    /// Produces a response whose message is the base message followed by `detail`.
    #[must_use]
    pub fn with_detail(&self, detail: impl fmt::Display) -> ErrorResponse {
        ErrorResponse::new(self.code, format!("{}{detail}", self.message), self.status)
    }

    /// Produces a response with `message` in place of the base message.
    #[must_use]
    pub fn with_message(&self, message: impl Into<String>) -> ErrorResponse {
        ErrorResponse::new(self.code, message, self.status)
    }
}

/// The uniform success/error/data wrapper returned by every endpoint.
///
/// `success` is `true` exactly when `error` is absent. The constructors are
/// the only way to build an envelope, which keeps that invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope<T> {
    success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorResponse>,

    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

impl<T> ResponseEnvelope<T> {
    /// A successful envelope carrying `data`.
    #[must_use]
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            error: None,
            data: Some(data),
        }
    }

    /// A successful envelope with no data.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            success: true,
            error: None,
            data: None,
        }
    }

    /// A failed envelope. Failed envelopes never carry data.
    #[must_use]
    pub fn failure(error: ErrorResponse) -> Self {
        Self {
            success: false,
            error: Some(error),
            data: None,
        }
    }

    /// Builds an envelope from a handler outcome; an error discards any data.
    #[must_use]
    pub fn from_parts(data: Option<T>, error: Option<ErrorResponse>) -> Self {
        match error {
            Some(error) => Self::failure(error),
            None => Self {
                success: true,
                error: None,
                data,
            },
        }
    }

    /// Returns `true` if no error is present.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Returns the error, if any.
    #[must_use]
    pub fn error(&self) -> Option<&ErrorResponse> {
        self.error.as_ref()
    }

    /// Returns the data, if any.
    #[must_use]
    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    /// Consumes the envelope and returns the data, if any.
    #[must_use]
    pub fn into_data(self) -> Option<T> {
        self.data
    }

    /// The HTTP status this envelope should be sent with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.error.as_ref().map_or(StatusCode::OK, |error| error.status)
    }

    /// Swaps the data for `data`, keeping success/error untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ResponseEnvelope<U> {
        ResponseEnvelope {
            success: self.success,
            error: self.error,
            data: self.data.map(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_success_serialization_omits_error() {
        let envelope = ResponseEnvelope::success(json!({"id": 7}));
        let body = serde_json::to_string(&envelope).unwrap();
        assert_eq!(body, r#"{"success":true,"data":{"id":7}}"#);
    }

    #[test]
    fn test_failure_serialization_omits_data_and_status() {
        let envelope: ResponseEnvelope<u32> =
            ResponseEnvelope::failure(ErrorResponse::invalid_parameter("page"));
        let body = serde_json::to_string(&envelope).unwrap();
        assert_eq!(
            body,
            r#"{"success":false,"error":{"code":-2,"message":"Invalid Parameter: page"}}"#
        );
    }

    #[test]
    fn test_empty_envelope() {
        let envelope: ResponseEnvelope<()> = ResponseEnvelope::empty();
        assert_eq!(serde_json::to_string(&envelope).unwrap(), r#"{"success":true}"#);
        assert_eq!(envelope.status(), StatusCode::OK);
    }

    #[test]
    fn test_templates_produce_fresh_values() {
        let first = ErrorTemplate::INTERNAL_ERROR.with_detail("db down");
        let second = ErrorTemplate::INTERNAL_ERROR.with_detail("cache down");

        assert_eq!(first.message, "Internal error: db down");
        assert_eq!(second.message, "Internal error: cache down");
        assert_eq!(ErrorTemplate::INTERNAL_ERROR.message(), "Internal error: ");
        assert_eq!(ErrorTemplate::INTERNAL_ERROR.instantiate().message, "Internal error: ");
    }

    #[test]
    fn test_template_codes_and_statuses() {
        let internal = ErrorTemplate::INTERNAL_ERROR.instantiate();
        assert_eq!(internal.code, -1);
        assert_eq!(internal.status, StatusCode::INTERNAL_SERVER_ERROR);

        let invalid = ErrorTemplate::INVALID_PARAMETER.instantiate();
        assert_eq!(invalid.code, -2);
        assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
        assert_eq!(invalid.message, "");
    }

    #[test]
    fn test_from_parts_discards_data_on_error() {
        let envelope = ResponseEnvelope::from_parts(
            Some("payload"),
            Some(ErrorResponse::new(404, "missing", StatusCode::NOT_FOUND)),
        );
        assert!(!envelope.is_success());
        assert!(envelope.data().is_none());
        assert_eq!(envelope.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_deserialized_error_has_default_status() {
        let envelope: ResponseEnvelope<u8> = serde_json::from_str(
            r#"{"success":false,"error":{"code":-1,"message":"Internal error: "}}"#,
        )
        .unwrap();
        assert_eq!(envelope.error().unwrap().code, -1);
        assert_eq!(envelope.error().unwrap().status, StatusCode::OK);
    }

    #[test]
    fn test_error_display() {
        let error = ErrorResponse::invalid_parameter("limit");
        assert_eq!(error.to_string(), "[-2] Invalid Parameter: limit");
    }

    proptest! {
        #[test]
        fn prop_success_matches_error_absence(
            data in proptest::option::of(any::<i64>()),
            failed in any::<bool>(),
            detail in ".*",
        ) {
            let error = failed.then(|| ErrorResponse::internal(&detail));
            let envelope = ResponseEnvelope::from_parts(data, error);
            prop_assert_eq!(envelope.is_success(), envelope.error().is_none());

            let value = serde_json::to_value(&envelope).unwrap();
            prop_assert_eq!(value["success"].as_bool(), Some(!failed));
            prop_assert!(value.get("status").is_none());
        }
    }
}
