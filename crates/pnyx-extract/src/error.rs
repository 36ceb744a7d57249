//! Encoding error types.

use thiserror::Error;

/// Error raised when an envelope cannot be serialized.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// JSON serialization failed.
    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    /// XML serialization failed.
    #[error("xml encoding failed: {0}")]
    Xml(String),
}

impl EncodeError {
    /// Wraps an XML serializer error.
    pub fn xml(error: impl std::fmt::Display) -> Self {
        Self::Xml(error.to_string())
    }
}
