//! Content-negotiating envelope encoder.
//!
//! The request's query string selects the wire format:
//!
//! | Query | Content-Type | Body |
//! |-------|--------------|------|
//! | (none), `format=json`, `format=<other>` | `application/json` | compact JSON + `\n` |
//! | `format=xml` | `application/xml` | compact XML, root `<response>` |
//! | `pretty` (any value, or none) | unchanged | same document, 4-space indentation |
//!
//! The status line comes from the envelope: the error's status when one is
//! present, `200 OK` otherwise.
//!
//! # Example
//!
//! ```rust
//! use pnyx_core::ResponseEnvelope;
//! use pnyx_extract::{EnvelopeEncoder, QueryParams};
//!
//! let query = QueryParams::parse("format=xml");
//! let response = EnvelopeEncoder::from_query(&query).encode(&ResponseEnvelope::success(5));
//!
//! assert_eq!(response.headers()["content-type"], "application/xml");
//! assert_eq!(
//!     response.body().as_ref(),
//!     b"<response><success>true</success><data>5</data></response>",
//! );
//! ```

use bytes::Bytes;
use http::{header, HeaderValue, Response, StatusCode};
use pnyx_core::{ErrorResponse, ResponseEnvelope};
use quick_xml::se::Serializer as XmlSerializer;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::error::EncodeError;
use crate::query::QueryParams;

/// Root element of XML envelopes.
pub const XML_ROOT: &str = "response";

const INDENT: &[u8] = b"    ";

/// Wire format of an encoded envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// `application/json`
    #[default]
    Json,
    /// `application/xml`
    Xml,
}

impl Format {
    /// Reads the `format` query parameter. Only an exact `xml` selects XML.
    #[must_use]
    pub fn from_query(query: &QueryParams) -> Self {
        match query.get("format") {
            Some("xml") => Self::Xml,
            _ => Self::Json,
        }
    }

    /// Returns the `Content-Type` for this format.
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Xml => "application/xml",
        }
    }
}

/// Serializes envelopes in a negotiated format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnvelopeEncoder {
    format: Format,
    pretty: bool,
}

impl EnvelopeEncoder {
    /// Creates an encoder for `format`.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self {
            format,
            pretty: false,
        }
    }

    /// Negotiates format and indentation from the query string.
    #[must_use]
    pub fn from_query(query: &QueryParams) -> Self {
        Self {
            format: Format::from_query(query),
            pretty: query.has("pretty"),
        }
    }

    /// Enables or disables indentation.
    #[must_use]
    pub const fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Returns the negotiated format.
    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    /// Returns `true` if output is indented.
    #[must_use]
    pub const fn is_pretty(&self) -> bool {
        self.pretty
    }

    /// Serializes `value` to bytes.
    pub fn to_bytes<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, EncodeError> {
        match self.format {
            Format::Json => self.to_json(value),
            Format::Xml => self.to_xml(value).map(String::into_bytes),
        }
    }

    fn to_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, EncodeError> {
        let mut out = Vec::with_capacity(128);
        if self.pretty {
            let formatter = PrettyFormatter::with_indent(INDENT);
            let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
            value.serialize(&mut serializer)?;
        } else {
            serde_json::to_writer(&mut out, value)?;
        }
        out.push(b'\n');
        Ok(out)
    }

    fn to_xml<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, EncodeError> {
        let mut out = String::with_capacity(128);
        let mut serializer =
            XmlSerializer::with_root(&mut out, Some(XML_ROOT)).map_err(EncodeError::xml)?;
        if self.pretty {
            serializer.indent(' ', INDENT.len());
        }
        value.serialize(serializer).map_err(EncodeError::xml)?;
        Ok(out)
    }

    /// Encodes `envelope` into a complete response.
    ///
    /// If the data cannot be represented in the negotiated format, an
    /// internal error envelope is sent instead with status 500.
    #[must_use]
    pub fn encode<T: Serialize>(&self, envelope: &ResponseEnvelope<T>) -> Response<Bytes> {
        match self.to_bytes(envelope) {
            Ok(body) => self.respond(envelope.status(), body),
            Err(err) => {
                tracing::error!(
                    error = %err,
                    format = ?self.format,
                    "failed to encode response envelope"
                );
                let fallback: ResponseEnvelope<()> =
                    ResponseEnvelope::failure(ErrorResponse::internal(&err));
                let body = self.to_bytes(&fallback).unwrap_or_default();
                self.respond(StatusCode::INTERNAL_SERVER_ERROR, body)
            }
        }
    }

    fn respond(&self, status: StatusCode, body: Vec<u8>) -> Response<Bytes> {
        let mut response = Response::new(Bytes::from(body));
        *response.status_mut() = status;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(self.format.content_type()),
        );
        response
    }
}
