//! Query parameter extractors.
//!
//! Every typed getter follows the same rules:
//!
//! - an absent parameter yields the caller's default and never faults
//! - a present parameter that does not convert raises
//!   [`FaultPayload::InvalidParameter`] with the parameter's name
//! - when a key repeats, the first value wins
//!
//! A key without a value (`?pretty`) counts as present with an empty value,
//! so `get_int` on it raises while `has` reports `true`.
//!
//! # Example
//!
//! ```rust
//! use pnyx_core::FaultResult;
//! use pnyx_extract::QueryParams;
//!
//! fn page_window(query: &QueryParams) -> FaultResult<(i64, i64)> {
//!     let page = query.get_int("page", 1)?;
//!     let limit = query.get_int_min_max("limit", 20, 1, 10)?;
//!     Ok((page, limit))
//! }
//!
//! let query = QueryParams::parse("page=3&limit=15");
//! assert_eq!(page_window(&query).unwrap(), (3, 10));
//!
//! let query = QueryParams::parse("page=three");
//! let fault = page_window(&query).unwrap_err();
//! assert_eq!(fault.payload().parameter(), Some("page"));
//! ```

use std::collections::HashMap;

use pnyx_core::{raise, FaultPayload, FaultResult};

/// Decoded query string pairs in their original order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a raw query string (without the leading `?`).
    ///
    /// Decoding is lenient: malformed percent escapes are kept as-is and
    /// empty segments are skipped, so parsing never fails.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let pairs = serde_urlencoded::from_str::<Vec<(String, String)>>(raw).unwrap_or_default();
        Self { pairs }
    }

    /// Appends a pair.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((name.into(), value.into()));
    }

    /// Returns the first value for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns every value for `name`, in order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns `true` if `name` occurs at all, with or without a value.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns `true` if no pairs were decoded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Returns the number of decoded pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Reads `name` as text, or `default` when absent.
    #[must_use]
    pub fn get_string(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or(default).to_string()
    }

    /// Reads `name` as a signed decimal integer.
    pub fn get_int(&self, name: &str, default: i64) -> FaultResult<i64> {
        match self.get(name) {
            None => Ok(default),
            Some(raw) => raw
                .parse()
                .or_else(|_| raise(FaultPayload::invalid_parameter(name))),
        }
    }

    /// Reads `name` as an integer and clamps it into `[min, max]`.
    ///
    /// The default is clamped too. When `min > max` the result is `max`.
    pub fn get_int_min_max(
        &self,
        name: &str,
        default: i64,
        min: i64,
        max: i64,
    ) -> FaultResult<i64> {
        let mut value = self.get_int(name, default)?;
        if value < min {
            value = min;
        }
        if value > max {
            value = max;
        }
        Ok(value)
    }

    /// Reads `name` as a boolean.
    ///
    /// Accepts `1`, `t`, `T`, `TRUE`, `true`, `True` and their negative
    /// counterparts `0`, `f`, `F`, `FALSE`, `false`, `False`.
    pub fn get_bool(&self, name: &str, default: bool) -> FaultResult<bool> {
        match self.get(name) {
            None => Ok(default),
            Some(raw) => match parse_bool(raw) {
                Some(value) => Ok(value),
                None => raise(FaultPayload::invalid_parameter(name)),
            },
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Maps `input` through `table`, returning `input` itself when unmapped.
///
/// ```rust
/// use std::collections::HashMap;
/// use pnyx_extract::remap;
///
/// let sort_columns = HashMap::from([("newest", "created_at"), ("name", "display_name")]);
/// assert_eq!(remap("newest", &sort_columns), "created_at");
/// assert_eq!(remap("karma", &sort_columns), "karma");
/// ```
#[must_use]
pub fn remap<'a>(input: &'a str, table: &HashMap<&str, &'a str>) -> &'a str {
    table.get(input).copied().unwrap_or(input)
}
