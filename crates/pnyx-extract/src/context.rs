//! Per-request context handed to endpoint logic.

use std::net::SocketAddr;

use bytes::Bytes;
use http::{HeaderMap, Method, Uri};
use pnyx_core::RequestId;

use crate::query::QueryParams;

/// Values captured from `{name}` segments of a route template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    inner: Vec<(String, String)>,
}

impl PathParams {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a captured value.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Returns the value captured for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns an iterator over the captured pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

/// Everything endpoint logic may read about the request.
///
/// The query string is decoded once when the context is built.
///
/// # Example
///
/// ```rust
/// use http::{Method, Uri};
/// use pnyx_extract::RequestContext;
///
/// let ctx = RequestContext::builder()
///     .method(Method::GET)
///     .uri(Uri::from_static("/users/7?fields=name"))
///     .path_param("id", "7")
///     .build();
///
/// assert_eq!(ctx.path_param("id"), Some("7"));
/// assert_eq!(ctx.query().get("fields"), Some("name"));
/// ```
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    path_params: PathParams,
    query: QueryParams,
    remote_addr: Option<SocketAddr>,
}

impl RequestContext {
    /// Starts building a context.
    #[must_use]
    pub fn builder() -> RequestContextBuilder {
        RequestContextBuilder::default()
    }

    /// Returns the request id.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the path portion of the URI.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as a string, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the request body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the decoded query parameters.
    #[must_use]
    pub fn query(&self) -> &QueryParams {
        &self.query
    }

    /// Returns all captured path parameters.
    #[must_use]
    pub fn path_params(&self) -> &PathParams {
        &self.path_params
    }

    /// Returns one captured path parameter.
    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name)
    }

    /// Replaces the captured path parameters.
    pub fn set_path_params(&mut self, params: PathParams) {
        self.path_params = params;
    }

    /// Returns the peer address, when known.
    #[must_use]
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }
}

/// Builder for [`RequestContext`].
#[derive(Debug, Default)]
pub struct RequestContextBuilder {
    request_id: Option<RequestId>,
    method: Option<Method>,
    uri: Option<Uri>,
    headers: HeaderMap,
    body: Bytes,
    path_params: PathParams,
    remote_addr: Option<SocketAddr>,
}

impl RequestContextBuilder {
    /// Sets the request id. A fresh one is generated otherwise.
    #[must_use]
    pub fn request_id(mut self, id: RequestId) -> Self {
        self.request_id = Some(id);
        self
    }

    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets the URI.
    #[must_use]
    pub fn uri(mut self, uri: Uri) -> Self {
        self.uri = Some(uri);
        self
    }

    /// Sets the headers.
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Adds a path parameter.
    #[must_use]
    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.push(name, value);
        self
    }

    /// Sets the peer address.
    #[must_use]
    pub fn remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    /// Builds the context, defaulting to `GET /`.
    #[must_use]
    pub fn build(self) -> RequestContext {
        let uri = self.uri.unwrap_or_else(|| Uri::from_static("/"));
        let query = QueryParams::parse(uri.query().unwrap_or(""));
        RequestContext {
            request_id: self.request_id.unwrap_or_default(),
            method: self.method.unwrap_or(Method::GET),
            uri,
            headers: self.headers,
            body: self.body,
            path_params: self.path_params,
            query,
            remote_addr: self.remote_addr,
        }
    }
}

/// Converts an incoming request into a context.
impl From<http::Request<Bytes>> for RequestContext {
    fn from(request: http::Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();
        RequestContext::builder()
            .method(parts.method)
            .uri(parts.uri)
            .headers(parts.headers)
            .body(body)
            .build()
    }
}
