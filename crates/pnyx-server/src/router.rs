//! Request routing and path matching.
//!
//! Routes are matched on method plus path template. Templates use
//! `{name}` segments whose values are handed to the endpoint through
//! [`RequestContext::path_param`]. Empty segments are ignored on both sides,
//! so `/users/` and `/users` match the same route.
//!
//! Anything that matches no route gets the plaintext
//! `404 page not found` response, outside the envelope pipeline.
//!
//! # Example
//!
//! ```rust
//! use http::{Method, StatusCode, Uri};
//! use pnyx_core::HandlerResult;
//! use pnyx_extract::RequestContext;
//! use pnyx_server::Router;
//!
//! fn get_user(ctx: &RequestContext) -> HandlerResult<String> {
//!     Ok(format!("user {}", ctx.path_param("id").unwrap_or_default()))
//! }
//!
//! let mut router = Router::with_prefix("/api");
//! router.register(Method::GET, "/users/{id}", get_user);
//!
//! let ctx = RequestContext::builder()
//!     .uri(Uri::from_static("/api/users/9"))
//!     .build();
//! let response = router.dispatch(ctx);
//!
//! assert_eq!(response.status(), StatusCode::OK);
//! assert_eq!(response.body().as_ref(), b"{\"success\":true,\"data\":\"user 9\"}\n");
//! ```

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::{header, HeaderValue, Method, Response, StatusCode};
use pnyx_core::{adapt, HandlerResult};
use pnyx_extract::{EnvelopeEncoder, PathParams, RequestContext};
use serde::Serialize;

/// Body of the not-found fallback.
pub const NOT_FOUND_BODY: &str = "404 page not found";

/// A composed endpoint: encoder after adapter after business logic.
pub type BoxedEndpoint = Arc<dyn Fn(&RequestContext) -> Response<Bytes> + Send + Sync>;

/// A segment of a path template.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    Literal(String),
    Param(String),
}

fn parse_segments(pattern: &str) -> Vec<PathSegment> {
    pattern
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| match s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(name) => PathSegment::Param(name.to_string()),
            None => PathSegment::Literal(s.to_string()),
        })
        .collect()
}

struct Route {
    method: Method,
    pattern: String,
    segments: Vec<PathSegment>,
    endpoint: BoxedEndpoint,
}

impl Route {
    fn match_path(&self, path: &str) -> Option<PathParams> {
        let mut actual = path.split('/').filter(|s| !s.is_empty());
        let mut params = PathParams::new();

        for segment in &self.segments {
            let value = actual.next()?;
            match segment {
                PathSegment::Literal(expected) if expected == value => {}
                PathSegment::Literal(_) => return None,
                PathSegment::Param(name) => params.push(name.clone(), value),
            }
        }

        actual.next().is_none().then_some(params)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

/// Wraps business logic into an endpoint: adapt, then negotiate and encode.
pub(crate) fn compose<T, H>(handler: H) -> BoxedEndpoint
where
    T: Serialize + 'static,
    H: Fn(&RequestContext) -> HandlerResult<T> + Send + Sync + 'static,
{
    Arc::new(move |ctx: &RequestContext| {
        let envelope = adapt(|| handler(ctx));
        EnvelopeEncoder::from_query(ctx.query()).encode(&envelope)
    })
}

/// Joins a prefix and a path template with exactly one `/` between them.
pub(crate) fn join_path(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{prefix}/{path}")
}

/// Method and path router holding composed endpoints.
#[derive(Debug, Default)]
pub struct Router {
    prefix: String,
    routes: Vec<Route>,
}

impl Router {
    /// Creates a router without a prefix.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a router that prepends `prefix` to every registered path.
    #[must_use]
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            routes: Vec::new(),
        }
    }

    /// Returns the path prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Binds `handler` to `method` and `path` (relative to the prefix).
    ///
    /// The handler runs through [`adapt`] and its envelope is written with
    /// the encoder negotiated from the request's query string.
    pub fn register<T, H>(&mut self, method: Method, path: &str, handler: H) -> &mut Self
    where
        T: Serialize + 'static,
        H: Fn(&RequestContext) -> HandlerResult<T> + Send + Sync + 'static,
    {
        let full = join_path(&self.prefix, path);
        self.add_endpoint(method, &full, compose(handler))
    }

    /// Adds an already composed endpoint at an absolute path.
    pub fn add_endpoint(
        &mut self,
        method: Method,
        pattern: &str,
        endpoint: BoxedEndpoint,
    ) -> &mut Self {
        tracing::debug!(%method, pattern, "route registered");
        self.routes.push(Route {
            method,
            pattern: pattern.to_string(),
            segments: parse_segments(pattern),
            endpoint,
        });
        self
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if some route matches `method` and `path`.
    #[must_use]
    pub fn has_route(&self, method: &Method, path: &str) -> bool {
        self.find(method, path).is_some()
    }

    fn find(&self, method: &Method, path: &str) -> Option<(&Route, PathParams)> {
        self.routes
            .iter()
            .filter(|route| route.method == *method)
            .find_map(|route| route.match_path(path).map(|params| (route, params)))
    }

    /// Routes `ctx` to its endpoint, or answers with the not-found fallback.
    ///
    /// Routes are tried in registration order.
    pub fn dispatch(&self, mut ctx: RequestContext) -> Response<Bytes> {
        match self.find(ctx.method(), ctx.path()) {
            Some((route, params)) => {
                ctx.set_path_params(params);
                (route.endpoint)(&ctx)
            }
            None => not_found(),
        }
    }
}

/// The plaintext fallback for unmatched requests.
#[must_use]
pub fn not_found() -> Response<Bytes> {
    let mut response = Response::new(Bytes::from_static(NOT_FOUND_BODY.as_bytes()));
    *response.status_mut() = StatusCode::NOT_FOUND;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response.headers_mut().insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    response
}
