//! Prefix-scoped route registration.
//!
//! A [`RouteRegistrar`] binds endpoints under one path prefix of a shared
//! [`Router`], which lets several API versions live side by side:
//!
//! ```rust
//! use http::Method;
//! use pnyx_server::{RouteRegistrar, Router};
//!
//! let mut router = Router::new();
//!
//! RouteRegistrar::new(&mut router, "/v1").register(Method::GET, "/status", |_| Ok("v1"));
//! RouteRegistrar::new(&mut router, "/v2").register(Method::GET, "/status", |_| Ok("v2"));
//!
//! assert!(router.has_route(&Method::GET, "/v1/status"));
//! assert!(router.has_route(&Method::GET, "/v2/status"));
//! ```

use http::Method;
use pnyx_core::HandlerResult;
use pnyx_extract::RequestContext;
use serde::Serialize;

use crate::router::{compose, join_path, Router};

/// Registers routes on a [`Router`] under a fixed prefix.
#[derive(Debug)]
pub struct RouteRegistrar<'r> {
    router: &'r mut Router,
    prefix: String,
}

impl<'r> RouteRegistrar<'r> {
    /// Creates a registrar that prepends `prefix` (after the router's own).
    pub fn new(router: &'r mut Router, prefix: &str) -> Self {
        let prefix = join_path(router.prefix(), prefix);
        Self { router, prefix }
    }

    /// Returns the effective prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Binds `handler` under the prefix; see [`Router::register`].
    pub fn register<T, H>(&mut self, method: Method, path: &str, handler: H) -> &mut Self
    where
        T: Serialize + 'static,
        H: Fn(&RequestContext) -> HandlerResult<T> + Send + Sync + 'static,
    {
        let full = join_path(&self.prefix, path);
        self.router.add_endpoint(method, &full, compose(handler));
        self
    }
}
