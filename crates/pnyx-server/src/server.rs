//! HTTP server built on Hyper and Tokio.
//!
//! The server accepts connections on the configured address, spawns one
//! task per connection and serves HTTP/1.1. Each request body is collected,
//! wrapped in a [`RequestContext`] and dispatched synchronously through the
//! [`Router`]. Every response carries an `x-request-id` header and produces
//! one access log event.
//!
//! # Example
//!
//! ```rust,no_run
//! use http::Method;
//! use pnyx_server::{Router, Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), pnyx_server::ServerError> {
//!     let mut router = Router::with_prefix("/api");
//!     router.register(Method::GET, "/ping", |_| Ok("pong"));
//!
//!     let config = ServerConfig::builder().http_addr("127.0.0.1:8080").build();
//!     Server::new(config, router).run().await
//! }
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::{header, HeaderValue, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use pnyx_core::{RequestId, REQUEST_ID_HEADER};
use pnyx_extract::RequestContext;
use tokio::net::{TcpListener, TcpStream};

use crate::access_log::AccessRecord;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::router::Router;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// The Pnyx HTTP server.
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    router: Router,
}

impl Server {
    /// Creates a server serving `router`.
    #[must_use]
    pub fn new(config: ServerConfig, router: Router) -> Self {
        Self { config, router }
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the router.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Runs until SIGTERM or SIGINT, then shuts down gracefully.
    pub async fn run(self) -> Result<(), ServerError> {
        let shutdown = ShutdownSignal::with_os_signals();
        self.run_with_shutdown(shutdown).await
    }

    /// Binds the configured address and serves until `shutdown` triggers.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = self
            .config
            .socket_addr()
            .map_err(|source| ServerError::InvalidAddress {
                addr: self.config.http_addr().to_string(),
                source,
            })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        self.serve(listener, shutdown).await;
        Ok(())
    }

    /// Serves connections from an already bound listener.
    ///
    /// After `shutdown` triggers, no new connections are accepted and open
    /// ones get up to the configured shutdown timeout to finish.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownSignal) {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(%addr, prefix = self.router.prefix(), "server listening");
        }

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                result = listener.accept() => match result {
                    Ok((stream, remote_addr)) => {
                        let server = Arc::clone(&server);
                        let token = tracker.acquire();
                        let shutdown = shutdown.clone();

                        tokio::spawn(async move {
                            if let Err(err) =
                                server.serve_connection(stream, remote_addr, shutdown).await
                            {
                                tracing::debug!(%remote_addr, error = %err, "connection error");
                            }
                            drop(token);
                        });
                    }
                    Err(err) => tracing::error!(error = %err, "failed to accept connection"),
                },
                () = shutdown.recv() => {
                    tracing::info!("shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }
        drop(listener);

        let timeout = server.config.shutdown_timeout();
        tracing::info!(
            active = tracker.active_connections(),
            ?timeout,
            "waiting for open connections"
        );

        tokio::select! {
            () = tracker.wait_idle() => tracing::info!("all connections closed"),
            () = tokio::time::sleep(timeout) => tracing::warn!(
                active = tracker.active_connections(),
                "shutdown timeout reached"
            ),
        }

        tracing::info!("server stopped");
    }

    async fn serve_connection(
        self: Arc<Self>,
        stream: TcpStream,
        remote_addr: SocketAddr,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let io = TokioIo::new(stream);
        let server = Arc::clone(&self);

        let service = service_fn(move |request: Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.handle_incoming(request, remote_addr).await) }
        });

        let conn = http1::Builder::new()
            .keep_alive(self.config.keep_alive())
            .serve_connection(io, service);
        tokio::pin!(conn);

        tokio::select! {
            result = conn.as_mut() => result,
            () = shutdown.recv() => {
                conn.as_mut().graceful_shutdown();
                conn.await
            }
        }
    }

    async fn handle_incoming(
        &self,
        request: Request<Incoming>,
        remote_addr: SocketAddr,
    ) -> Response<Full<Bytes>> {
        let (parts, body) = request.into_parts();

        let collected = tokio::time::timeout(self.config.body_timeout(), body.collect()).await;
        let response = match collected {
            Ok(Ok(collected)) => {
                let request = Request::from_parts(parts, collected.to_bytes());
                self.handle(request, Some(remote_addr))
            }
            Ok(Err(err)) => {
                tracing::warn!(%remote_addr, error = %err, "failed to read request body");
                plain_response(StatusCode::BAD_REQUEST, "400 bad request")
            }
            Err(_) => {
                tracing::warn!(%remote_addr, "request body timed out");
                plain_response(StatusCode::REQUEST_TIMEOUT, "408 request timeout")
            }
        };

        response.map(Full::new)
    }

    /// Handles one fully received request.
    ///
    /// Reuses a valid incoming `x-request-id`, otherwise generates one.
    pub fn handle(
        &self,
        request: Request<Bytes>,
        remote_addr: Option<SocketAddr>,
    ) -> Response<Bytes> {
        let (parts, body) = request.into_parts();

        let request_id = parts
            .headers
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<RequestId>().ok())
            .unwrap_or_default();

        let record = AccessRecord::start(
            request_id,
            parts.method.clone(),
            parts.uri.path(),
            remote_addr,
        );
        let span = tracing::info_span!(
            "request",
            request_id = %request_id,
            method = %parts.method,
            path = %parts.uri.path(),
        );

        let mut builder = RequestContext::builder()
            .request_id(request_id)
            .method(parts.method)
            .uri(parts.uri)
            .headers(parts.headers)
            .body(body);
        if let Some(addr) = remote_addr {
            builder = builder.remote_addr(addr);
        }

        let mut response = span.in_scope(|| self.router.dispatch(builder.build()));

        if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        record.finish(response.status());
        response
    }
}

fn plain_response(status: StatusCode, body: &'static str) -> Response<Bytes> {
    let mut response = Response::new(Bytes::from_static(body.as_bytes()));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
