//! Per-request access logging.
//!
//! One `tracing` event per request on the `pnyx::access` target, carrying
//! status, latency, peer address, method, path and request id as fields.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use http::{Method, StatusCode};
use pnyx_core::RequestId;

/// Tracing target for access log events.
pub const ACCESS_TARGET: &str = "pnyx::access";

/// Timing and identity of one request, logged when it completes.
#[derive(Debug, Clone)]
pub struct AccessRecord {
    request_id: RequestId,
    method: Method,
    path: String,
    remote_addr: Option<SocketAddr>,
    started: Instant,
}

impl AccessRecord {
    /// Starts timing a request.
    #[must_use]
    pub fn start(
        request_id: RequestId,
        method: Method,
        path: impl Into<String>,
        remote_addr: Option<SocketAddr>,
    ) -> Self {
        Self {
            request_id,
            method,
            path: path.into(),
            remote_addr,
            started: Instant::now(),
        }
    }

    /// Returns the time elapsed since [`start`](Self::start).
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Emits the access event for a response with `status`.
    pub fn finish(self, status: StatusCode) {
        let latency = self.elapsed();
        let client = self
            .remote_addr
            .map_or_else(|| "-".to_string(), |addr| addr.to_string());

        tracing::info!(
            target: ACCESS_TARGET,
            status = status.as_u16(),
            latency_us = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX),
            client = %client,
            method = %self.method,
            path = %self.path,
            request_id = %self.request_id,
            "{:>3} | {:>12?} | {:>21} | {:<7} {}",
            status.as_u16(),
            latency,
            client,
            self.method,
            self.path,
        );
    }
}
