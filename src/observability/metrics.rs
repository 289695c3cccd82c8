//! Metrics collection and exposition.
//!
//! # Metrics
//! - `preview_router_requests_total` (counter): requests by route, outcome, status
//! - `preview_router_request_duration_seconds` (histogram): latency by route
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   exporter every call is a no-op
//! - Outcome labels mirror the failure policy classes

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Which handler served the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    Health,
    PostAuth,
    Preview,
}

impl RouteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteKind::Health => "health",
            RouteKind::PostAuth => "post_auth",
            RouteKind::Preview => "preview",
        }
    }
}

/// How a request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Served,
    Proxied,
    Redirected,
    Fallback,
    RoutingError,
    BackendUnavailable,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Served => "served",
            Outcome::Proxied => "proxied",
            Outcome::Redirected => "redirected",
            Outcome::Fallback => "fallback",
            Outcome::RoutingError => "routing_error",
            Outcome::BackendUnavailable => "backend_unavailable",
        }
    }
}

/// Start the Prometheus scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Count a finished request without timing it.
pub fn record_outcome(route: RouteKind, outcome: Outcome, status: u16) {
    counter!(
        "preview_router_requests_total",
        "route" => route.as_str(),
        "outcome" => outcome.as_str(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record a finished request and its latency.
pub fn record_request(route: RouteKind, outcome: Outcome, status: u16, started: Instant) {
    record_outcome(route, outcome, status);

    histogram!(
        "preview_router_request_duration_seconds",
        "route" => route.as_str()
    )
    .record(started.elapsed().as_secs_f64());
}
