//! Outbound HTTP client shared by all proxied requests.
//!
//! # Responsibilities
//! - Own the bounded backend connection pool
//! - Enforce connect, response-header and body-frame deadlines
//! - Stream responses back without buffering
//!
//! # Design Decisions
//! - One pool for every preview backend; idle connections are capped per
//!   host and across all hosts
//! - The response-header deadline starts once the request body is fully
//!   sent; a slow upload is bounded by the body-frame deadline instead
//! - Dropping the returned future (client went away) drops the backend
//!   connection with it

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::{TokioExecutor, TokioTimer};
use tokio::sync::Notify;
use tower_http::timeout::TimeoutBody;

use crate::config::UpstreamConfig;
use crate::error::ProxyError;
use crate::resilience::timeouts::with_timeout;
use crate::security::headers::strip_hop_by_hop;
use crate::upstream::body::NotifyOnEnd;
use crate::upstream::connector::BoundedConnector;
use crate::upstream::dns::ServiceResolver;

pub type BackendClient = Client<BoundedConnector, Body>;

/// Forwards prepared requests to preview backends.
#[derive(Clone)]
pub struct ProxyEngine {
    client: BackendClient,
    response_header_timeout: Duration,
    body_timeout: Duration,
}

impl ProxyEngine {
    /// Build the engine and its connection pool.
    pub fn new(config: &UpstreamConfig) -> Self {
        let mut connector = HttpConnector::new_with_resolver(ServiceResolver::new(config.resolve_to));
        connector.set_connect_timeout(Some(config.connect_timeout()));
        connector.set_nodelay(true);
        let connector = BoundedConnector::new(connector, config.max_idle_connections);

        let client = Client::builder(TokioExecutor::new())
            .pool_max_idle_per_host(config.max_idle_per_host)
            .pool_idle_timeout(config.idle_timeout())
            .pool_timer(TokioTimer::new())
            .build(connector);

        tracing::debug!(
            max_idle_connections = config.max_idle_connections,
            max_idle_per_host = config.max_idle_per_host,
            idle_timeout_secs = config.idle_timeout_secs,
            connect_timeout_secs = config.connect_timeout_secs,
            response_header_timeout_secs = config.response_header_timeout_secs,
            fixed_resolution = ?config.resolve_to,
            "Upstream client ready"
        );

        Self {
            client,
            response_header_timeout: config.response_header_timeout(),
            body_timeout: config.body_timeout(),
        }
    }

    /// Send one request to its backend. No retries.
    ///
    /// Only transport failures are errors; any status the backend returns
    /// is handed back as-is.
    pub async fn forward(&self, request: Request<Body>) -> Result<Response<Body>, ProxyError> {
        let sent = Arc::new(Notify::new());
        let (parts, body) = request.into_parts();
        let body = Body::new(TimeoutBody::new(self.body_timeout, body));
        let request = Request::from_parts(parts, Body::new(NotifyOnEnd::new(body, Arc::clone(&sent))));

        let response = self.client.request(request);
        tokio::pin!(response);
        let response = tokio::select! {
            // Early responses and transport errors end the wait for the body.
            res = &mut response => res?,
            _ = sent.notified() => with_timeout(self.response_header_timeout, response).await?,
        };

        let (mut parts, body) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers);
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}
