//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Serve HTTP/1.1 and HTTP/2 on each accepted connection
//! - Wire up middleware (tracing, request ID, handler timeout)
//! - Validate hosts and redirect targets before acting on them
//! - Forward preview requests to their backends
//! - Drain connections on shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderValue, Request, StatusCode, Uri},
    response::Response,
    routing::any,
    Router,
};
use hyper::body::Incoming;
use hyper_util::{
    rt::{TokioExecutor, TokioIo, TokioTimer},
    server::conn::auto,
    service::TowerToHyperService,
};
use tokio::sync::broadcast;
use tower::{ServiceBuilder, ServiceExt};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{RouterConfig, RoutingConfig};
use crate::http::request::{build_outbound, request_host, MakeRequestUuid, X_REQUEST_ID};
use crate::http::response::{found, Failure, FailurePolicy};
use crate::net::{ConnectionTracker, Listener, ListenerError};
use crate::observability::metrics::{self, Outcome, RouteKind};
use crate::routing::{resolve_target, validate_host, validate_redirect};
use crate::upstream::ProxyEngine;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routing: Arc<RoutingConfig>,
    pub policy: Arc<FailurePolicy>,
    pub engine: ProxyEngine,
}

/// HTTP server for the preview router.
pub struct HttpServer {
    router: Router,
    config: RouterConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: RouterConfig) -> Self {
        let state = AppState {
            routing: Arc::new(config.routing.clone()),
            policy: Arc::new(FailurePolicy::new(&config.routing)),
            engine: ProxyEngine::new(&config.upstream),
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RouterConfig, state: AppState) -> Router {
        Router::new()
            .route("/health", any(health_handler))
            .route("/post-auth", any(post_auth_handler))
            .fallback(preview_handler)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        config.server.request_timeout_secs,
                    ))),
            )
    }

    /// The router with all middleware, for driving requests directly.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Run the server until `shutdown` fires, then drain connections.
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ListenerError> {
        let addr = listener.local_addr().map_err(ListenerError::Bind)?;
        tracing::info!(address = %addr, "HTTP server starting");

        let tracker = ConnectionTracker::new();
        let (drain_tx, _) = broadcast::channel::<()>(1);
        let header_read_timeout = Duration::from_secs(self.config.server.header_read_timeout_secs);

        loop {
            let (stream, peer, permit) = tokio::select! {
                _ = shutdown.recv() => break,
                accepted = listener.accept() => match accepted {
                    Ok(conn) => conn,
                    Err(ListenerError::Accept(e)) => {
                        tracing::warn!(error = %e, "Accept failed");
                        continue;
                    }
                    Err(e) => return Err(e),
                },
            };

            let guard = tracker.track();
            let mut drain = drain_tx.subscribe();
            let app = self.router.clone().map_request(move |mut req: Request<Incoming>| {
                req.extensions_mut().insert(ConnectInfo(peer));
                req
            });

            tokio::spawn(async move {
                let _permit = permit;
                let mut builder = auto::Builder::new(TokioExecutor::new());
                builder
                    .http1()
                    .timer(TokioTimer::new())
                    .header_read_timeout(header_read_timeout);

                let conn = builder.serve_connection(TokioIo::new(stream), TowerToHyperService::new(app));
                tokio::pin!(conn);

                let mut draining = false;
                let result = loop {
                    tokio::select! {
                        res = conn.as_mut() => break res,
                        _ = drain.recv(), if !draining => {
                            draining = true;
                            conn.as_mut().graceful_shutdown();
                        }
                    }
                };
                if let Err(e) = result {
                    tracing::debug!(connection_id = %guard.id(), peer = %peer, error = %e, "Connection ended with error");
                }
            });
        }

        tracing::info!(active = tracker.active_count(), "Draining connections");
        let _ = drain_tx.send(());
        let deadline = Duration::from_secs(self.config.server.drain_secs);
        if !tracker.wait_for_drain(deadline).await {
            tracing::warn!(
                remaining = tracker.active_count(),
                "Drain deadline passed, abandoning connections"
            );
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Liveness check. Never touches a backend.
async fn health_handler() -> &'static str {
    metrics::record_outcome(RouteKind::Health, Outcome::Served, 200);
    "ok"
}

/// Redirect back into a preview environment after authentication.
async fn post_auth_handler(State(state): State<AppState>, uri: Uri) -> Response {
    let start_time = Instant::now();

    let next = uri.query().and_then(|query| {
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == "next")
            .map(|(_, value)| value.into_owned())
    });

    let Some(next) = next.filter(|n| !n.is_empty()) else {
        tracing::info!("post-auth: missing next parameter, redirecting to fallback");
        return reject_redirect(&state, start_time);
    };

    let target = match validate_redirect(&next, &state.routing) {
        Ok(target) => target,
        Err(reason) => {
            tracing::warn!(reason = %reason, "post-auth: rejected next parameter");
            return reject_redirect(&state, start_time);
        }
    };

    match HeaderValue::from_str(target) {
        Ok(location) => {
            tracing::info!(target_url = %target, "post-auth: redirecting to preview");
            metrics::record_request(RouteKind::PostAuth, Outcome::Redirected, 302, start_time);
            found(location)
        }
        Err(_) => reject_redirect(&state, start_time),
    }
}

fn reject_redirect(state: &AppState, start_time: Instant) -> Response {
    let failure = Failure::RedirectRejected;
    metrics::record_request(RouteKind::PostAuth, failure.outcome(), 302, start_time);
    state.policy.respond(failure)
}

/// Preview routing: validate host, resolve target, proxy.
async fn preview_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    let host = request_host(&request);

    let id = match validate_host(&host, &state.routing) {
        Ok(id) => id,
        Err(reason) => {
            tracing::info!(request_id = %request_id, reason = %reason, "route: rejected host, redirecting to fallback");
            let failure = Failure::HostRejected;
            metrics::record_request(RouteKind::Preview, failure.outcome(), 302, start_time);
            return state.policy.respond(failure);
        }
    };

    let target = match resolve_target(&id, &state.routing) {
        Ok(target) => target,
        Err(reason) => {
            tracing::error!(request_id = %request_id, sha = %id, reason = %reason, "route: target resolution failed");
            let failure = Failure::TargetUnresolvable;
            metrics::record_request(RouteKind::Preview, failure.outcome(), 500, start_time);
            return state.policy.respond(failure);
        }
    };

    let client_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let outbound = match build_outbound(request, &host, &target, client_ip) {
        Ok(outbound) => outbound,
        Err(e) => {
            tracing::error!(request_id = %request_id, sha = %id, error = %e, "route: could not build outbound request");
            let failure = Failure::TargetUnresolvable;
            metrics::record_request(RouteKind::Preview, failure.outcome(), 500, start_time);
            return state.policy.respond(failure);
        }
    };

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        host = %host,
        path = %path,
        target = %target.service_url,
        "route: proxying request"
    );

    match state.engine.forward(outbound).await {
        Ok(response) => {
            metrics::record_request(RouteKind::Preview, Outcome::Proxied, response.status().as_u16(), start_time);
            response
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, host = %host, sha = %id, error = %e, "proxy error");
            let failure = Failure::BackendUnavailable(&id);
            metrics::record_request(
                RouteKind::Preview,
                failure.outcome(),
                StatusCode::SERVICE_UNAVAILABLE.as_u16(),
                start_time,
            );
            state.policy.respond(failure)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    async fn send(server: &HttpServer, uri: &str, host: &str) -> Response {
        let request = Request::builder()
            .uri(uri)
            .header(header::HOST, host)
            .body(Body::empty())
            .unwrap();
        server.router().oneshot(request).await.unwrap()
    }

    fn location(response: &Response) -> &str {
        response.headers()[header::LOCATION].to_str().unwrap()
    }

    const FALLBACK: &str = "https://judge.testifysec-demo.xyz/";

    #[tokio::test]
    async fn test_health_ignores_host() {
        let server = HttpServer::new(RouterConfig::default());
        for host in ["anything.example.com", "abc1234.preview.preview.testifysec-demo.xyz", ""] {
            let response = send(&server, "/health", host).await;
            assert_eq!(response.status(), StatusCode::OK);
            assert!(response.headers().contains_key(X_REQUEST_ID));
            let body = axum::body::to_bytes(response.into_body(), 64).await.unwrap();
            assert_eq!(&body[..], b"ok");
        }
    }

    #[tokio::test]
    async fn test_invalid_host_redirects_to_fallback() {
        let server = HttpServer::new(RouterConfig::default());

        let response = send(&server, "/some/page", "nothexchars.preview.testifysec-demo.xyz").await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), FALLBACK);

        let response = send(&server, "/", "evil.example.com").await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), FALLBACK);
    }

    #[tokio::test]
    async fn test_post_auth_open_redirect_blocked() {
        let server = HttpServer::new(RouterConfig::default());
        let response = send(&server, "/post-auth?next=https://evil.example.com/", "router").await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), FALLBACK);
    }

    #[tokio::test]
    async fn test_post_auth_missing_or_empty_next() {
        let server = HttpServer::new(RouterConfig::default());
        for uri in ["/post-auth", "/post-auth?next=", "/post-auth?other=1"] {
            let response = send(&server, uri, "router").await;
            assert_eq!(response.status(), StatusCode::FOUND, "uri {uri}");
            assert_eq!(location(&response), FALLBACK, "uri {uri}");
        }
    }

    #[tokio::test]
    async fn test_post_auth_valid_next() {
        let server = HttpServer::new(RouterConfig::default());
        let next = "https://abc1234.preview.preview.testifysec-demo.xyz/dashboard";
        let uri = format!(
            "/post-auth?next={}",
            url::form_urlencoded::byte_serialize(next.as_bytes()).collect::<String>()
        );

        let response = send(&server, &uri, "router").await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), next);
    }

    #[tokio::test]
    async fn test_paths_are_case_sensitive() {
        let server = HttpServer::new(RouterConfig::default());
        let response = send(&server, "/HEALTH", "evil.example.com").await;
        assert_eq!(response.status(), StatusCode::FOUND);
    }
}
