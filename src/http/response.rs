//! Response construction and the failure policy.
//!
//! # Responsibilities
//! - Map each failure class to the response the client sees
//! - Build 302 redirects without reflecting untrusted input
//!
//! # Design Decisions
//! - Rejected hosts and redirect targets degrade to the fallback page
//! - Resolver failures are configuration defects: 500, never a redirect
//! - Backend failures return 503 naming the SHA; a redirect could loop
//!   back into the same unreachable target
//! - Internal error detail is logged by the caller, never returned

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use url::Url;

use crate::config::RoutingConfig;
use crate::observability::metrics::Outcome;
use crate::routing::ValidatedIdentifier;

/// A request that could not be served normally.
#[derive(Debug, Clone, Copy)]
pub enum Failure<'a> {
    /// The Host header failed validation.
    HostRejected,
    /// The post-auth `next` target was missing or failed validation.
    RedirectRejected,
    /// A validated SHA did not compose a usable target URL.
    TargetUnresolvable,
    /// The backend could not be reached or timed out.
    BackendUnavailable(&'a ValidatedIdentifier),
}

impl Failure<'_> {
    pub fn outcome(&self) -> Outcome {
        match self {
            Failure::HostRejected | Failure::RedirectRejected => Outcome::Fallback,
            Failure::TargetUnresolvable => Outcome::RoutingError,
            Failure::BackendUnavailable(_) => Outcome::BackendUnavailable,
        }
    }
}

/// Turns failures into client responses.
#[derive(Debug, Clone)]
pub struct FailurePolicy {
    fallback: HeaderValue,
}

impl FailurePolicy {
    pub fn new(config: &RoutingConfig) -> Self {
        // The serialized URL is always ASCII, so it is a valid header value.
        let fallback = Url::parse(&config.fallback_url)
            .ok()
            .and_then(|url| HeaderValue::from_str(url.as_str()).ok())
            .unwrap_or_else(|| {
                tracing::error!(
                    fallback_url = %config.fallback_url,
                    "Fallback URL unusable, redirecting to /"
                );
                HeaderValue::from_static("/")
            });
        Self { fallback }
    }

    /// The fallback location, as sent in `Location`.
    pub fn fallback(&self) -> &HeaderValue {
        &self.fallback
    }

    pub fn respond(&self, failure: Failure<'_>) -> Response {
        match failure {
            Failure::HostRejected | Failure::RedirectRejected => found(self.fallback.clone()),
            Failure::TargetUnresolvable => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal routing error").into_response()
            }
            Failure::BackendUnavailable(id) => (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("Preview environment '{}' is unavailable", id),
            )
                .into_response(),
        }
    }
}

/// A 302 Found pointing at `location`.
pub fn found(location: HeaderValue) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}
