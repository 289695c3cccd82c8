//! Error types shared across the routing pipeline.

use thiserror::Error;

/// Why a host, redirect target, or composed service URL was refused.
///
/// Every variant is recovered locally by the failure policy and never
/// surfaced to the client verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("host {0:?} does not end with the preview domain suffix")]
    SuffixMismatch(String),

    #[error("host {0:?} does not start with a SHA preview label")]
    NoShaMatch(String),

    #[error("redirect target is not a usable absolute URL: {0}")]
    MalformedRedirect(String),

    #[error("composed target {0:?} is not a valid URL")]
    MalformedTargetUrl(String),
}

/// Transport-level failure while talking to a preview backend.
///
/// Non-2xx responses are not errors; only failures to obtain a response
/// at all end up here.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("backend unavailable: {0}")]
    BackendUnavailable(#[from] hyper_util::client::legacy::Error),

    #[error("backend did not respond within {0:?}")]
    Timeout(std::time::Duration),

    #[error("invalid outbound request: {0}")]
    InvalidRequest(#[from] axum::http::Error),
}
