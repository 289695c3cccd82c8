//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap backend calls with a deadline
//! - Cancel operations cleanly on timeout (the future is dropped)
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timed-out backend calls surface as `ProxyError::Timeout`

use std::future::Future;
use std::time::Duration;

use crate::error::ProxyError;

/// Run `fut`, giving up after `limit`.
pub async fn with_timeout<F, T, E>(limit: Duration, fut: F) -> Result<T, ProxyError>
where
    F: Future<Output = Result<T, E>>,
    ProxyError: From<E>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(ProxyError::from),
        Err(_) => Err(ProxyError::Timeout(limit)),
    }
}
