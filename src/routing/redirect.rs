//! Post-auth redirect validation.
//!
//! The `next` parameter is attacker-controlled. A candidate is honored only
//! when its authority passes the same [`validate_host`] check used for
//! inbound Host headers.

use url::Url;

use crate::config::RoutingConfig;
use crate::error::RejectReason;
use crate::routing::host::validate_host;

/// Validate an untrusted redirect target.
///
/// Returns `candidate` itself on success, never a re-serialized form. The
/// authority is checked exactly as written; one that URL parsing would
/// normalize (case, default port, IDNA) is rejected.
pub fn validate_redirect<'a>(candidate: &'a str, config: &RoutingConfig) -> Result<&'a str, RejectReason> {
    let url = Url::parse(candidate).map_err(|e| RejectReason::MalformedRedirect(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(RejectReason::MalformedRedirect(format!(
            "unsupported scheme {:?}",
            url.scheme()
        )));
    }

    let raw = raw_authority(candidate)
        .ok_or_else(|| RejectReason::MalformedRedirect("missing authority".to_string()))?;
    if raw.contains('@') {
        return Err(RejectReason::MalformedRedirect("userinfo not allowed".to_string()));
    }

    validate_host(raw, config)?;

    let host = url
        .host_str()
        .ok_or_else(|| RejectReason::MalformedRedirect("missing host".to_string()))?;
    let parsed = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    if parsed != raw {
        return Err(RejectReason::MalformedRedirect(format!(
            "authority {raw:?} is not in canonical form"
        )));
    }

    Ok(candidate)
}

/// The authority as written: between `://` and the next `/`, `?` or `#`.
fn raw_authority(candidate: &str) -> Option<&str> {
    let (_, rest) = candidate.split_once("://")?;
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    Some(&rest[..end])
}
