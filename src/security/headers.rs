//! Header manipulation for forwarded requests.
//!
//! # Responsibilities
//! - Add X-Original-Host, X-Forwarded-Proto, X-Forwarded-Host, X-Forwarded-For
//! - Strip hop-by-hop headers in both directions
//! - Keep `TE: trailers` on requests so trailer-based protocols (gRPC) work
//!
//! # Design Decisions
//! - X-Original-Host is always overwritten
//! - X-Forwarded-Proto and X-Forwarded-Host are only filled in when absent
//! - The client IP is appended to any existing X-Forwarded-For chain

use std::net::IpAddr;

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue};

pub const X_ORIGINAL_HOST: HeaderName = HeaderName::from_static("x-original-host");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "proxy-connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "upgrade",
];

/// Remove connection-scoped headers, including any named in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in named {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
    headers.remove(header::TRANSFER_ENCODING);
}

/// [`strip_hop_by_hop`] for outbound requests.
///
/// A `TE` header listing `trailers` is restored as `TE: trailers`.
pub fn strip_request_hop_by_hop(headers: &mut HeaderMap) {
    let wants_trailers = headers
        .get_all(header::TE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|token| token.trim().eq_ignore_ascii_case("trailers"));

    strip_hop_by_hop(headers);
    if wants_trailers {
        headers.insert(header::TE, HeaderValue::from_static("trailers"));
    }
}

/// Apply the forwarding headers for a request arriving on `host`.
pub fn apply_forwarding_headers(
    headers: &mut HeaderMap,
    host: &str,
    client_ip: Option<IpAddr>,
) -> Result<(), InvalidHeaderValue> {
    let host_value = HeaderValue::from_str(host)?;

    headers.insert(X_ORIGINAL_HOST, host_value.clone());

    if !headers.contains_key(X_FORWARDED_PROTO) {
        headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static("https"));
    }
    if !headers.contains_key(X_FORWARDED_HOST) {
        headers.insert(X_FORWARDED_HOST, host_value);
    }

    if let Some(ip) = client_ip {
        let chain = headers
            .get_all(X_FORWARDED_FOR)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        let forwarded = if chain.is_empty() {
            ip.to_string()
        } else {
            format!("{chain}, {ip}")
        };
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_str(&forwarded)?);
    }

    Ok(())
}
