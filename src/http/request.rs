//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request IDs (UUID v4)
//! - Extract the routing-relevant host
//! - Derive the outbound request for a resolved target (the director)
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The outbound request keeps method, path, query, body and the inbound
//!   Host header; only the URI authority and forwarding headers change

use std::net::IpAddr;

use axum::body::Body;
use axum::http::uri::Scheme;
use axum::http::{header, HeaderValue, Request, Uri};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::error::ProxyError;
use crate::routing::ResolvedTarget;
use crate::security::headers::{apply_forwarding_headers, strip_request_hop_by_hop};

pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates a UUID v4 for requests that arrive without an ID.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// The request's host: the Host header, or the URI authority for HTTP/2.
///
/// Missing hosts come back empty, which no domain suffix matches.
pub fn request_host<B>(request: &Request<B>) -> String {
    request
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| request.uri().authority().map(|a| a.to_string()))
        .unwrap_or_default()
}

/// Derive the request sent to `target` from an inbound request on `host`.
pub fn build_outbound(
    request: Request<Body>,
    host: &str,
    target: &ResolvedTarget,
    client_ip: Option<IpAddr>,
) -> Result<Request<Body>, ProxyError> {
    let (parts, body) = request.into_parts();

    let mut headers = parts.headers;
    strip_request_hop_by_hop(&mut headers);
    apply_forwarding_headers(&mut headers, host, client_ip).map_err(axum::http::Error::from)?;
    if !headers.contains_key(header::HOST) {
        let value = HeaderValue::from_str(host).map_err(axum::http::Error::from)?;
        headers.insert(header::HOST, value);
    }

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let uri = Uri::builder()
        .scheme(Scheme::HTTP)
        .authority(target.authority().as_str())
        .path_and_query(path_and_query)
        .build()?;

    let mut outbound = Request::builder()
        .method(parts.method)
        .uri(uri)
        .body(body)?;
    *outbound.headers_mut() = headers;

    Ok(outbound)
}
