//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Enforce the single-slot service name template
//! - Validate value ranges (timeouts > 0, ports valid)
//! - Check that the fallback and bind addresses parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{RouterConfig, RoutingConfig};
use crate::routing::target;

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("service_pattern {pattern:?} must contain exactly one %s slot (found {slots})")]
    PatternSlots { pattern: String, slots: usize },

    #[error("service_pattern {0:?} contains a format verb other than %s")]
    PatternVerb(String),

    #[error("service_port {0:?} is not a valid TCP port")]
    InvalidPort(String),

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("fallback_url {0:?} is not an absolute http(s) URL")]
    InvalidFallback(String),

    #[error("service_pattern and namespace do not compose a valid target URL")]
    InvalidTarget,

    #[error("{field} address {value:?} does not parse as host:port")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error(
        "upstream.response_header_timeout_secs ({upstream}) must be less than \
         server.request_timeout_secs ({server})"
    )]
    TimeoutOrder { upstream: u64, server: u64 },
}

/// Validate a fully merged configuration.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = validate_routing(&config.routing);

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::Zero("listener.max_connections"));
    }
    if config.upstream.max_idle_connections == 0 {
        errors.push(ValidationError::Zero("upstream.max_idle_connections"));
    }

    let timeouts = [
        ("upstream.connect_timeout_secs", config.upstream.connect_timeout_secs),
        (
            "upstream.response_header_timeout_secs",
            config.upstream.response_header_timeout_secs,
        ),
        ("upstream.body_timeout_secs", config.upstream.body_timeout_secs),
        ("server.header_read_timeout_secs", config.server.header_read_timeout_secs),
        ("server.request_timeout_secs", config.server.request_timeout_secs),
    ];
    for (field, secs) in timeouts {
        if secs == 0 {
            errors.push(ValidationError::Zero(field));
        }
    }

    // A slower backend deadline would be pre-empted by the handler timeout.
    if config.upstream.response_header_timeout_secs >= config.server.request_timeout_secs {
        errors.push(ValidationError::TimeoutOrder {
            upstream: config.upstream.response_header_timeout_secs,
            server: config.server.request_timeout_secs,
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_routing(routing: &RoutingConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let slots = routing.service_pattern.matches("%s").count();
    if slots != 1 {
        errors.push(ValidationError::PatternSlots {
            pattern: routing.service_pattern.clone(),
            slots,
        });
    } else if routing.service_pattern.matches('%').count() != 1 {
        errors.push(ValidationError::PatternVerb(routing.service_pattern.clone()));
    }

    if !matches!(routing.service_port.parse::<u16>(), Ok(port) if port > 0) {
        errors.push(ValidationError::InvalidPort(routing.service_port.clone()));
    }

    if routing.namespace.is_empty() {
        errors.push(ValidationError::Empty("namespace"));
    }
    if routing.domain_suffix.is_empty() {
        errors.push(ValidationError::Empty("domain_suffix"));
    }

    match Url::parse(&routing.fallback_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {}
        _ => errors.push(ValidationError::InvalidFallback(routing.fallback_url.clone())),
    }

    // Catches templates that would only fail once a request arrives.
    if errors.is_empty() && !target::composes_valid_url(routing) {
        errors.push(ValidationError::InvalidTarget);
    }

    errors
}
