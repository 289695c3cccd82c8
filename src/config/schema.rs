//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use std::net::IpAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the preview router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Listener configuration (bind address, connection cap).
    pub listener: ListenerConfig,

    /// Host-to-service routing rules.
    pub routing: RoutingConfig,

    /// Outbound connection pool and backend timeouts.
    pub upstream: UpstreamConfig,

    /// Inbound server timeouts.
    pub server: ServerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 10_000,
        }
    }
}

/// Routing rules shared by the hostname validator, target resolver
/// and redirect validator.
///
/// Immutable after startup; handed to every request through an `Arc`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Kubernetes namespace holding preview services.
    pub namespace: String,

    /// Service name template with exactly one `%s` slot for the SHA.
    pub service_pattern: String,

    /// Port every preview service listens on.
    pub service_port: String,

    /// Trusted base domain all preview hosts must end with.
    pub domain_suffix: String,

    /// Landing page used whenever a host or redirect is rejected.
    pub fallback_url: String,

    /// Require the host to be exactly `<sha>.preview.<domain_suffix>`.
    pub strict_hosts: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            namespace: "judge".to_string(),
            service_pattern: "preview-%s-web".to_string(),
            service_port: "8077".to_string(),
            domain_suffix: "preview.testifysec-demo.xyz".to_string(),
            fallback_url: "https://judge.testifysec-demo.xyz/".to_string(),
            strict_hosts: false,
        }
    }
}

/// Outbound connection pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Maximum pooled connections kept across all backend hosts.
    /// Connections opened beyond this are closed after one request.
    pub max_idle_connections: usize,

    /// Maximum idle connections kept per backend host.
    pub max_idle_per_host: usize,

    /// How long an idle pooled connection is kept, in seconds.
    pub idle_timeout_secs: u64,

    /// TCP connect timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Time allowed until the backend's response headers arrive, in seconds.
    pub response_header_timeout_secs: u64,

    /// Maximum gap between request body frames sent to the backend, in seconds.
    pub body_timeout_secs: u64,

    /// Resolve every service name to this address instead of using DNS.
    /// Only meant for local development outside the cluster.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolve_to: Option<IpAddr>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            max_idle_connections: 100,
            max_idle_per_host: 10,
            idle_timeout_secs: 90,
            connect_timeout_secs: 10,
            response_header_timeout_secs: 10,
            body_timeout_secs: 10,
            resolve_to: None,
        }
    }
}

impl UpstreamConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn response_header_timeout(&self) -> Duration {
        Duration::from_secs(self.response_header_timeout_secs)
    }

    pub fn body_timeout(&self) -> Duration {
        Duration::from_secs(self.body_timeout_secs)
    }
}

/// Inbound server timeouts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Time a client has to send complete request headers, in seconds.
    pub header_read_timeout_secs: u64,

    /// Time a handler has to produce response headers, in seconds.
    pub request_timeout_secs: u64,

    /// How long shutdown waits for in-flight connections, in seconds.
    pub drain_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            header_read_timeout_secs: 5,
            request_timeout_secs: 30,
            drain_secs: 10,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
