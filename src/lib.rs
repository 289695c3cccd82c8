//! Preview Router
//!
//! Routes `<sha>.preview.<domain>` requests to the per-commit preview
//! service for that SHA, and validates post-login redirects back into
//! preview environments.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────▶ net::listener ──▶ http::server ──┬─ /health ──────▶ "ok"
//!                                                  ├─ /post-auth ───▶ routing::redirect ──▶ 302
//!                                                  └─ everything else
//!                                                        │
//!                                                        ▼
//!                                              routing::host (validate SHA)
//!                                                        │
//!                                                        ▼
//!                                              routing::target (service URL)
//!                                                        │
//!                                                        ▼
//!                                              upstream::client ──────▶ Preview Service
//!
//!     Cross-cutting: config, observability, lifecycle, resilience, security
//! ```
//!
//! Failures never leak detail: rejected hosts and redirect targets go to the
//! fallback page, unreachable backends get a 503.

// Core subsystems
pub mod config;
pub mod error;
pub mod http;
pub mod net;
pub mod routing;
pub mod upstream;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod security;

pub use config::RouterConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
