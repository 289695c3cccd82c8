//! Upstream subsystem.
//!
//! # Data Flow
//! ```text
//! Prepared outbound request (director already applied)
//!     → client.rs (pooled connection, deadlines)
//!     → body.rs (reports when the request body is fully sent)
//!     → connector.rs (global pool slots)
//!     → dns.rs (service name → address)
//!     → Backend
//!     ← Response streamed back
//! ```

pub mod body;
pub mod client;
pub mod connector;
pub mod dns;

pub use client::ProxyEngine;
