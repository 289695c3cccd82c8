//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Host header
//!     → host.rs (suffix check, SHA extraction)
//!     → target.rs (template substitution → service URL)
//!     → Return: ResolvedTarget or RejectReason
//!
//! Post-auth `next` parameter:
//!     → redirect.rs (URL parse → host.rs on its authority)
//!     → Return: validated URL or RejectReason
//! ```
//!
//! # Design Decisions
//! - Pure functions over an immutable RoutingConfig; no locks, no I/O
//! - Deterministic: same input always yields the same target
//! - Targets derive from the hostname only, never from a registry

pub mod host;
pub mod redirect;
pub mod target;

pub use host::{validate_host, ValidatedIdentifier};
pub use redirect::validate_redirect;
pub use target::{resolve_target, ResolvedTarget};
