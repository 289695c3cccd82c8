//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to backend:
//!     → connect timeout (enforced by the connector)
//!     → timeouts.rs (deadline for the backend's response headers)
//!     → body frame timeout (enforced while streaming the request body)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every backend call has a deadline
//! - No retries: one attempt per request, availability is the
//!   orchestrator's job
//! - Timeout errors are distinct from other errors in logs

pub mod timeouts;
