//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound request:
//!     → headers.rs (strip hop-by-hop, add X-Original-Host, X-Forwarded-*)
//!     → Pass to upstream client
//!
//! Backend response:
//!     → headers.rs (strip hop-by-hop)
//!     → Stream to client
//! ```
//!
//! # Design Decisions
//! - X-Original-Host always reflects the host this router validated
//! - X-Forwarded-Proto/Host set by an earlier hop are preserved
//! - No trust in client input beyond what the validators accepted

pub mod headers;
