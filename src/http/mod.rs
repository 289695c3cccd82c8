//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, per-connection serving, handlers)
//!     → request.rs (request ID, host extraction, outbound request)
//!     → [routing layer validates host, resolves target]
//!     → [upstream client forwards]
//!     → response.rs (failure policy, redirects)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use response::{Failure, FailurePolicy};
pub use server::{AppState, HttpServer};
