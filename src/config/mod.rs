//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! built-in defaults
//!     → loader.rs (optional TOML file, then environment overrides)
//!     → validation.rs (semantic checks)
//!     → RouterConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - The routing core never reads the environment itself

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    ListenerConfig, LogFormat, ObservabilityConfig, RouterConfig, RoutingConfig, ServerConfig,
    UpstreamConfig,
};
pub use validation::ValidationError;
