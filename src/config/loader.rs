//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::RouterConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variables that override the routing section.
pub const ENV_NAMESPACE: &str = "PREVIEW_NAMESPACE";
pub const ENV_SERVICE_PATTERN: &str = "SERVICE_NAME_PATTERN";
pub const ENV_SERVICE_PORT: &str = "SERVICE_PORT";
pub const ENV_FALLBACK_URL: &str = "FALLBACK_URL";
pub const ENV_DOMAIN_SUFFIX: &str = "DOMAIN_SUFFIX";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file, apply environment
/// overrides, then validate the result.
pub fn load_config(path: Option<&Path>) -> Result<RouterConfig, ConfigError> {
    load_config_with(path, |key| std::env::var(key).ok())
}

/// Same as [`load_config`] with an injectable variable lookup.
pub fn load_config_with<F>(path: Option<&Path>, lookup: F) -> Result<RouterConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => RouterConfig::default(),
    };

    apply_env_overrides(&mut config, lookup);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay the routing environment variables. Unset and empty values
/// leave the current setting in place.
pub fn apply_env_overrides<F>(config: &mut RouterConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let routing = &mut config.routing;
    let overrides = [
        (ENV_NAMESPACE, &mut routing.namespace),
        (ENV_SERVICE_PATTERN, &mut routing.service_pattern),
        (ENV_SERVICE_PORT, &mut routing.service_port),
        (ENV_FALLBACK_URL, &mut routing.fallback_url),
        (ENV_DOMAIN_SUFFIX, &mut routing.domain_suffix),
    ];

    for (key, slot) in overrides {
        if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
            *slot = value;
        }
    }
}
