//! Hostname validation.
//!
//! # Responsibilities
//! - Check the host ends with the trusted domain suffix
//! - Extract the SHA label anchored at the start of the host
//! - Optionally require nothing between `<sha>.preview.` and the suffix
//!
//! # Design Decisions
//! - Matching is case-sensitive; uppercase hex is rejected
//! - The suffix check runs first and independently of the SHA match
//! - The redirect validator calls [`validate_host`] too, so both trust
//!   boundaries share exactly one rule set

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::RoutingConfig;
use crate::error::RejectReason;

static SHA_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-f0-9]{7,40})\.preview\.").expect("SHA prefix pattern compiles")
});

/// A commit identifier taken from a host that passed validation.
///
/// Can only be produced by [`validate_host`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidatedIdentifier(String);

impl ValidatedIdentifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ValidatedIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validate a Host value and extract its SHA identifier.
pub fn validate_host(host: &str, config: &RoutingConfig) -> Result<ValidatedIdentifier, RejectReason> {
    if !host.ends_with(&config.domain_suffix) {
        return Err(RejectReason::SuffixMismatch(host.to_string()));
    }

    let caps = SHA_PREFIX
        .captures(host)
        .ok_or_else(|| RejectReason::NoShaMatch(host.to_string()))?;

    if config.strict_hosts {
        let prefix_len = caps.get(0).map_or(0, |m| m.end());
        if &host[prefix_len..] != config.domain_suffix {
            return Err(RejectReason::NoShaMatch(host.to_string()));
        }
    }

    let sha = caps
        .get(1)
        .ok_or_else(|| RejectReason::NoShaMatch(host.to_string()))?;
    Ok(ValidatedIdentifier(sha.as_str().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LITERAL_HOST: &str = "abc1234.preview.preview.testifysec-demo.xyz";

    #[test]
    fn test_accepts_short_sha() {
        let config = RoutingConfig::default();
        let id = validate_host(LITERAL_HOST, &config).unwrap();
        assert_eq!(id.as_str(), "abc1234");
    }

    #[test]
    fn test_accepts_full_sha() {
        let config = RoutingConfig::default();
        let sha = "0123456789abcdef0123456789abcdef01234567";
        let host = format!("{}.preview.{}", sha, config.domain_suffix);
        assert_eq!(validate_host(&host, &config).unwrap().as_str(), sha);
    }

    #[test]
    fn test_rejects_foreign_suffix() {
        let config = RoutingConfig::default();
        for host in ["abc1234.preview.evil.example.com", "", "localhost:8080", "preview.testifysec-demo.xyz.evil"] {
            assert_eq!(
                validate_host(host, &config),
                Err(RejectReason::SuffixMismatch(host.to_string())),
                "host {host:?}"
            );
        }
    }

    #[test]
    fn test_port_in_host_is_suffix_mismatch() {
        let config = RoutingConfig::default();
        let host = format!("{LITERAL_HOST}:443");
        assert!(matches!(
            validate_host(&host, &config),
            Err(RejectReason::SuffixMismatch(_))
        ));
    }

    #[test]
    fn test_rejects_non_hex_label() {
        let config = RoutingConfig::default();
        let host = "nothexchars.preview.testifysec-demo.xyz";
        assert_eq!(
            validate_host(host, &config),
            Err(RejectReason::NoShaMatch(host.to_string()))
        );
    }

    #[test]
    fn test_sha_length_bounds() {
        let config = RoutingConfig::default();
        let too_short = format!("abc123.preview.{}", config.domain_suffix);
        let too_long = format!("{}.preview.{}", "a".repeat(41), config.domain_suffix);
        assert!(matches!(validate_host(&too_short, &config), Err(RejectReason::NoShaMatch(_))));
        assert!(matches!(validate_host(&too_long, &config), Err(RejectReason::NoShaMatch(_))));
    }

    #[test]
    fn test_uppercase_hex_rejected() {
        let config = RoutingConfig::default();
        let host = format!("ABC1234.preview.{}", config.domain_suffix);
        assert!(matches!(validate_host(&host, &config), Err(RejectReason::NoShaMatch(_))));
    }

    #[test]
    fn test_match_anchored_at_start() {
        let config = RoutingConfig::default();
        let host = format!("x.abc1234.preview.{}", config.domain_suffix);
        assert!(matches!(validate_host(&host, &config), Err(RejectReason::NoShaMatch(_))));
    }

    #[test]
    fn test_middle_labels_allowed_unless_strict() {
        let mut config = RoutingConfig::default();
        let host = format!("abc1234.preview.extra.{}", config.domain_suffix);
        assert_eq!(validate_host(&host, &config).unwrap().as_str(), "abc1234");

        config.strict_hosts = true;
        assert!(matches!(validate_host(&host, &config), Err(RejectReason::NoShaMatch(_))));
        assert_eq!(validate_host(LITERAL_HOST, &config).unwrap().as_str(), "abc1234");
    }

    #[test]
    fn test_validation_is_idempotent() {
        let config = RoutingConfig::default();
        let first = validate_host(LITERAL_HOST, &config);
        let second = validate_host(LITERAL_HOST, &config);
        assert_eq!(first, second);
    }
}
