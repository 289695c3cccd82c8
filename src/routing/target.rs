//! Target service resolution.
//!
//! Maps a validated SHA to the in-cluster URL of its preview service by
//! plain string substitution. No DNS, no registry lookups.

use url::Url;

use crate::config::RoutingConfig;
use crate::error::RejectReason;
use crate::routing::host::ValidatedIdentifier;

/// Template slot replaced by the SHA identifier.
pub const PATTERN_SLOT: &str = "%s";

/// The backend a preview host maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub service_name: String,
    pub service_url: Url,
}

impl ResolvedTarget {
    /// `host:port` of the service, as used in the outbound request URI.
    pub fn authority(&self) -> String {
        let host = self.service_url.host_str().unwrap_or_default();
        match self.service_url.port_or_known_default() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        }
    }
}

/// Resolve a validated identifier to its preview service URL.
pub fn resolve_target(
    id: &ValidatedIdentifier,
    config: &RoutingConfig,
) -> Result<ResolvedTarget, RejectReason> {
    compose(id.as_str(), config)
}

/// Whether the configured template and namespace yield a parsable URL.
pub(crate) fn composes_valid_url(config: &RoutingConfig) -> bool {
    compose("0000000", config).is_ok()
}

fn compose(sha: &str, config: &RoutingConfig) -> Result<ResolvedTarget, RejectReason> {
    let service_name = config.service_pattern.replacen(PATTERN_SLOT, sha, 1);
    let target = format!(
        "http://{}.{}.svc.cluster.local:{}",
        service_name, config.namespace, config.service_port
    );

    let service_url = Url::parse(&target).map_err(|_| RejectReason::MalformedTargetUrl(target))?;

    Ok(ResolvedTarget {
        service_name,
        service_url,
    })
}
