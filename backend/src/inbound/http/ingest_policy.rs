//! Who may push telemetry.
//!
//! Ingestion is deliberately exempt from the session guard: sensor feeds
//! push without logging in. The `internal` policy narrows that to peers on
//! loopback, private and link-local networks.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Network-level gate for the ingestion endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IngestPolicy {
    /// Anyone may ingest.
    #[default]
    Public,
    /// Only loopback, private and link-local peers may ingest.
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown ingest policy '{0}', expected 'public' or 'internal'")]
pub struct IngestPolicyParseError(String);

impl FromStr for IngestPolicy {
    type Err = IngestPolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "internal" => Ok(Self::Internal),
            _ => Err(IngestPolicyParseError(s.to_owned())),
        }
    }
}

impl fmt::Display for IngestPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Public => "public",
            Self::Internal => "internal",
        })
    }
}

fn is_internal(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_loopback() || v4.is_private() || v4.is_link_local(),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_internal(IpAddr::V4(v4)),
            None => {
                v6.is_loopback() || v6.is_unique_local() || v6.is_unicast_link_local()
            }
        },
    }
}

impl IngestPolicy {
    /// Whether a request from `peer` may ingest. Unknown peers are refused
    /// under the internal policy.
    #[must_use]
    pub fn permits(self, peer: Option<IpAddr>) -> bool {
        match self {
            Self::Public => true,
            Self::Internal => peer.is_some_and(is_internal),
        }
    }
}
