//! Service settings loaded via OrthoConfig.
//!
//! Every field is optional in the raw layer; accessors apply defaults and
//! parse the strings into typed policies once at startup.

use std::net::SocketAddr;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::realtime::{DEFAULT_OUTBOX_CAPACITY, RoomPolicy, RoomPolicyParseError};
use crate::inbound::http::ingest_policy::{IngestPolicy, IngestPolicyParseError};
use crate::inbound::ws::{CorsPolicy, CorsPolicyError};
use crate::server::AdapterPolicies;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Raw dashboard settings (`MTI_*` environment variables, CLI flags or a
/// config file).
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "MTI")]
pub struct DashboardSettings {
    /// Listen address, `host:port`.
    pub bind_addr: Option<String>,
    /// `*` or a comma-separated list of allowed WebSocket origins.
    pub cors_origins: Option<String>,
    /// `public` or `internal`.
    pub ingest_policy: Option<String>,
    /// `open` or `capability`.
    pub room_policy: Option<String>,
    /// Password for the bootstrap `admin` account. No account is seeded
    /// when absent.
    pub admin_password: Option<String>,
    /// Events buffered per socket before deliveries are dropped.
    pub outbox_capacity: Option<usize>,
}

/// A setting that is present but unusable.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind_addr '{value}': {source}")]
    BindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("invalid cors_origins: {0}")]
    Cors(#[from] CorsPolicyError),
    #[error(transparent)]
    IngestPolicy(#[from] IngestPolicyParseError),
    #[error(transparent)]
    RoomPolicy(#[from] RoomPolicyParseError),
}

fn present(value: Option<&String>) -> Option<&str> {
    value.map(|raw| raw.trim()).filter(|raw| !raw.is_empty())
}

impl DashboardSettings {
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = present(self.bind_addr.as_ref()).unwrap_or(DEFAULT_BIND_ADDR);
        value.parse().map_err(|source| SettingsError::BindAddr {
            value: value.to_owned(),
            source,
        })
    }

    pub fn cors_policy(&self) -> Result<CorsPolicy, SettingsError> {
        match self.cors_origins.as_deref() {
            None => Ok(CorsPolicy::Any),
            Some(raw) => Ok(CorsPolicy::parse(raw)?),
        }
    }

    pub fn ingest_policy(&self) -> Result<IngestPolicy, SettingsError> {
        present(self.ingest_policy.as_ref())
            .map_or(Ok(IngestPolicy::default()), str::parse)
            .map_err(SettingsError::from)
    }

    pub fn room_policy(&self) -> Result<RoomPolicy, SettingsError> {
        present(self.room_policy.as_ref())
            .map_or(Ok(RoomPolicy::default()), str::parse)
            .map_err(SettingsError::from)
    }

    /// Configured admin password; blank values count as unset.
    #[must_use]
    pub fn admin_password(&self) -> Option<&str> {
        self.admin_password
            .as_deref()
            .filter(|password| !password.trim().is_empty())
    }

    #[must_use]
    pub fn outbox_capacity(&self) -> usize {
        self.outbox_capacity
            .filter(|capacity| *capacity > 0)
            .unwrap_or(DEFAULT_OUTBOX_CAPACITY)
    }

    /// All adapter policies, validated together.
    pub fn adapter_policies(&self) -> Result<AdapterPolicies, SettingsError> {
        Ok(AdapterPolicies {
            cors: self.cors_policy()?,
            ingest: self.ingest_policy()?,
            room: self.room_policy()?,
            outbox_capacity: self.outbox_capacity(),
        })
    }
}
