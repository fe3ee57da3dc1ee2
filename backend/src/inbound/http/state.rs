//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    AccessControl, LoginService, RoleAdministration, TelemetryIngest, TelemetryQuery,
    UserAdministration,
};

use super::ingest_policy::IngestPolicy;

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub login: Arc<dyn LoginService>,
    pub access: Arc<dyn AccessControl>,
    pub telemetry: Arc<dyn TelemetryQuery>,
    pub ingest: Arc<dyn TelemetryIngest>,
    pub users: Arc<dyn UserAdministration>,
    pub roles: Arc<dyn RoleAdministration>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub access: Arc<dyn AccessControl>,
    pub telemetry: Arc<dyn TelemetryQuery>,
    pub ingest: Arc<dyn TelemetryIngest>,
    pub users: Arc<dyn UserAdministration>,
    pub roles: Arc<dyn RoleAdministration>,
    pub ingest_policy: IngestPolicy,
}

impl HttpState {
    pub fn new(ports: HttpStatePorts, ingest_policy: IngestPolicy) -> Self {
        let HttpStatePorts {
            login,
            access,
            telemetry,
            ingest,
            users,
            roles,
        } = ports;
        Self {
            login,
            access,
            telemetry,
            ingest,
            users,
            roles,
            ingest_policy,
        }
    }
}
