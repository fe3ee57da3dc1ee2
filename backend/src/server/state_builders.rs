//! Builders wiring outbound adapters into the driving ports consumed by the
//! HTTP and WebSocket adapters.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};

use crate::domain::ports::{PasswordHasher, TelemetryIngest, TelemetryQuery};
use crate::domain::realtime::{
    ConnectionRegistry, DEFAULT_OUTBOX_CAPACITY, RealtimeHub, RoomPolicy,
};
use crate::domain::{
    AuthorizationGuard, IdentityService, RoleAdminService, TelemetryService, UserAdminService,
};
use crate::inbound::http::ingest_policy::IngestPolicy;
use crate::inbound::http::state::{HttpState, HttpStatePorts};
use crate::inbound::ws::CorsPolicy;
use crate::inbound::ws::state::WsState;
use crate::outbound::memory::{InMemoryDirectory, InMemoryTelemetryRepository};
use crate::outbound::password::Pbkdf2PasswordHasher;
use crate::outbound::xlsx::XlsxExportRenderer;

/// Storage, hashing and time sources shared by every service.
pub struct Adapters<H> {
    pub directory: Arc<InMemoryDirectory>,
    pub telemetry: Arc<InMemoryTelemetryRepository>,
    pub hasher: Arc<H>,
    pub clock: Arc<dyn Clock>,
}

impl<H> Clone for Adapters<H> {
    fn clone(&self) -> Self {
        Self {
            directory: Arc::clone(&self.directory),
            telemetry: Arc::clone(&self.telemetry),
            hasher: Arc::clone(&self.hasher),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl Adapters<Pbkdf2PasswordHasher> {
    /// Empty process-local stores, PBKDF2 digests and the system clock.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            directory: Arc::new(InMemoryDirectory::new()),
            telemetry: Arc::new(InMemoryTelemetryRepository::new()),
            hasher: Arc::new(Pbkdf2PasswordHasher::default()),
            clock: Arc::new(DefaultClock),
        }
    }
}

/// Build the driving ports for HTTP handlers.
pub fn build_http_ports<H>(adapters: &Adapters<H>) -> HttpStatePorts
where
    H: PasswordHasher + 'static,
{
    let telemetry = Arc::new(TelemetryService::new(
        Arc::clone(&adapters.telemetry),
        Arc::new(XlsxExportRenderer),
        Arc::clone(&adapters.clock),
    ));
    let query: Arc<dyn TelemetryQuery> = telemetry.clone();
    let ingest: Arc<dyn TelemetryIngest> = telemetry;
    HttpStatePorts {
        login: Arc::new(IdentityService::new(
            Arc::clone(&adapters.directory),
            Arc::clone(&adapters.hasher),
        )),
        access: Arc::new(AuthorizationGuard::new(Arc::clone(&adapters.directory))),
        telemetry: query,
        ingest,
        users: Arc::new(UserAdminService::new(
            Arc::clone(&adapters.directory),
            Arc::clone(&adapters.directory),
            Arc::clone(&adapters.hasher),
        )),
        roles: Arc::new(RoleAdminService::new(Arc::clone(&adapters.directory))),
    }
}

/// Policies that shape the adapters built from the ports.
#[derive(Debug, Clone)]
pub struct AdapterPolicies {
    pub cors: CorsPolicy,
    pub ingest: IngestPolicy,
    pub room: RoomPolicy,
    pub outbox_capacity: usize,
}

impl Default for AdapterPolicies {
    fn default() -> Self {
        Self {
            cors: CorsPolicy::Any,
            ingest: IngestPolicy::Public,
            room: RoomPolicy::Open,
            outbox_capacity: DEFAULT_OUTBOX_CAPACITY,
        }
    }
}

/// Build both adapter states over one set of ports.
pub fn build_states<H>(adapters: &Adapters<H>, policies: AdapterPolicies) -> (HttpState, WsState)
where
    H: PasswordHasher + 'static,
{
    let ports = build_http_ports(adapters);
    let registry = Arc::new(ConnectionRegistry::new(
        policies.outbox_capacity,
        Arc::clone(&adapters.clock),
    ));
    let hub = RealtimeHub::new(
        registry,
        Arc::clone(&ports.access),
        policies.room,
        Arc::clone(&adapters.clock),
    );
    let ws = WsState::new(hub, Arc::clone(&ports.login), policies.cors);
    (HttpState::new(ports, policies.ingest), ws)
}
