//! HTTP server configuration object.

use std::net::SocketAddr;

use actix_web::cookie::{Key, SameSite};

use crate::domain::realtime::RoomPolicy;
use crate::inbound::http::ingest_policy::IngestPolicy;
use crate::inbound::ws::CorsPolicy;

use super::state_builders::AdapterPolicies;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) policies: AdapterPolicies,
}

impl ServerConfig {
    /// Construct a configuration with permissive policies.
    #[must_use]
    pub fn new(key: Key, cookie_secure: bool, same_site: SameSite, bind_addr: SocketAddr) -> Self {
        Self {
            key,
            cookie_secure,
            same_site,
            bind_addr,
            policies: AdapterPolicies::default(),
        }
    }

    #[must_use]
    pub fn with_cors(mut self, cors: CorsPolicy) -> Self {
        self.policies.cors = cors;
        self
    }

    #[must_use]
    pub fn with_ingest_policy(mut self, policy: IngestPolicy) -> Self {
        self.policies.ingest = policy;
        self
    }

    #[must_use]
    pub fn with_room_policy(mut self, policy: RoomPolicy) -> Self {
        self.policies.room = policy;
        self
    }

    /// Per-connection buffer size for outbound socket events.
    #[must_use]
    pub fn with_outbox_capacity(mut self, capacity: usize) -> Self {
        self.policies.outbox_capacity = capacity;
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
