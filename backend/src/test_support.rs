//! Test utilities for the backend crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`).
//! Compiled for tests and behind the `test-support` feature.

use std::sync::{Arc, Mutex, MutexGuard};

use actix_web::cookie::{Key, SameSite};
use actix_web::web;
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::{
    PasswordHash, Principal, RoleId, RoleName, UserAccount, UserId, Username, seed_canonical_roles,
};
use crate::domain::ports::{PasswordHasher, PasswordHashError, RoleRepository, UserRepository};
use crate::inbound::http::health::HealthState;
use crate::inbound::http::state::HttpState;
use crate::inbound::ws::state::WsState;
use crate::outbound::memory::{InMemoryDirectory, InMemoryTelemetryRepository};
use crate::server::{AdapterPolicies, AppDependencies, Adapters, build_states};

/// Clock whose time only moves when told to.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.lock_clock() = now;
    }

    pub fn advance_seconds(&self, seconds: i64) {
        *self.lock_clock() += TimeDelta::seconds(seconds);
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Reversible "hash" for tests that do not care about digest strength.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaintextHasher;

impl PasswordHasher for PlaintextHasher {
    fn hash(&self, password: &str) -> Result<PasswordHash, PasswordHashError> {
        Ok(PasswordHash::from_encoded(format!("plain${password}")))
    }

    fn verify(&self, password: &str, hash: &PasswordHash) -> bool {
        hash.encoded().strip_prefix("plain$") == Some(password)
    }
}

/// Directory pre-loaded with the canonical roles.
pub async fn seeded_directory() -> Arc<InMemoryDirectory> {
    let directory = Arc::new(InMemoryDirectory::default());
    if let Err(err) = seed_canonical_roles(directory.as_ref()).await {
        panic!("seeding canonical roles: {err}");
    }
    directory
}

/// Insert an account holding the named role, hashed with `hasher`.
pub async fn add_account<H: PasswordHasher>(
    directory: &InMemoryDirectory,
    hasher: &H,
    username: &str,
    password: &str,
    role: &str,
) -> Principal {
    let role_name = RoleName::new(role).unwrap_or_else(|err| panic!("role name: {err}"));
    let role_id: RoleId = match RoleRepository::find_by_name(directory, &role_name).await {
        Ok(Some(entry)) => entry.role.id,
        Ok(None) => panic!("role {role} is not seeded"),
        Err(err) => panic!("role lookup: {err}"),
    };
    let principal = Principal::new(
        UserId::random(),
        Username::new(username).unwrap_or_else(|err| panic!("username: {err}")),
        role_id,
    );
    let password = hasher
        .hash(password)
        .unwrap_or_else(|err| panic!("hashing: {err}"));
    let account = UserAccount {
        principal: principal.clone(),
        password,
    };
    if let Err(err) = UserRepository::create(directory, &account).await {
        panic!("creating account {username}: {err}");
    }
    principal
}

/// Fixed "now" used by [`TestBackend`]: 2024-03-04T12:00:00Z.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(2024, 3, 4, 12, 0, 0).single() {
        Some(now) => now,
        None => panic!("fixed test time"),
    }
}

/// Fully wired in-memory backend with a controllable clock.
pub struct TestBackend {
    pub adapters: Adapters<PlaintextHasher>,
    pub clock: Arc<MutableClock>,
    pub http: HttpState,
    pub ws: WsState,
}

impl TestBackend {
    /// Canonical roles seeded, permissive policies.
    pub async fn new() -> Self {
        Self::with_policies(AdapterPolicies::default()).await
    }

    pub async fn with_policies(policies: AdapterPolicies) -> Self {
        let clock = Arc::new(MutableClock::new(fixed_now()));
        let adapters = Adapters {
            directory: seeded_directory().await,
            telemetry: Arc::new(InMemoryTelemetryRepository::new()),
            hasher: Arc::new(PlaintextHasher),
            clock: clock.clone(),
        };
        let (http, ws) = build_states(&adapters, policies);
        Self {
            adapters,
            clock,
            http,
            ws,
        }
    }

    /// Create an account holding the named canonical role.
    pub async fn account(&self, username: &str, password: &str, role: &str) -> Principal {
        add_account(
            &self.adapters.directory,
            &PlaintextHasher,
            username,
            password,
            role,
        )
        .await
    }

    /// Dependencies for [`crate::server::build_app`], with a ready health
    /// state and an insecure cookie for plain-HTTP tests.
    #[must_use]
    pub fn app_dependencies(&self) -> AppDependencies {
        let health_state = web::Data::new(HealthState::new());
        health_state.mark_ready();
        AppDependencies {
            health_state,
            http_state: web::Data::new(self.http.clone()),
            ws_state: web::Data::new(self.ws.clone()),
            key: Key::generate(),
            cookie_secure: false,
            same_site: SameSite::Lax,
        }
    }
}
