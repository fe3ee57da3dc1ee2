//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (repositories, hashing, rendering) are implemented by
//! `outbound` adapters. Driving ports are implemented by domain services and
//! consumed by `inbound` adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod access_control;
mod export_renderer;
mod login_service;
mod password_hasher;
mod role_administration;
mod role_repository;
mod telemetry_ingest;
mod telemetry_query;
mod telemetry_repository;
mod user_administration;
mod user_repository;

#[cfg(test)]
pub use access_control::MockAccessControl;
pub use access_control::{AccessControl, AccessProfile};
#[cfg(test)]
pub use export_renderer::MockExportRenderer;
pub use export_renderer::{ExportRenderError, ExportRenderer};
#[cfg(test)]
pub use login_service::MockLoginService;
pub use login_service::LoginService;
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHashError, PasswordHasher};
#[cfg(test)]
pub use role_administration::MockRoleAdministration;
pub use role_administration::RoleAdministration;
#[cfg(test)]
pub use role_repository::MockRoleRepository;
pub use role_repository::{RolePersistenceError, RoleRepository};
#[cfg(test)]
pub use telemetry_ingest::MockTelemetryIngest;
pub use telemetry_ingest::{IngestOutcome, TelemetryIngest};
#[cfg(test)]
pub use telemetry_query::MockTelemetryQuery;
pub use telemetry_query::{ExportDocument, ReadingQuery, TelemetryQuery};
#[cfg(test)]
pub use telemetry_repository::MockTelemetryRepository;
pub use telemetry_repository::{TelemetryRepository, TelemetryStoreError};
#[cfg(test)]
pub use user_administration::MockUserAdministration;
pub use user_administration::{AccountSummary, NewAccountRequest, UserAdministration};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserPersistenceError, UserRepository};
