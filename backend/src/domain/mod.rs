//! Domain primitives, policies and services.
//!
//! Purpose: Define the strongly typed vocabulary of the dashboard (roles,
//! capabilities, principals, readings, realtime events) and the services that
//! implement the driving ports. Nothing here knows about HTTP, WebSocket
//! frames or a particular store.
//!
//! Public surface:
//! - Error (alias to `error::Error`): transport-agnostic failure payload.
//! - Capability matrix types (`CapabilitySet`, `RoleCapabilities`, ...).
//! - `AuthorizationGuard`: the single authorization decision point.
//! - Services implementing the driving ports in `ports`.

pub mod auth;
pub mod authorization;
pub mod blocking;
pub mod capability;
pub mod error;
pub mod identity_service;
pub mod ports;
pub mod realtime;
pub mod role_admin_service;
pub mod seeding;
pub mod telemetry;
pub mod telemetry_service;
pub mod trace_id;
pub mod user;
pub mod user_admin_service;

pub use self::auth::{
    INVALID_CREDENTIALS_MESSAGE, LoginCredentials, LoginValidationError, PasswordHash,
};
pub use self::authorization::{
    AuthorizationGuard, Decision, DenyReason, FORBIDDEN_MESSAGE, Operation, SELF_DELETE_MESSAGE,
    ensure_not_self,
};
pub use self::blocking::run_blocking;
pub use self::capability::{
    CANONICAL_ROLES, CapabilityMatrix, CapabilitySet, MANAGER_ROLE, PanelNumber, ROLE_NAME_MAX,
    Role, RoleCapabilities, RoleEntry, RoleId, RoleName, RoleValidationError,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::identity_service::IdentityService;
pub use self::role_admin_service::RoleAdminService;
pub use self::seeding::{ADMIN_USERNAME, SeedReport, seed_admin, seed_canonical_roles};
pub use self::telemetry_service::{EXPORT_FILE_STEM, TelemetryService};
pub use self::trace_id::TraceId;
pub use self::user::{
    Principal, USERNAME_MAX, UserAccount, UserId, UserValidationError, Username,
};
pub use self::user_admin_service::UserAdminService;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use telemetry_backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
