//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! document for the REST API. It registers:
//!
//! - **Paths**: every HTTP endpoint from the inbound layer (auth, dashboard,
//!   telemetry, admin, health)
//! - **Schemas**: request/response DTOs plus wrappers ([`ErrorSchema`],
//!   [`ErrorCodeSchema`], [`CapabilitySetSchema`]) that describe domain types
//!   without coupling them to utoipa
//! - **Security**: Session cookie authentication scheme
//!
//! The generated document is used by Swagger UI (debug builds) and
//! exported via `cargo run --bin openapi-dump` for external tooling. The
//! WebSocket channel at `/ws` is not part of the document.

use crate::inbound::http::admin::{
    AccountResponse, AssignRoleRequest, CreateAccountRequest, CreateRoleRequest,
    ResetPasswordRequest, RoleResponse,
};
use crate::inbound::http::auth::{CurrentUserResponse, LoginRequest, PrincipalResponse};
use crate::inbound::http::dashboard::DashboardResponse;
use crate::inbound::http::schemas::{CapabilitySetSchema, ErrorCodeSchema, ErrorSchema};
use crate::inbound::http::sensor_data::{
    IngestRecord, IngestResponse, ReadingResponse, StatsResponse,
};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /auth/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Telemetry dashboard API",
        description = "Session-authenticated telemetry reads, export, ingestion and role administration."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::logout,
        crate::inbound::http::auth::me,
        crate::inbound::http::dashboard::dashboard,
        crate::inbound::http::sensor_data::list_readings,
        crate::inbound::http::sensor_data::latest_readings,
        crate::inbound::http::sensor_data::reading_stats,
        crate::inbound::http::sensor_data::export_readings,
        crate::inbound::http::sensor_data::ingest_readings,
        crate::inbound::http::admin::list_users,
        crate::inbound::http::admin::create_user,
        crate::inbound::http::admin::delete_user,
        crate::inbound::http::admin::reset_password,
        crate::inbound::http::admin::assign_role,
        crate::inbound::http::admin::list_roles,
        crate::inbound::http::admin::create_role,
        crate::inbound::http::admin::update_permissions,
        crate::inbound::http::admin::delete_role,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        CapabilitySetSchema,
        LoginRequest,
        PrincipalResponse,
        CurrentUserResponse,
        DashboardResponse,
        ReadingResponse,
        StatsResponse,
        IngestRecord,
        IngestResponse,
        AccountResponse,
        RoleResponse,
        CreateAccountRequest,
        ResetPasswordRequest,
        AssignRoleRequest,
        CreateRoleRequest,
    )),
    tags(
        (name = "auth", description = "Login, logout and the current principal"),
        (name = "dashboard", description = "Panel visibility for the current principal"),
        (name = "telemetry", description = "Sensor readings, statistics, export and ingestion"),
        (name = "admin", description = "Account and role administration"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
