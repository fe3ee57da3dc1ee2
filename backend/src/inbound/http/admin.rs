//! Account and role administration handlers. Every route requires the
//! `ManageUsers` capability, checked by the domain services.
//!
//! ```text
//! GET    /admin/users
//! POST   /admin/users                {"username":"ada","password":"pw","role_id":2}
//! DELETE /admin/users/{id}
//! POST   /admin/users/{id}/password  {"new_password":"pw2"}
//! PUT    /admin/users/{id}/role      {"role_id":3}
//! GET    /admin/roles
//! POST   /admin/roles                {"name":"Contractor"}
//! PUT    /admin/roles/{id}/permissions {"can_view_panel_1":true}
//! DELETE /admin/roles/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::domain::ports::{AccountSummary, NewAccountRequest};
use crate::domain::{CapabilitySet, Error, RoleEntry, RoleId, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::current_principal;
use crate::inbound::http::schemas::{CapabilitySetSchema, ErrorSchema};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

const USER_NOT_FOUND: &str = "User not found";

/// Account row in the admin listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AccountResponse {
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub id: String,
    #[schema(example = "ada")]
    pub username: String,
    #[schema(example = 2)]
    pub role_id: u32,
    /// `None` when the role no longer exists.
    #[schema(example = "Audit")]
    pub role_name: Option<String>,
}

impl From<AccountSummary> for AccountResponse {
    fn from(value: AccountSummary) -> Self {
        Self {
            id: value.principal.id().to_string(),
            username: value.principal.username().to_string(),
            role_id: value.principal.role_id().get(),
            role_name: value.role_name.map(|name| name.to_string()),
        }
    }
}

/// Role row with its capability set; `capabilities` is `null` for a role
/// that has never been granted anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RoleResponse {
    #[schema(example = 5)]
    pub id: u32,
    #[schema(example = "Manager")]
    pub name: String,
    #[schema(value_type = Option<CapabilitySetSchema>)]
    pub capabilities: Option<CapabilitySet>,
}

impl From<RoleEntry> for RoleResponse {
    fn from(value: RoleEntry) -> Self {
        Self {
            id: value.role.id.get(),
            name: value.role.name.to_string(),
            capabilities: value.capabilities.as_defined().copied(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateAccountRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub role_id: Option<u32>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct AssignRoleRequest {
    pub role_id: u32,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateRoleRequest {
    #[serde(default)]
    pub name: String,
}

/// Path ids that are not UUIDs cannot name an account.
fn parse_user_id(raw: &str) -> Result<UserId, Error> {
    UserId::new(raw).map_err(|_| Error::not_found(USER_NOT_FOUND))
}

#[utoipa::path(
    get,
    path = "/admin/users",
    responses(
        (status = 200, description = "Accounts", body = [AccountResponse]),
        (status = 401, description = "Not logged in", body = ErrorSchema),
        (status = 403, description = "Missing ManageUsers", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "listAccounts"
)]
#[get("/admin/users")]
pub async fn list_users(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<AccountResponse>>> {
    let actor = current_principal(&state, &session).await?;
    let accounts = state.users.list_accounts(&actor).await?;
    Ok(web::Json(
        accounts.into_iter().map(AccountResponse::from).collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/admin/users",
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account created", body = AccountResponse),
        (status = 400, description = "Blank field or missing role", body = ErrorSchema),
        (status = 403, description = "Missing ManageUsers", body = ErrorSchema),
        (status = 404, description = "Unknown role", body = ErrorSchema),
        (status = 409, description = "Username taken", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "createAccount"
)]
#[post("/admin/users")]
pub async fn create_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateAccountRequest>,
) -> ApiResult<HttpResponse> {
    let actor = current_principal(&state, &session).await?;
    let CreateAccountRequest {
        username,
        password,
        role_id,
    } = payload.into_inner();
    let role_id = role_id.ok_or_else(|| Error::invalid_request("Role is required"))?;
    let created = state
        .users
        .create_account(
            &actor,
            NewAccountRequest {
                username,
                password,
                role_id: RoleId::new(role_id),
            },
        )
        .await?;
    Ok(HttpResponse::Created().json(AccountResponse::from(created)))
}

#[utoipa::path(
    delete,
    path = "/admin/users/{id}",
    params(("id" = String, Path, description = "Account id")),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 400, description = "Attempt to delete yourself", body = ErrorSchema),
        (status = 403, description = "Missing ManageUsers", body = ErrorSchema),
        (status = 404, description = "Unknown account", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "deleteAccount"
)]
#[delete("/admin/users/{id}")]
pub async fn delete_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let actor = current_principal(&state, &session).await?;
    let target = parse_user_id(&path)?;
    state.users.delete_account(&actor, &target).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    post,
    path = "/admin/users/{id}/password",
    params(("id" = String, Path, description = "Account id")),
    request_body = ResetPasswordRequest,
    responses(
        (status = 204, description = "Password replaced"),
        (status = 400, description = "Blank password", body = ErrorSchema),
        (status = 403, description = "Missing ManageUsers", body = ErrorSchema),
        (status = 404, description = "Unknown account", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "resetPassword"
)]
#[post("/admin/users/{id}/password")]
pub async fn reset_password(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<ResetPasswordRequest>,
) -> ApiResult<HttpResponse> {
    let actor = current_principal(&state, &session).await?;
    let target = parse_user_id(&path)?;
    state
        .users
        .reset_password(&actor, &target, payload.into_inner().new_password)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    put,
    path = "/admin/users/{id}/role",
    params(("id" = String, Path, description = "Account id")),
    request_body = AssignRoleRequest,
    responses(
        (status = 200, description = "Role reassigned", body = AccountResponse),
        (status = 403, description = "Missing ManageUsers", body = ErrorSchema),
        (status = 404, description = "Unknown account or role", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "assignRole"
)]
#[put("/admin/users/{id}/role")]
pub async fn assign_role(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<AssignRoleRequest>,
) -> ApiResult<web::Json<AccountResponse>> {
    let actor = current_principal(&state, &session).await?;
    let target = parse_user_id(&path)?;
    let updated = state
        .users
        .assign_role(&actor, &target, RoleId::new(payload.role_id))
        .await?;
    Ok(web::Json(AccountResponse::from(updated)))
}

#[utoipa::path(
    get,
    path = "/admin/roles",
    responses(
        (status = 200, description = "Roles", body = [RoleResponse]),
        (status = 403, description = "Missing ManageUsers", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "listRoles"
)]
#[get("/admin/roles")]
pub async fn list_roles(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<RoleResponse>>> {
    let actor = current_principal(&state, &session).await?;
    let roles = state.roles.list_roles(&actor).await?;
    Ok(web::Json(roles.into_iter().map(RoleResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/admin/roles",
    request_body = CreateRoleRequest,
    responses(
        (status = 201, description = "Role created without capabilities", body = RoleResponse),
        (status = 400, description = "Blank name", body = ErrorSchema),
        (status = 403, description = "Missing ManageUsers", body = ErrorSchema),
        (status = 409, description = "Name taken", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "createRole"
)]
#[post("/admin/roles")]
pub async fn create_role(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateRoleRequest>,
) -> ApiResult<HttpResponse> {
    let actor = current_principal(&state, &session).await?;
    let created = state
        .roles
        .create_role(&actor, payload.into_inner().name)
        .await?;
    Ok(HttpResponse::Created().json(RoleResponse::from(created)))
}

#[utoipa::path(
    put,
    path = "/admin/roles/{id}/permissions",
    params(("id" = u32, Path, description = "Role id")),
    request_body = CapabilitySetSchema,
    responses(
        (status = 200, description = "Capabilities replaced", body = RoleResponse),
        (status = 403, description = "Missing ManageUsers", body = ErrorSchema),
        (status = 404, description = "Unknown role", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "updatePermissions"
)]
#[put("/admin/roles/{id}/permissions")]
pub async fn update_permissions(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<u32>,
    payload: web::Json<CapabilitySet>,
) -> ApiResult<web::Json<RoleResponse>> {
    let actor = current_principal(&state, &session).await?;
    let role_id = RoleId::new(path.into_inner());
    let updated = state
        .roles
        .update_capabilities(&actor, role_id, payload.into_inner())
        .await?;
    info!(actor = %actor.id(), %role_id, "role capabilities replaced");
    Ok(web::Json(RoleResponse::from(updated)))
}

#[utoipa::path(
    delete,
    path = "/admin/roles/{id}",
    params(("id" = u32, Path, description = "Role id")),
    responses(
        (status = 204, description = "Role deleted"),
        (status = 403, description = "Missing ManageUsers", body = ErrorSchema),
        (status = 404, description = "Unknown role", body = ErrorSchema),
        (status = 409, description = "Role still assigned", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "deleteRole"
)]
#[delete("/admin/roles/{id}")]
pub async fn delete_role(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<u32>,
) -> ApiResult<HttpResponse> {
    let actor = current_principal(&state, &session).await?;
    state
        .roles
        .delete_role(&actor, RoleId::new(path.into_inner()))
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
#[path = "admin_tests.rs"]
mod tests;
