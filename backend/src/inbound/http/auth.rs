//! Authentication HTTP handlers.
//!
//! ```text
//! POST /auth/login {"username":"admin","password":"password"}
//! POST /auth/logout
//! GET  /auth/me
//! ```
//!
//! The session cookie only stores a user id. [`current_principal`] turns it
//! back into a [`Principal`] on every request so role changes and deletions
//! take effect immediately.

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::domain::{CapabilitySet, Error, LoginCredentials, LoginValidationError, Principal};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{CapabilitySetSchema, ErrorSchema};
use crate::inbound::http::session::{LOGIN_REQUIRED_MESSAGE, SessionContext};
use crate::inbound::http::state::HttpState;

/// Login request body for `POST /auth/login`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl TryFrom<LoginRequest> for LoginCredentials {
    type Error = LoginValidationError;

    fn try_from(value: LoginRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.username, &value.password)
    }
}

/// Authenticated account as seen by the client.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PrincipalResponse {
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub id: String,
    #[schema(example = "ada")]
    pub username: String,
    #[schema(example = 2)]
    pub role_id: u32,
}

impl From<&Principal> for PrincipalResponse {
    fn from(value: &Principal) -> Self {
        Self {
            id: value.id().to_string(),
            username: value.username().to_string(),
            role_id: value.role_id().get(),
        }
    }
}

/// `GET /auth/me` payload: the principal plus its effective capabilities.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CurrentUserResponse {
    #[serde(flatten)]
    pub principal: PrincipalResponse,
    /// `None` when the role row no longer exists.
    #[schema(example = "Manager")]
    pub role_name: Option<String>,
    #[schema(value_type = CapabilitySetSchema)]
    pub capabilities: CapabilitySet,
}

/// Resolve the session's user into a principal or fail with `401`.
///
/// A session pointing at a deleted account is ended so the stale cookie is
/// dropped by the browser.
pub async fn current_principal(
    state: &HttpState,
    session: &SessionContext,
) -> ApiResult<Principal> {
    let user_id = session.require_user_id()?;
    match state.login.resolve(&user_id).await? {
        Some(principal) => Ok(principal),
        None => {
            warn!(%user_id, "session refers to a missing account");
            session.end();
            Err(Error::unauthorized(LOGIN_REQUIRED_MESSAGE))
        }
    }
}

/// Like [`current_principal`] but anonymous requests yield `None`.
pub async fn optional_principal(
    state: &HttpState,
    session: &SessionContext,
) -> ApiResult<Option<Principal>> {
    let Some(user_id) = session.user_id()? else {
        return Ok(None);
    };
    state.login.resolve(&user_id).await
}

fn map_login_validation_error(err: LoginValidationError) -> Error {
    match err {
        LoginValidationError::EmptyUsername => Error::invalid_request("username must not be empty")
            .with_details(json!({ "field": "username", "code": "empty_username" })),
        LoginValidationError::EmptyPassword => Error::invalid_request("password must not be empty")
            .with_details(json!({ "field": "password", "code": "empty_password" })),
    }
}

/// Authenticate and establish a session.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = PrincipalResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Blank username or password", body = ErrorSchema),
        (status = 401, description = "Invalid credentials", body = ErrorSchema),
        (status = 503, description = "Account store unavailable", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<PrincipalResponse>> {
    let credentials =
        LoginCredentials::try_from(payload.into_inner()).map_err(map_login_validation_error)?;
    let principal = match state.login.authenticate(&credentials).await {
        Ok(principal) => principal,
        Err(err) => {
            info!(username = credentials.username(), code = ?err.code(), "login rejected");
            return Err(err);
        }
    };
    session.persist_user(principal.id())?;
    info!(user_id = %principal.id(), "login succeeded");
    Ok(web::Json(PrincipalResponse::from(&principal)))
}

/// End the current session.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 204, description = "Session ended"),
        (status = 401, description = "Not logged in", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "logout"
)]
#[post("/auth/logout")]
pub async fn logout(session: SessionContext) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    session.end();
    info!(%user_id, "logout");
    Ok(HttpResponse::NoContent().finish())
}

/// Describe the logged-in principal.
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current principal", body = CurrentUserResponse),
        (status = 401, description = "Not logged in", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "currentUser"
)]
#[get("/auth/me")]
pub async fn me(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<CurrentUserResponse>> {
    let principal = current_principal(&state, &session).await?;
    let profile = state.access.profile(&principal).await?;
    Ok(web::Json(CurrentUserResponse {
        principal: PrincipalResponse::from(&principal),
        role_name: profile.role.map(|role| role.name.to_string()),
        capabilities: profile.capabilities.effective(),
    }))
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
