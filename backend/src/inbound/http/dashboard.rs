//! Dashboard access map.
//!
//! ```text
//! GET /dashboard
//! ```

use actix_web::{get, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{CapabilitySet, PanelNumber};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::current_principal;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Which parts of the dashboard the current principal may see or use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DashboardResponse {
    #[schema(example = "ada")]
    pub username: String,
    #[schema(example = "Operator")]
    pub role_name: Option<String>,
    pub panel_1: bool,
    pub panel_2: bool,
    pub panel_3: bool,
    pub panel_4: bool,
    pub can_export: bool,
    pub can_edit: bool,
    pub is_admin: bool,
    pub can_view_access_logs: bool,
}

impl DashboardResponse {
    fn new(username: String, role_name: Option<String>, set: &CapabilitySet) -> Self {
        let [p1, p2, p3, p4] = PanelNumber::ALL.map(|panel| set.can_view_panel(panel));
        Self {
            username,
            role_name,
            panel_1: p1,
            panel_2: p2,
            panel_3: p3,
            panel_4: p4,
            can_export: set.export_data,
            can_edit: set.edit_data,
            is_admin: set.manage_users,
            can_view_access_logs: set.view_access_logs,
        }
    }
}

/// Panel visibility and action flags for the logged-in principal.
#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Access map", body = DashboardResponse),
        (status = 401, description = "Not logged in", body = ErrorSchema),
        (status = 503, description = "Role store unavailable", body = ErrorSchema)
    ),
    tags = ["dashboard"],
    operation_id = "dashboard"
)]
#[get("/dashboard")]
pub async fn dashboard(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<DashboardResponse>> {
    let principal = current_principal(&state, &session).await?;
    let profile = state.access.profile(&principal).await?;
    Ok(web::Json(DashboardResponse::new(
        principal.username().to_string(),
        profile.role.map(|role| role.name.to_string()),
        &profile.capabilities.effective(),
    )))
}
