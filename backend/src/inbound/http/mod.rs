//! HTTP inbound adapter exposing REST endpoints.

use actix_web::web;

pub mod admin;
pub mod auth;
pub mod authorized;
pub mod dashboard;
pub mod error;
pub mod health;
pub mod ingest_policy;
pub mod schemas;
pub mod sensor_data;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;

pub use error::ApiResult;

/// Register every REST handler and health check on `cfg`.
///
/// Session middleware is applied by the caller so the WebSocket entry can
/// share it.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(auth::login)
        .service(auth::logout)
        .service(auth::me)
        .service(dashboard::dashboard)
        .service(sensor_data::list_readings)
        .service(sensor_data::latest_readings)
        .service(sensor_data::reading_stats)
        .service(sensor_data::export_readings)
        .service(sensor_data::ingest_readings)
        .service(admin::list_users)
        .service(admin::create_user)
        .service(admin::delete_user)
        .service(admin::reset_password)
        .service(admin::assign_role)
        .service(admin::list_roles)
        .service(admin::create_role)
        .service(admin::update_permissions)
        .service(admin::delete_role)
        .service(health::ready)
        .service(health::live);
}
