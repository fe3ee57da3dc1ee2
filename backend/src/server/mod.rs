//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::ServerConfig;
pub use state_builders::{AdapterPolicies, Adapters, build_http_ports, build_states};

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use crate::Trace;
#[cfg(debug_assertions)]
use crate::doc::ApiDoc;
use crate::domain::ports::PasswordHasher;
use crate::inbound::http;
use crate::inbound::http::health::HealthState;
use crate::inbound::http::state::HttpState;
use crate::inbound::ws;
use crate::inbound::ws::state::WsState;

/// Everything one application instance needs; cloned per worker.
#[derive(Clone)]
pub struct AppDependencies {
    pub health_state: web::Data<HealthState>,
    pub http_state: web::Data<HttpState>,
    pub ws_state: web::Data<WsState>,
    pub key: Key,
    pub cookie_secure: bool,
    pub same_site: SameSite,
}

/// Cookie-backed session middleware. The cookie is private (encrypted) and
/// expires two hours after the last write.
#[must_use]
pub fn session_middleware(
    key: Key,
    cookie_secure: bool,
    same_site: SameSite,
) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".into())
        .cookie_path("/".into())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(same_site)
        .session_lifecycle(
            PersistentSession::default().session_ttl(actix_web::cookie::time::Duration::hours(2)),
        )
        .build()
}

/// Assemble the application: REST routes, the socket entry and health checks.
pub fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        ws_state,
        key,
        cookie_secure,
        same_site,
    } = deps;

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(ws_state)
        .wrap(session_middleware(key, cookie_secure, same_site))
        .wrap(Trace)
        .configure(http::configure)
        .service(ws::ws_entry);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct an Actix HTTP server over the given adapters.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server<H>(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
    adapters: &Adapters<H>,
) -> std::io::Result<Server>
where
    H: PasswordHasher + 'static,
{
    let ServerConfig {
        key,
        cookie_secure,
        same_site,
        bind_addr,
        policies,
    } = config;
    let (http_state, ws_state) = build_states(adapters, policies);
    let http_state = web::Data::new(http_state);
    let ws_state = web::Data::new(ws_state);
    let server_health_state = health_state.clone();

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            ws_state: ws_state.clone(),
            key: key.clone(),
            cookie_secure,
            same_site,
        })
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
