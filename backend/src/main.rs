//! Backend entry-point: loads settings, seeds the stores and serves the
//! REST API, the `/ws` channel and OpenAPI docs.

use actix_web::web;
use color_eyre::eyre::{Context, Result, eyre};
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use telemetry_backend::domain::{seed_admin, seed_canonical_roles};
use telemetry_backend::inbound::http::health::HealthState;
use telemetry_backend::inbound::http::session_config::{
    BuildMode, key_fingerprint, session_settings_from_env,
};
use telemetry_backend::server::{Adapters, ServerConfig, create_server};
use telemetry_backend::settings::DashboardSettings;

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings =
        DashboardSettings::load().map_err(|err| eyre!("failed to load settings: {err}"))?;
    let bind_addr = settings.bind_addr().wrap_err("invalid settings")?;
    let policies = settings.adapter_policies().wrap_err("invalid settings")?;

    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .wrap_err("invalid session configuration")?;
    info!(
        fingerprint = %key_fingerprint(&session.key),
        cookie_secure = session.cookie_secure,
        "session key loaded"
    );

    let adapters = Adapters::in_memory();
    seed_canonical_roles(adapters.directory.as_ref())
        .await
        .wrap_err("seeding canonical roles failed")?;
    if let Some(password) = settings.admin_password() {
        seed_admin(
            adapters.directory.as_ref(),
            adapters.directory.as_ref(),
            adapters.hasher.as_ref(),
            password,
        )
        .await
        .wrap_err("seeding the admin account failed")?;
    }

    info!(
        %bind_addr,
        ingest_policy = %policies.ingest,
        room_policy = %policies.room,
        "starting server"
    );
    let config = ServerConfig::new(session.key, session.cookie_secure, session.same_site, bind_addr)
        .with_cors(policies.cors)
        .with_ingest_policy(policies.ingest)
        .with_room_policy(policies.room)
        .with_outbox_capacity(policies.outbox_capacity);

    let health_state = web::Data::new(HealthState::new());
    create_server(health_state, config, &adapters)?.await?;
    Ok(())
}
