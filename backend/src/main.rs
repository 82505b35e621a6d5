//! Backend entry-point: loads settings, wires the hosted backend ports and
//! serves the REST API.

mod server;

use actix_web::web;
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use husky_helpers::config::AppSettings;
use husky_helpers::inbound::http::health::HealthState;
use husky_helpers::inbound::http::session_config::session_settings_from_env;
use husky_helpers::inbound::http::state::AuthPolicy;
use server::{ServerConfig, create_server};

fn startup_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(format!("{context}: {err}"))
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load_from_iter(std::env::args_os())
        .map_err(|err| startup_error("failed to load settings", err))?;
    let environment = settings
        .environment()
        .map_err(|err| startup_error("invalid settings", err))?;
    let bind_addr = settings
        .bind_addr()
        .map_err(|err| startup_error("invalid settings", err))?;
    let policy = AuthPolicy {
        domain: settings
            .email_domain()
            .map_err(|err| startup_error("invalid settings", err))?,
        oauth_provider: settings.oauth_provider().to_owned(),
        environment,
    };
    let session = session_settings_from_env(&DefaultEnv::new(), environment)
        .map_err(|err| startup_error("invalid session configuration", err))?;

    let mut config = ServerConfig::new(
        session.key,
        session.cookie_secure,
        session.same_site,
        bind_addr,
        policy,
    );
    if let Some(baas) = settings
        .baas()
        .map_err(|err| startup_error("invalid settings", err))?
    {
        config = config.with_baas(baas, settings.timeout());
    }

    let health_state = web::Data::new(HealthState::new());
    let listen_on = config.bind_addr();
    let server = create_server(health_state, config)?;
    info!(bind_addr = %listen_on, ?environment, "listening");
    server.await
}
