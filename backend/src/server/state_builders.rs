//! Builds the HTTP state from the configured backend mode.

use std::io;
use std::sync::Arc;

use actix_web::web;
use mockable::Clock;
use tracing::{info, warn};

use husky_helpers::domain::DeployEnvironment;
use husky_helpers::domain::ports::{AuthStateChannel, BackendPorts};
use husky_helpers::inbound::http::state::HttpState;
use husky_helpers::outbound::baas::{self, BaasClient};
use husky_helpers::outbound::memory::MemoryBackend;

use super::config::{BackendMode, ServerConfig};

fn build_ports(config: &ServerConfig, clock: &Arc<dyn Clock>) -> io::Result<BackendPorts> {
    let events = AuthStateChannel::new();
    match &config.backend {
        BackendMode::Hosted { settings, timeout } => {
            let client = BaasClient::new(settings.url.clone(), settings.anon_key.clone(), *timeout)
                .map_err(|err| io::Error::other(format!("backend client setup failed: {err}")))?;
            info!(url = %settings.url, "using hosted backend");
            Ok(baas::backend_ports(&client, events))
        }
        BackendMode::Fixture => {
            if config.policy.environment == DeployEnvironment::Production {
                return Err(io::Error::other(
                    "HUSKY_BAAS_URL and HUSKY_ANON_KEY are required in production",
                ));
            }
            warn!("no hosted backend configured; serving seeded fixture data");
            Ok(MemoryBackend::seeded(clock.clone(), events).ports())
        }
    }
}

/// Assemble the handler state for `config`.
///
/// # Errors
/// Fails when the hosted client cannot be built, or when fixture data is
/// requested in production.
pub(super) fn build_http_state(
    config: &ServerConfig,
    clock: Arc<dyn Clock>,
) -> io::Result<web::Data<HttpState>> {
    let ports = build_ports(config, &clock)?;
    Ok(web::Data::new(HttpState::new(
        ports,
        config.policy.clone(),
        clock,
    )))
}
