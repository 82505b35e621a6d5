//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::time::Duration;

use actix_web::cookie::{Key, SameSite};
use husky_helpers::config::BaasSettings;
use husky_helpers::inbound::http::state::AuthPolicy;

/// Where the driven ports come from.
#[derive(Debug, Clone)]
pub enum BackendMode {
    /// The hosted project, called over HTTP.
    Hosted {
        /// Project URL and anon key.
        settings: BaasSettings,
        /// Per-request timeout.
        timeout: Duration,
    },
    /// Seeded in-memory adapters; development only.
    Fixture,
}

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) policy: AuthPolicy,
    pub(crate) backend: BackendMode,
}

impl ServerConfig {
    /// Construct a server configuration backed by the fixture adapters.
    #[must_use]
    pub fn new(
        key: Key,
        cookie_secure: bool,
        same_site: SameSite,
        bind_addr: SocketAddr,
        policy: AuthPolicy,
    ) -> Self {
        Self {
            key,
            cookie_secure,
            same_site,
            bind_addr,
            policy,
            backend: BackendMode::Fixture,
        }
    }

    /// Talk to the hosted project instead of the fixture adapters.
    #[must_use]
    pub fn with_baas(mut self, settings: BaasSettings, timeout: Duration) -> Self {
        self.backend = BackendMode::Hosted { settings, timeout };
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub const fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
