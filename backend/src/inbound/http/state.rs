//! Shared HTTP adapter state.
//!
//! Handlers take this through `web::Data` so they depend only on the driven
//! ports and stay testable without I/O.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::BackendPorts;
use crate::domain::{DeployEnvironment, EmailDomain};

/// Sign-in rules shared by the login and callback handlers.
#[derive(Debug, Clone)]
pub struct AuthPolicy {
    /// Institutional email domain members must use.
    pub domain: EmailDomain,
    /// OAuth provider name passed to the hosted auth service.
    pub oauth_provider: String,
    /// Deployment environment, which decides callback redirects.
    pub environment: DeployEnvironment,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Driven ports.
    pub ports: BackendPorts,
    /// Sign-in rules.
    pub policy: AuthPolicy,
    /// Time source for photo cache busting.
    pub clock: Arc<dyn Clock>,
}

impl HttpState {
    /// Bundle the handler dependencies.
    #[must_use]
    pub fn new(ports: BackendPorts, policy: AuthPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            ports,
            policy,
            clock,
        }
    }
}

impl std::fmt::Debug for HttpState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpState")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
