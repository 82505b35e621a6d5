//! Application settings loaded via OrthoConfig.
//!
//! Values come from `HUSKY_*` environment variables, a config file, or the
//! command line. Every field is optional; the accessors apply defaults and
//! validate.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::{DeployEnvironment, EmailDomain};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_EMAIL_DOMAIN: &str = "uw.edu";
const DEFAULT_OAUTH_PROVIDER: &str = "google";

/// Settings that fail validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// The bind address is not `host:port`.
    #[error("invalid bind address {0:?}")]
    BindAddr(String),
    /// The BaaS URL does not parse.
    #[error("invalid BaaS URL {0:?}")]
    BaasUrl(String),
    /// Only one of the BaaS URL and anon key was given.
    #[error("HUSKY_BAAS_URL and HUSKY_ANON_KEY must be set together")]
    IncompleteBaas,
    /// The email domain is blank.
    #[error("email domain must not be empty")]
    EmailDomain,
    /// The environment name is unknown.
    #[error("unknown environment {0:?}; expected development or production")]
    Environment(String),
}

/// Hosted backend project details.
#[derive(Clone, PartialEq, Eq)]
pub struct BaasSettings {
    /// Project URL.
    pub url: Url,
    /// Public anon key sent as `apikey`.
    pub anon_key: String,
}

impl std::fmt::Debug for BaasSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaasSettings")
            .field("url", &self.url.as_str())
            .finish_non_exhaustive()
    }
}

/// Server settings.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "HUSKY")]
pub struct AppSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// Hosted backend project URL.
    pub baas_url: Option<String>,
    /// Hosted backend anon key.
    pub anon_key: Option<String>,
    /// Domain member emails must belong to.
    pub email_domain: Option<String>,
    /// OAuth provider passed to the hosted auth service.
    pub oauth_provider: Option<String>,
    /// `development` or `production`.
    pub environment: Option<String>,
    /// Timeout for calls to the hosted backend, in seconds.
    #[ortho_config(default = 10)]
    pub timeout_secs: u64,
}

fn present(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

impl AppSettings {
    /// Address to bind, defaulting to `0.0.0.0:8080`.
    ///
    /// # Errors
    /// [`SettingsError::BindAddr`] when the value does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = present(self.bind_addr.as_ref()).unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse()
            .map_err(|_| SettingsError::BindAddr(raw.to_owned()))
    }

    /// Hosted backend details, or `None` when neither value is set.
    ///
    /// # Errors
    /// [`SettingsError::IncompleteBaas`] when only one value is set, or
    /// [`SettingsError::BaasUrl`] when the URL does not parse.
    pub fn baas(&self) -> Result<Option<BaasSettings>, SettingsError> {
        match (
            present(self.baas_url.as_ref()),
            present(self.anon_key.as_ref()),
        ) {
            (None, None) => Ok(None),
            (Some(url), Some(key)) => {
                let url = Url::parse(url).map_err(|_| SettingsError::BaasUrl(url.to_owned()))?;
                Ok(Some(BaasSettings {
                    url,
                    anon_key: key.to_owned(),
                }))
            }
            _ => Err(SettingsError::IncompleteBaas),
        }
    }

    /// Allowed email domain, defaulting to `uw.edu`.
    ///
    /// # Errors
    /// [`SettingsError::EmailDomain`] when blank after trimming `@`.
    pub fn email_domain(&self) -> Result<EmailDomain, SettingsError> {
        let raw = self
            .email_domain
            .as_deref()
            .unwrap_or(DEFAULT_EMAIL_DOMAIN);
        EmailDomain::new(raw).map_err(|_| SettingsError::EmailDomain)
    }

    /// OAuth provider, defaulting to `google`.
    #[must_use]
    pub fn oauth_provider(&self) -> &str {
        present(self.oauth_provider.as_ref()).unwrap_or(DEFAULT_OAUTH_PROVIDER)
    }

    /// Deployment environment, defaulting to production.
    ///
    /// # Errors
    /// [`SettingsError::Environment`] for unknown names.
    pub fn environment(&self) -> Result<DeployEnvironment, SettingsError> {
        present(self.environment.as_ref()).map_or(Ok(DeployEnvironment::Production), |raw| {
            raw.parse()
                .map_err(|_| SettingsError::Environment(raw.to_owned()))
        })
    }

    /// Timeout for backend calls, defaulting to ten seconds.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
