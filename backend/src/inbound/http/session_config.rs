//! Session cookie settings read from the environment.
//!
//! Development tolerates missing or malformed values with a warning.
//! Production refuses to start without an explicit, valid configuration.

use actix_web::cookie::{Key, SameSite};
use mockable::Env;
use std::path::PathBuf;
use tracing::warn;
use zeroize::Zeroize;

use crate::domain::DeployEnvironment;

const SESSION_KEY_DEFAULT_PATH: &str = "/var/run/secrets/session_key";
const SESSION_KEY_MIN_LEN: usize = 64;
const COOKIE_SECURE_ENV: &str = "SESSION_COOKIE_SECURE";
const ALLOW_EPHEMERAL_ENV: &str = "SESSION_ALLOW_EPHEMERAL";
const KEY_FILE_ENV: &str = "SESSION_KEY_FILE";
const BOOL_EXPECTED: &str = "1|0|true|false|yes|no|y|n";

/// Session settings derived from the environment.
pub struct SessionSettings {
    /// Signing and encryption key for cookie sessions.
    pub key: Key,
    /// Whether session cookies are marked `Secure`.
    pub cookie_secure: bool,
    /// `Lax`, so the cookie rides along on the provider's redirect back to
    /// `/auth/callback`.
    pub same_site: SameSite,
}

impl std::fmt::Debug for SessionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSettings")
            .field("cookie_secure", &self.cookie_secure)
            .field("same_site", &self.same_site)
            .finish_non_exhaustive()
    }
}

/// Errors raised while validating session configuration.
#[derive(thiserror::Error, Debug)]
pub enum SessionConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {name}")]
    MissingEnv {
        /// Variable name.
        name: &'static str,
    },
    /// A variable is present but contains an invalid value.
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// Value that was found.
        value: String,
        /// Description of the accepted values.
        expected: &'static str,
    },
    /// Reading the session key file failed.
    #[error("failed to read session key at {path}: {source}")]
    KeyRead {
        /// Key file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The session key file is too short for production.
    #[error("session key at {path} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        /// Key file path.
        path: PathBuf,
        /// Actual key length in bytes.
        length: usize,
        /// Minimum accepted length in bytes.
        min_len: usize,
    },
    /// Production must not run with a throwaway key.
    #[error("SESSION_ALLOW_EPHEMERAL must be 0 in production")]
    EphemeralNotAllowed,
}

/// Build session settings for `environment`.
///
/// # Errors
/// In production, any missing or malformed variable, an unreadable key file,
/// a short key, or `SESSION_ALLOW_EPHEMERAL=1`.
///
/// # Examples
/// ```rust
/// use husky_helpers::domain::DeployEnvironment;
/// use husky_helpers::inbound::http::session_config::session_settings_from_env;
/// use mockable::MockEnv;
///
/// let mut env = MockEnv::new();
/// env.expect_string().returning(|_| None);
/// let settings = session_settings_from_env(&env, DeployEnvironment::Development)
///     .expect("development tolerates defaults");
/// assert!(settings.cookie_secure);
/// ```
pub fn session_settings_from_env<E: Env>(
    env: &E,
    environment: DeployEnvironment,
) -> Result<SessionSettings, SessionConfigError> {
    let lenient = environment == DeployEnvironment::Development;
    let cookie_secure = flag_from_env(env, COOKIE_SECURE_ENV, lenient, true)?;
    let allow_ephemeral = flag_from_env(env, ALLOW_EPHEMERAL_ENV, lenient, false)?;
    if allow_ephemeral && !lenient {
        return Err(SessionConfigError::EphemeralNotAllowed);
    }
    let key = session_key_from_env(env, lenient, allow_ephemeral)?;
    Ok(SessionSettings {
        key,
        cookie_secure,
        same_site: SameSite::Lax,
    })
}

fn flag_from_env<E: Env>(
    env: &E,
    name: &'static str,
    lenient: bool,
    default: bool,
) -> Result<bool, SessionConfigError> {
    let Some(value) = env.string(name) else {
        if lenient {
            warn!(variable = name, default, "session flag not set; using default");
            return Ok(default);
        }
        return Err(SessionConfigError::MissingEnv { name });
    };
    match parse_bool(&value) {
        Some(flag) => Ok(flag),
        None if lenient => {
            warn!(variable = name, value = %value, default, "invalid session flag; using default");
            Ok(default)
        }
        None => Err(SessionConfigError::InvalidEnv {
            name,
            value,
            expected: BOOL_EXPECTED,
        }),
    }
}

fn session_key_from_env<E: Env>(
    env: &E,
    lenient: bool,
    allow_ephemeral: bool,
) -> Result<Key, SessionConfigError> {
    let path = PathBuf::from(
        env.string(KEY_FILE_ENV)
            .unwrap_or_else(|| SESSION_KEY_DEFAULT_PATH.to_owned()),
    );
    match std::fs::read(&path) {
        Ok(mut bytes) => {
            let length = bytes.len();
            if !lenient && length < SESSION_KEY_MIN_LEN {
                bytes.zeroize();
                return Err(SessionConfigError::KeyTooShort {
                    path,
                    length,
                    min_len: SESSION_KEY_MIN_LEN,
                });
            }
            let key = Key::derive_from(&bytes);
            bytes.zeroize();
            Ok(key)
        }
        Err(error) if lenient || allow_ephemeral => {
            warn!(
                path = %path.display(),
                error = %error,
                "using temporary session key; sessions end on restart"
            );
            Ok(Key::generate())
        }
        Err(source) => Err(SessionConfigError::KeyRead { path, source }),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "session_config_tests.rs"]
mod tests;
