//! Authentication primitives and the institutional sign-in policy.
//!
//! Inbound adapters parse raw strings through the constructors here before
//! anything reaches a port. The email-domain rule is the one access decision
//! the application makes itself; everything else is enforced by the hosted
//! backend's row-level security.

use std::fmt;
use std::str::FromStr;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;
use uuid::Uuid;
use zeroize::Zeroizing;

use super::Error;
use super::user::{AccessToken, AuthSession, AuthUser, UserId};

/// Domain error returned when credential payloads are invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginValidationError {
    /// Email was missing or blank once trimmed.
    #[error("email must not be empty")]
    EmptyEmail,
    /// Password was blank.
    #[error("password must not be empty")]
    EmptyPassword,
}

/// Validated email and password.
///
/// ## Invariants
/// - `email` is trimmed and non-empty.
/// - `password` is non-empty and kept verbatim.
///
/// # Examples
/// ```
/// use husky_helpers::domain::Credentials;
///
/// let creds = Credentials::try_from_parts(" husky@uw.edu ", "pw").unwrap();
/// assert_eq!(creds.email(), "husky@uw.edu");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    email: String,
    password: Zeroizing<String>,
}

impl Credentials {
    /// Construct credentials from raw inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, LoginValidationError> {
        let trimmed = email.trim();
        if trimmed.is_empty() {
            return Err(LoginValidationError::EmptyEmail);
        }
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }
        Ok(Self {
            email: trimmed.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Login email.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Password as entered.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Sign-up request: credentials plus the name stored as user metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpDetails {
    /// Email and password for the new account.
    pub credentials: Credentials,
    /// Display name, possibly empty.
    pub full_name: String,
}

/// Email suffix that members must sign in with, e.g. `uw.edu`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailDomain(String);

/// Raised when the configured domain is blank.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("allowed email domain must not be empty")]
pub struct EmptyEmailDomain;

impl EmailDomain {
    /// Normalise a configured domain; a leading `@` is accepted.
    pub fn new(domain: &str) -> Result<Self, EmptyEmailDomain> {
        let trimmed = domain.trim().trim_start_matches('@');
        if trimmed.is_empty() {
            return Err(EmptyEmailDomain);
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    /// The bare domain without `@`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Whether `email` ends with `@<domain>`, ignoring ASCII case.
    ///
    /// # Examples
    /// ```
    /// use husky_helpers::domain::EmailDomain;
    ///
    /// let domain = EmailDomain::new("uw.edu").unwrap();
    /// assert!(domain.permits("husky@UW.edu"));
    /// assert!(!domain.permits("student@gmail.com"));
    /// assert!(!domain.permits("sneaky@notuw.edu"));
    /// ```
    #[must_use]
    pub fn permits(&self, email: &str) -> bool {
        let normalised = email.trim().to_ascii_lowercase();
        normalised
            .strip_suffix(self.0.as_str())
            .is_some_and(|local| local.len() > 1 && local.ends_with('@'))
    }

    /// Message shown on the login page after a restricted sign-in.
    #[must_use]
    pub fn restriction_message(&self) -> String {
        format!("Sign in restricted to @{} email addresses.", self.0)
    }
}

impl fmt::Display for EmailDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who is making a request: nobody, or a live session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller(Option<AuthSession>);

impl Caller {
    /// A signed-out visitor.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self(None)
    }

    /// A signed-in member.
    #[must_use]
    pub fn authenticated(session: AuthSession) -> Self {
        Self(Some(session))
    }

    /// The signed-in user, if any.
    #[must_use]
    pub fn user(&self) -> Option<&AuthUser> {
        self.0.as_ref().map(|session| &session.user)
    }

    /// The signed-in user's id, if any.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.user().map(|user| user.id)
    }

    /// Bearer token for backend calls, if signed in.
    #[must_use]
    pub fn access_token(&self) -> Option<&AccessToken> {
        self.0.as_ref().map(|session| &session.access_token)
    }

    /// The full session, if signed in.
    #[must_use]
    pub const fn session(&self) -> Option<&AuthSession> {
        self.0.as_ref()
    }

    /// The signed-in user or an `unauthorized` error.
    pub fn require_user(&self) -> Result<&AuthUser, Error> {
        self.user()
            .ok_or_else(|| Error::unauthorized("login required"))
    }
}

/// PKCE code verifier generated when an OAuth hand-off starts.
///
/// The verifier is stored in the session and replayed during the callback
/// exchange; only the derived challenge leaves the server.
#[derive(Clone, PartialEq, Eq)]
pub struct PkceVerifier(Zeroizing<String>);

impl PkceVerifier {
    /// Generate a fresh 64-character verifier.
    #[must_use]
    pub fn generate() -> Self {
        let raw = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        Self(Zeroizing::new(raw))
    }

    /// Restore a verifier previously stored in the session.
    #[must_use]
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    /// Raw verifier for the code exchange.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    /// S256 challenge: base64url (unpadded) of the SHA-256 digest.
    #[must_use]
    pub fn challenge(&self) -> String {
        URL_SAFE_NO_PAD.encode(Sha256::digest(self.0.as_bytes()))
    }
}

impl fmt::Debug for PkceVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PkceVerifier(<redacted>)")
    }
}

/// Where the server is deployed. Only development trusts its own origin
/// over `X-Forwarded-Host`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployEnvironment {
    /// Local development; no proxy in front.
    Development,
    /// Anything else.
    #[default]
    Production,
}

/// Raised for unknown deployment environment names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown deployment environment: {0}")]
pub struct UnknownEnvironment(pub String);

impl FromStr for DeployEnvironment {
    type Err = UnknownEnvironment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(UnknownEnvironment(s.to_owned())),
        }
    }
}

/// Why an OAuth callback did not produce a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackFailure {
    /// Missing code or a failed exchange.
    AuthFailed,
    /// The email is outside the institutional domain.
    DomainRestricted,
}

impl CallbackFailure {
    /// Value of the `error` query parameter on the login page.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::AuthFailed => "auth_failed",
            Self::DomainRestricted => "domain_restricted",
        }
    }
}

/// Local path to land on after signing in.
///
/// Only same-site absolute paths are kept; anything else becomes `/`.
///
/// # Examples
/// ```
/// use husky_helpers::domain::RedirectPath;
///
/// assert_eq!(RedirectPath::sanitise(Some("/profile")).as_str(), "/profile");
/// assert_eq!(RedirectPath::sanitise(Some("//evil.example")).as_str(), "/");
/// assert_eq!(RedirectPath::sanitise(None).as_str(), "/");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectPath(String);

impl RedirectPath {
    /// Keep `raw` when it is a local path, otherwise fall back to `/`.
    #[must_use]
    pub fn sanitise(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(path)
                if path.starts_with('/')
                    && !path.starts_with("//")
                    && !path.contains('\\')
                    && !path.chars().any(char::is_control) =>
            {
                Self(path.to_owned())
            }
            _ => Self::root(),
        }
    }

    /// The site root.
    #[must_use]
    pub fn root() -> Self {
        Self("/".to_owned())
    }

    /// Borrow the path.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Default for RedirectPath {
    fn default() -> Self {
        Self::root()
    }
}

/// Request facts needed to build callback redirects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackOrigin {
    /// Scheme and authority the request arrived on, e.g. `http://localhost:8080`.
    pub origin: String,
    /// Value of `X-Forwarded-Host`, if present.
    pub forwarded_host: Option<String>,
    /// Deployment environment.
    pub environment: DeployEnvironment,
}

impl CallbackOrigin {
    fn base(&self) -> &str {
        self.origin.trim_end_matches('/')
    }

    /// Redirect target after a completed sign-in.
    ///
    /// Outside development a forwarded host wins and is addressed over HTTPS.
    #[must_use]
    pub fn success_target(&self, path: &RedirectPath) -> String {
        let forwarded = self
            .forwarded_host
            .as_deref()
            .map(str::trim)
            .filter(|host| !host.is_empty());
        match (self.environment, forwarded) {
            (DeployEnvironment::Production, Some(host)) => {
                format!("https://{host}{}", path.as_str())
            }
            _ => format!("{}{}", self.base(), path.as_str()),
        }
    }

    /// Redirect target after a failed sign-in.
    #[must_use]
    pub fn failure_target(&self, failure: CallbackFailure) -> String {
        format!("{}/login?error={}", self.base(), failure.code())
    }
}

/// Parameters for starting an OAuth sign-in with the hosted backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthStart {
    /// Provider name, e.g. `google`.
    pub provider: String,
    /// Callback URL the backend redirects to after consent.
    pub redirect_to: Url,
    /// Hosted-domain hint and account chooser prompt.
    pub query_params: Vec<(String, String)>,
    /// S256 challenge derived from the session's verifier.
    pub code_challenge: String,
}

impl OAuthStart {
    /// Build the hand-off for `provider`, returning to `next` afterwards.
    ///
    /// # Errors
    /// Returns `invalid_request` when `origin` is not an absolute URL.
    pub fn new(
        provider: &str,
        origin: &str,
        next: &RedirectPath,
        domain: &EmailDomain,
        verifier: &PkceVerifier,
    ) -> Result<Self, Error> {
        let mut redirect_to = Url::parse(origin)
            .and_then(|base| base.join("/auth/callback"))
            .map_err(|err| Error::invalid_request(format!("invalid origin: {err}")))?;
        redirect_to
            .query_pairs_mut()
            .append_pair("redirect", next.as_str());
        Ok(Self {
            provider: provider.to_owned(),
            redirect_to,
            query_params: vec![
                ("prompt".to_owned(), "select_account".to_owned()),
                ("hd".to_owned(), domain.as_str().to_owned()),
            ],
            code_challenge: verifier.challenge(),
        })
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
