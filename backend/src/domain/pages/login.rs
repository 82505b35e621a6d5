//! Login page: password sign-in, sign-up and the OAuth hand-off.
//!
//! Sign-in and sign-up enforce the institutional email domain before a
//! session is handed back to the caller.

use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};
use url::Url;

use crate::domain::auth::{
    Caller, CallbackFailure, Credentials, EmailDomain, OAuthStart, PkceVerifier, RedirectPath,
    SignUpDetails,
};
use crate::domain::ports::{BackendPorts, SignUpOutcome};
use crate::domain::profile::ProfileSeed;
use crate::domain::user::{AuthSession, AuthUser};
use crate::domain::view_state::{FormPhase, FormState};
use crate::domain::Error;

/// Shown after a successful sign-up.
pub const SIGN_UP_MESSAGE: &str = "Account created! Check your email for a confirmation link, \
                                   or sign in if email confirmation is disabled.";

/// Text for the login page's `error` query parameter.
///
/// `domain_restricted` is expanded to the domain rule; anything else is shown
/// as given. Blank values show nothing.
#[must_use]
pub fn login_error_message(param: Option<&str>, domain: &EmailDomain) -> Option<String> {
    let code = param.map(str::trim).filter(|value| !value.is_empty())?;
    if code == CallbackFailure::DomainRestricted.code() {
        Some(domain.restriction_message())
    } else {
        Some(code.to_owned())
    }
}

/// The `forbidden` error for an email outside the allowed domain.
#[must_use]
pub fn domain_restricted(domain: &EmailDomain) -> Error {
    Error::forbidden(domain.restriction_message())
        .with_details(json!({ "reason": CallbackFailure::DomainRestricted.code() }))
}

/// Seed row making sure a profile exists for `user`.
#[must_use]
pub fn profile_seed(user: &AuthUser) -> ProfileSeed {
    ProfileSeed {
        id: user.id,
        email: user.email.clone(),
        full_name: user.full_name.clone(),
    }
}

/// Login page controller.
#[derive(Debug, Default)]
pub struct LoginController {
    form: FormState,
}

/// Login page as sent to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginSnapshot<'a> {
    /// Submission phase.
    #[serde(flatten)]
    pub phase: &'a FormPhase,
    /// Banner derived from the `error` query parameter.
    pub banner: Option<String>,
    /// Domain members must sign in with.
    pub allowed_domain: &'a str,
}

impl LoginController {
    /// A controller with an untouched form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Submission phase.
    #[must_use]
    pub const fn phase(&self) -> &FormPhase {
        self.form.phase()
    }

    /// Serialisable view of the page.
    #[must_use]
    pub fn snapshot<'a>(
        &'a self,
        error_param: Option<&str>,
        domain: &'a EmailDomain,
    ) -> LoginSnapshot<'a> {
        LoginSnapshot {
            phase: self.form.phase(),
            banner: login_error_message(error_param, domain),
            allowed_domain: domain.as_str(),
        }
    }

    fn settle<T>(&mut self, outcome: Result<T, Error>, success: Option<&str>) -> Result<T, Error> {
        match &outcome {
            Ok(_) => self.form.succeed(success.map(str::to_owned)),
            Err(err) => self.form.fail(err.message()),
        }
        outcome
    }
}

pub(crate) async fn revoke(ports: &BackendPorts, session: &AuthSession) {
    if let Err(err) = ports.auth.sign_out(&session.access_token).await {
        warn!(error = %err, "could not revoke restricted session");
    }
}

async fn password_session(
    ports: &BackendPorts,
    domain: &EmailDomain,
    credentials: &Credentials,
) -> Result<AuthSession, Error> {
    let session = ports.auth.sign_in_with_password(credentials).await?;
    if !domain.permits(&session.user.email) {
        revoke(ports, &session).await;
        return Err(domain_restricted(domain));
    }
    info!(user = %session.user.id, "password sign-in");
    Ok(session)
}

async fn register(
    ports: &BackendPorts,
    domain: &EmailDomain,
    details: &SignUpDetails,
) -> Result<SignUpOutcome, Error> {
    if !domain.permits(details.credentials.email()) {
        return Err(domain_restricted(domain));
    }
    let outcome = ports.auth.sign_up(details).await?;
    let caller = match &outcome {
        SignUpOutcome::SignedIn(session) => Caller::authenticated(session.clone()),
        SignUpOutcome::ConfirmationRequired(_) => Caller::anonymous(),
    };
    let seed = profile_seed(outcome.user());
    if let Err(err) = ports.profiles.upsert_seed(&caller, &seed).await {
        warn!(error = %err, user = %seed.id, "profile seed after sign-up failed");
    }
    info!(user = %seed.id, "account created");
    Ok(outcome)
}

/// Sign in with email and password.
///
/// A session for an email outside `domain` is revoked straight away.
///
/// # Errors
/// `unauthorized` with the backend's message for bad credentials,
/// `forbidden` for a restricted domain, or the backend failure.
pub async fn sign_in(
    controller: &mut LoginController,
    ports: &BackendPorts,
    domain: &EmailDomain,
    credentials: &Credentials,
) -> Result<AuthSession, Error> {
    controller.form.begin_submit()?;
    let outcome = password_session(ports, domain, credentials).await;
    controller.settle(outcome, None)
}

/// Register a new account and make sure its profile row exists.
///
/// Emails outside `domain` are refused before anything is sent.
///
/// # Errors
/// `forbidden` for a restricted domain, or the backend's refusal.
pub async fn sign_up(
    controller: &mut LoginController,
    ports: &BackendPorts,
    domain: &EmailDomain,
    details: &SignUpDetails,
) -> Result<SignUpOutcome, Error> {
    controller.form.begin_submit()?;
    let outcome = register(ports, domain, details).await;
    controller.settle(outcome, Some(SIGN_UP_MESSAGE))
}

/// An OAuth hand-off: where to send the browser, and the verifier to keep.
#[derive(Debug)]
pub struct OAuthRedirect {
    /// Provider consent URL.
    pub url: Url,
    /// Verifier to store in the session until the callback.
    pub verifier: PkceVerifier,
}

/// Start an OAuth sign-in restricted to `domain`.
///
/// # Errors
/// `invalid_request` for a bad origin, or the gateway failure.
pub fn start_oauth(
    ports: &BackendPorts,
    domain: &EmailDomain,
    provider: &str,
    origin: &str,
    next: &RedirectPath,
) -> Result<OAuthRedirect, Error> {
    let verifier = PkceVerifier::generate();
    let start = OAuthStart::new(provider, origin, next, domain, &verifier)?;
    let url = ports.auth.oauth_authorize_url(&start)?;
    Ok(OAuthRedirect { url, verifier })
}

#[cfg(test)]
#[path = "login_tests.rs"]
mod tests;
