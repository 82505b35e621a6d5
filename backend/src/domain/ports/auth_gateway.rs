//! Port for the hosted authentication service.
//!
//! The gateway owns identity: password sign-in and sign-up, the OAuth
//! authorisation-code flow with PKCE, token introspection and sign-out.
//! Adapters publish [`AuthEvent`]s on an [`AuthStateChannel`] whenever a
//! session starts or ends.

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::debug;
use url::Url;

use crate::domain::auth::{Credentials, OAuthStart, PkceVerifier, SignUpDetails};
use crate::domain::user::{AccessToken, AuthSession, AuthUser, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by auth gateway adapters.
    pub enum AuthGatewayError {
        /// The auth service could not be reached or timed out.
        Unavailable { message: String } =>
            ServiceUnavailable: "auth service unavailable: {message}",
        /// Credentials, token or code were refused.
        Rejected { message: String } => Unauthorized: "{message}",
        /// The request was malformed, e.g. a weak password.
        InvalidRequest { message: String } => InvalidRequest: "{message}",
        /// The response did not have the expected shape.
        Decode { message: String } =>
            InternalError: "auth response could not be decoded: {message}",
    }
}

/// Result of a sign-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// Email confirmation is off; the user is signed in straight away.
    SignedIn(AuthSession),
    /// The user must confirm their email before signing in.
    ConfirmationRequired(AuthUser),
}

impl SignUpOutcome {
    /// The new user either way.
    #[must_use]
    pub fn user(&self) -> &AuthUser {
        match self {
            Self::SignedIn(session) => &session.user,
            Self::ConfirmationRequired(user) => user,
        }
    }
}

/// A change in authentication state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// A session started.
    SignedIn(AuthUser),
    /// A session ended. The user is unknown when only a token was presented.
    SignedOut(Option<UserId>),
}

/// Fan-out of [`AuthEvent`]s to any number of subscribers.
#[derive(Debug, Clone)]
pub struct AuthStateChannel {
    sender: broadcast::Sender<AuthEvent>,
}

impl AuthStateChannel {
    const CAPACITY: usize = 64;

    /// A channel with no subscribers yet.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(Self::CAPACITY);
        Self { sender }
    }

    /// Subscribe to future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.sender.subscribe()
    }

    /// Publish an event. Having no subscribers is fine.
    pub fn publish(&self, event: AuthEvent) {
        if self.sender.send(event).is_err() {
            debug!("auth event dropped: no subscribers");
        }
    }
}

impl Default for AuthStateChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Port for the hosted auth service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Register a new account with `full_name` stored as user metadata.
    async fn sign_up(&self, details: &SignUpDetails) -> Result<SignUpOutcome, AuthGatewayError>;

    /// Exchange email and password for a session.
    async fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthSession, AuthGatewayError>;

    /// Provider consent URL for an OAuth sign-in.
    fn oauth_authorize_url(&self, start: &OAuthStart) -> Result<Url, AuthGatewayError>;

    /// Complete an OAuth sign-in by trading the authorisation code.
    async fn exchange_code_for_session(
        &self,
        code: &str,
        verifier: &PkceVerifier,
    ) -> Result<AuthSession, AuthGatewayError>;

    /// The user a token belongs to, or `None` once it is no longer valid.
    async fn current_user(&self, token: &AccessToken)
    -> Result<Option<AuthUser>, AuthGatewayError>;

    /// Revoke the session behind `token`.
    async fn sign_out(&self, token: &AccessToken) -> Result<(), AuthGatewayError>;

    /// Watch sign-in and sign-out events.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}
