//! Auth gateway over the hosted backend's `/auth/v1` API.

use async_trait::async_trait;
use reqwest::Method;
use tokio::sync::broadcast;
use tracing::debug;
use url::Url;

use super::client::{BaasClient, Failure};
use super::dto::{
    PasswordGrantDto, PkceGrantDto, SessionDto, SignUpDataDto, SignUpDto, SignUpResponseDto,
    UserDto,
};
use crate::domain::auth::{Credentials, OAuthStart, PkceVerifier, SignUpDetails};
use crate::domain::ports::{
    AuthEvent, AuthGateway, AuthGatewayError, AuthStateChannel, SignUpOutcome,
};
use crate::domain::user::{AccessToken, AuthSession, AuthUser};

impl From<Failure> for AuthGatewayError {
    fn from(failure: Failure) -> Self {
        match failure {
            Failure::Unavailable(message) => Self::unavailable(message),
            Failure::Unauthorized(message) => Self::rejected(message),
            Failure::Rejected(message) => Self::invalid_request(message),
            Failure::Decode(message) => Self::decode(message),
        }
    }
}

// Token grants answer bad credentials and bad codes with a 400.
fn grant_error(failure: Failure) -> AuthGatewayError {
    match failure {
        Failure::Rejected(message) => AuthGatewayError::rejected(message),
        other => other.into(),
    }
}

/// [`AuthGateway`] backed by the hosted auth service.
#[derive(Debug, Clone)]
pub struct BaasAuthGateway {
    client: BaasClient,
    events: AuthStateChannel,
}

impl BaasAuthGateway {
    /// Gateway publishing on a fresh event channel.
    #[must_use]
    pub fn new(client: BaasClient) -> Self {
        Self::with_channel(client, AuthStateChannel::new())
    }

    /// Gateway publishing on `events`.
    #[must_use]
    pub const fn with_channel(client: BaasClient, events: AuthStateChannel) -> Self {
        Self { client, events }
    }

    fn token_url(&self, grant_type: &str) -> Result<Url, Failure> {
        let mut url = self.client.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", grant_type);
        Ok(url)
    }

    async fn grant<B: serde::Serialize + Sync>(
        &self,
        grant_type: &str,
        body: &B,
    ) -> Result<AuthSession, AuthGatewayError> {
        let url = self.token_url(grant_type)?;
        let request = self.client.json_request(Method::POST, url, None).json(body);
        let dto: SessionDto = self.client.fetch(request).await.map_err(grant_error)?;
        let session = AuthSession::from(dto);
        self.events
            .publish(AuthEvent::SignedIn(session.user.clone()));
        Ok(session)
    }
}

/// Provider consent URL with the PKCE challenge and provider hints.
fn authorize_url(base: Url, start: &OAuthStart) -> Url {
    let mut url = base;
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("provider", &start.provider)
            .append_pair("redirect_to", start.redirect_to.as_str())
            .append_pair("code_challenge", &start.code_challenge)
            .append_pair("code_challenge_method", "s256");
        for (key, value) in &start.query_params {
            query.append_pair(key, value);
        }
    }
    url
}

#[async_trait]
impl AuthGateway for BaasAuthGateway {
    async fn sign_up(&self, details: &SignUpDetails) -> Result<SignUpOutcome, AuthGatewayError> {
        let url = self.client.endpoint("auth/v1/signup")?;
        let body = SignUpDto {
            email: details.credentials.email(),
            password: details.credentials.password(),
            data: SignUpDataDto {
                full_name: details.full_name.as_str(),
            },
        };
        let request = self.client.json_request(Method::POST, url, None).json(&body);
        let dto: SignUpResponseDto = self.client.fetch(request).await?;
        Ok(match dto {
            SignUpResponseDto::Session(session) => {
                let session = AuthSession::from(session);
                self.events
                    .publish(AuthEvent::SignedIn(session.user.clone()));
                SignUpOutcome::SignedIn(session)
            }
            SignUpResponseDto::User(user) => SignUpOutcome::ConfirmationRequired(user.into()),
        })
    }

    async fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthSession, AuthGatewayError> {
        let body = PasswordGrantDto {
            email: credentials.email(),
            password: credentials.password(),
        };
        self.grant("password", &body).await
    }

    fn oauth_authorize_url(&self, start: &OAuthStart) -> Result<Url, AuthGatewayError> {
        let base = self.client.endpoint("auth/v1/authorize")?;
        Ok(authorize_url(base, start))
    }

    async fn exchange_code_for_session(
        &self,
        code: &str,
        verifier: &PkceVerifier,
    ) -> Result<AuthSession, AuthGatewayError> {
        let body = PkceGrantDto {
            auth_code: code,
            code_verifier: verifier.expose(),
        };
        self.grant("pkce", &body).await
    }

    async fn current_user(
        &self,
        token: &AccessToken,
    ) -> Result<Option<AuthUser>, AuthGatewayError> {
        let url = self.client.endpoint("auth/v1/user")?;
        let request = self.client.request(Method::GET, url, Some(token));
        match self.client.fetch::<UserDto>(request).await {
            Ok(user) => Ok(Some(user.into())),
            Err(Failure::Unauthorized(message) | Failure::Rejected(message)) => {
                debug!(%message, "access token no longer valid");
                Ok(None)
            }
            Err(other) => Err(other.into()),
        }
    }

    async fn sign_out(&self, token: &AccessToken) -> Result<(), AuthGatewayError> {
        let url = self.client.endpoint("auth/v1/logout")?;
        let request = self.client.request(Method::POST, url, Some(token));
        match self.client.send(request).await {
            Ok(_) | Err(Failure::Unauthorized(_)) => {
                self.events.publish(AuthEvent::SignedOut(None));
                Ok(())
            }
            Err(other) => Err(other.into()),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
