//! OAuth callback: trade the code for a session, apply the domain rule and
//! pick the redirect.

use tracing::{info, warn};

use crate::domain::auth::{
    Caller, CallbackFailure, CallbackOrigin, EmailDomain, PkceVerifier, RedirectPath,
};
use crate::domain::ports::BackendPorts;
use crate::domain::user::AuthSession;

use super::login::{profile_seed, revoke};

/// Where the callback sends the browser, and the session to keep if any.
#[derive(Debug)]
pub struct CallbackOutcome {
    /// Absolute redirect target.
    pub location: String,
    /// Session to store; `None` after any failure.
    pub session: Option<AuthSession>,
}

impl CallbackOutcome {
    fn failed(origin: &CallbackOrigin, failure: CallbackFailure) -> Self {
        Self {
            location: origin.failure_target(failure),
            session: None,
        }
    }
}

/// Inputs of one callback request.
#[derive(Debug)]
pub struct CallbackRequest<'a> {
    /// The `code` query parameter.
    pub code: Option<&'a str>,
    /// Verifier stored when the hand-off started.
    pub verifier: Option<&'a PkceVerifier>,
    /// Sanitised `redirect` query parameter.
    pub next: &'a RedirectPath,
    /// Request origin facts.
    pub origin: &'a CallbackOrigin,
}

/// Complete an OAuth sign-in.
///
/// A missing code or failed exchange gives `auth_failed`. A session outside
/// `domain` is signed out once and gives `domain_restricted`. Otherwise the
/// profile row is upserted (failures are only logged) and the browser goes
/// to the requested path.
pub async fn complete(
    ports: &BackendPorts,
    domain: &EmailDomain,
    request: CallbackRequest<'_>,
) -> CallbackOutcome {
    let origin = request.origin;
    let (Some(code), Some(verifier)) = (
        request.code.filter(|code| !code.trim().is_empty()),
        request.verifier,
    ) else {
        warn!("auth callback without code or verifier");
        return CallbackOutcome::failed(origin, CallbackFailure::AuthFailed);
    };
    let session = match ports.auth.exchange_code_for_session(code, verifier).await {
        Ok(session) => session,
        Err(err) => {
            warn!(error = %err, "code exchange failed");
            return CallbackOutcome::failed(origin, CallbackFailure::AuthFailed);
        }
    };
    if !domain.permits(&session.user.email) {
        info!(user = %session.user.id, "sign-in outside allowed domain");
        revoke(ports, &session).await;
        return CallbackOutcome::failed(origin, CallbackFailure::DomainRestricted);
    }
    let caller = Caller::authenticated(session.clone());
    let seed = profile_seed(&session.user);
    if let Err(err) = ports.profiles.upsert_seed(&caller, &seed).await {
        warn!(error = %err, user = %seed.id, "profile upsert after sign-in failed");
    }
    CallbackOutcome {
        location: origin.success_target(request.next),
        session: Some(session),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::auth::DeployEnvironment;
    use crate::domain::pages::test_support::user;
    use crate::domain::pages::test_support::MockPorts;
    use crate::domain::ports::AuthGatewayError;
    use crate::domain::user::AccessToken;
    use rstest::{fixture, rstest};

    #[fixture]
    fn domain() -> EmailDomain {
        EmailDomain::new("uw.edu").expect("domain")
    }

    fn origin(environment: DeployEnvironment) -> CallbackOrigin {
        CallbackOrigin {
            origin: "http://localhost:8080".to_owned(),
            forwarded_host: Some("helpers.example.edu".to_owned()),
            environment,
        }
    }

    fn session_for(email: &str) -> AuthSession {
        let mut member = user("Ann");
        member.email = email.to_owned();
        AuthSession {
            user: member,
            access_token: AccessToken::new("token"),
            refresh_token: None,
        }
    }

    fn exchanging(session: Result<AuthSession, AuthGatewayError>) -> MockPorts {
        let mut mocks = MockPorts::default();
        mocks
            .auth
            .expect_exchange_code_for_session()
            .times(1)
            .returning(move |_, _| session.clone());
        mocks
    }

    #[rstest]
    #[tokio::test]
    async fn missing_code_fails(domain: EmailDomain) {
        let ports = MockPorts::default().into_ports();
        let origin = origin(DeployEnvironment::Development);
        let verifier = PkceVerifier::generate();
        let outcome = complete(
            &ports,
            &domain,
            CallbackRequest {
                code: None,
                verifier: Some(&verifier),
                next: &RedirectPath::root(),
                origin: &origin,
            },
        )
        .await;
        assert_eq!(outcome.location, "http://localhost:8080/login?error=auth_failed");
        assert!(outcome.session.is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn failed_exchange_fails(domain: EmailDomain) {
        let ports = exchanging(Err(AuthGatewayError::rejected("invalid grant"))).into_ports();
        let origin = origin(DeployEnvironment::Development);
        let verifier = PkceVerifier::generate();
        let outcome = complete(
            &ports,
            &domain,
            CallbackRequest {
                code: Some("abc"),
                verifier: Some(&verifier),
                next: &RedirectPath::root(),
                origin: &origin,
            },
        )
        .await;
        assert_eq!(outcome.location, "http://localhost:8080/login?error=auth_failed");
    }

    #[rstest]
    #[tokio::test]
    async fn foreign_domain_is_signed_out_once(domain: EmailDomain) {
        let mut mocks = exchanging(Ok(session_for("student@gmail.com")));
        mocks.auth.expect_sign_out().times(1).returning(|_| Ok(()));
        let ports = mocks.into_ports();
        let origin = origin(DeployEnvironment::Development);
        let verifier = PkceVerifier::generate();
        let outcome = complete(
            &ports,
            &domain,
            CallbackRequest {
                code: Some("abc"),
                verifier: Some(&verifier),
                next: &RedirectPath::root(),
                origin: &origin,
            },
        )
        .await;
        assert_eq!(
            outcome.location,
            "http://localhost:8080/login?error=domain_restricted"
        );
        assert!(outcome.session.is_none());
    }

    #[rstest]
    #[case(DeployEnvironment::Production, "https://helpers.example.edu/profile")]
    #[case(DeployEnvironment::Development, "http://localhost:8080/profile")]
    #[tokio::test]
    async fn member_lands_on_requested_path(
        domain: EmailDomain,
        #[case] environment: DeployEnvironment,
        #[case] expected: &str,
    ) {
        let mut mocks = exchanging(Ok(session_for("husky@uw.edu")));
        mocks
            .profiles
            .expect_upsert_seed()
            .withf(|_, seed| seed.email == "husky@uw.edu" && seed.full_name == "Ann")
            .times(1)
            .returning(|_, _| Ok(()));
        let ports = mocks.into_ports();
        let origin = origin(environment);
        let verifier = PkceVerifier::generate();
        let next = RedirectPath::sanitise(Some("/profile"));
        let outcome = complete(
            &ports,
            &domain,
            CallbackRequest {
                code: Some("abc"),
                verifier: Some(&verifier),
                next: &next,
                origin: &origin,
            },
        )
        .await;
        assert_eq!(outcome.location, expected);
        assert!(outcome.session.is_some());
    }
}
