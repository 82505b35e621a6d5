//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! The encrypted session cookie carries the hosted backend's tokens for the
//! signed-in user and, during an OAuth hand-off, the PKCE verifier.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::auth::PkceVerifier;
use crate::domain::user::{AccessToken, AuthSession, AuthUser, RefreshToken};
use crate::domain::{Caller, Error};

pub(crate) const AUTH_KEY: &str = "auth";
pub(crate) const VERIFIER_KEY: &str = "pkce_verifier";

#[derive(Serialize, Deserialize)]
struct StoredSession {
    user: AuthUser,
    access_token: String,
    refresh_token: Option<String>,
}

impl From<&AuthSession> for StoredSession {
    fn from(session: &AuthSession) -> Self {
        Self {
            user: session.user.clone(),
            access_token: session.access_token.expose().to_owned(),
            refresh_token: session
                .refresh_token
                .as_ref()
                .map(|token| token.expose().to_owned()),
        }
    }
}

impl From<StoredSession> for AuthSession {
    fn from(stored: StoredSession) -> Self {
        Self {
            user: stored.user,
            access_token: AccessToken::new(stored.access_token),
            refresh_token: stored.refresh_token.map(RefreshToken::new),
        }
    }
}

fn write_failed(error: impl std::fmt::Display) -> Error {
    Error::internal(format!("failed to persist session: {error}"))
}

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Wrap the underlying Actix session.
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self(session)
    }

    /// Keep `session` for later requests.
    ///
    /// The cookie id is renewed to avoid fixation.
    pub fn persist(&self, session: &AuthSession) -> Result<(), Error> {
        self.0.renew();
        self.0
            .insert(AUTH_KEY, StoredSession::from(session))
            .map_err(write_failed)
    }

    /// The caller behind this cookie.
    ///
    /// An unreadable session is logged and treated as signed out.
    #[must_use]
    pub fn caller(&self) -> Caller {
        match self.0.get::<StoredSession>(AUTH_KEY) {
            Ok(Some(stored)) => Caller::authenticated(stored.into()),
            Ok(None) => Caller::anonymous(),
            Err(error) => {
                warn!(error = %error, "unreadable auth session in cookie");
                self.0.remove(AUTH_KEY);
                Caller::anonymous()
            }
        }
    }

    /// Forget everything stored for this browser.
    pub fn clear(&self) {
        self.0.purge();
    }

    /// Remember the verifier for an OAuth hand-off in progress.
    pub fn store_verifier(&self, verifier: &PkceVerifier) -> Result<(), Error> {
        self.0
            .insert(VERIFIER_KEY, verifier.expose())
            .map_err(write_failed)
    }

    /// Take the stored verifier; it is single use.
    #[must_use]
    pub fn take_verifier(&self) -> Option<PkceVerifier> {
        match self.0.remove_as::<String>(VERIFIER_KEY) {
            Some(Ok(raw)) => Some(PkceVerifier::from_stored(raw)),
            Some(Err(_)) => {
                warn!("unreadable PKCE verifier in cookie");
                None
            }
            None => None,
        }
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test, web};

    fn session_test_app() -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new().wrap(crate::inbound::http::test_utils::test_session_middleware())
    }

    fn fixture_session() -> AuthSession {
        AuthSession {
            user: AuthUser {
                id: "3fa85f64-5717-4562-b3fc-2c963f66afa6"
                    .parse::<UserId>()
                    .expect("fixture id"),
                email: "ann@uw.edu".to_owned(),
                full_name: "Ann".to_owned(),
            },
            access_token: AccessToken::new("access"),
            refresh_token: Some(RefreshToken::new("refresh")),
        }
    }

    #[actix_web::test]
    async fn round_trips_the_auth_session() {
        let app = test::init_service(
            session_test_app()
                .route(
                    "/set",
                    web::get().to(|session: SessionContext| async move {
                        session.persist(&fixture_session())?;
                        Ok::<_, Error>(HttpResponse::Ok())
                    }),
                )
                .route(
                    "/get",
                    web::get().to(|session: SessionContext| async move {
                        let caller = session.caller();
                        let token = caller
                            .access_token()
                            .map(|t| t.expose().to_owned())
                            .unwrap_or_default();
                        HttpResponse::Ok().body(token)
                    }),
                ),
        )
        .await;

        let set_res =
            test::call_service(&app, test::TestRequest::get().uri("/set").to_request()).await;
        assert_eq!(set_res.status(), StatusCode::OK);
        let cookie = set_res
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .expect("session cookie set")
            .into_owned();

        let get_res = test::call_service(
            &app,
            test::TestRequest::get().uri("/get").cookie(cookie).to_request(),
        )
        .await;
        assert_eq!(test::read_body(get_res).await, "access");
    }

    #[actix_web::test]
    async fn missing_session_is_anonymous() {
        let app = test::init_service(session_test_app().route(
            "/require",
            web::get().to(|session: SessionContext| async move {
                session.caller().require_user()?;
                Ok::<_, Error>(HttpResponse::Ok())
            }),
        ))
        .await;

        let res =
            test::call_service(&app, test::TestRequest::get().uri("/require").to_request()).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn tampered_session_is_anonymous() {
        let app = test::init_service(
            session_test_app()
                .route(
                    "/set-invalid",
                    web::get().to(|session: Session| async move {
                        session
                            .insert(AUTH_KEY, "not-a-session")
                            .expect("set invalid session");
                        HttpResponse::Ok()
                    }),
                )
                .route(
                    "/require",
                    web::get().to(|session: SessionContext| async move {
                        session.caller().require_user()?;
                        Ok::<_, Error>(HttpResponse::Ok())
                    }),
                ),
        )
        .await;

        let set_res = test::call_service(
            &app,
            test::TestRequest::get().uri("/set-invalid").to_request(),
        )
        .await;
        let cookie = set_res
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .expect("session cookie set")
            .into_owned();

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/require")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn verifier_is_single_use() {
        let app = test::init_service(
            session_test_app()
                .route(
                    "/start",
                    web::get().to(|session: SessionContext| async move {
                        session.store_verifier(&PkceVerifier::from_stored("v-123"))?;
                        Ok::<_, Error>(HttpResponse::Ok())
                    }),
                )
                .route(
                    "/take",
                    web::get().to(|session: SessionContext| async move {
                        let first = session.take_verifier().map(|v| v.expose().to_owned());
                        let second = session.take_verifier();
                        HttpResponse::Ok().body(format!(
                            "{}:{}",
                            first.unwrap_or_default(),
                            second.is_some()
                        ))
                    }),
                ),
        )
        .await;

        let start =
            test::call_service(&app, test::TestRequest::get().uri("/start").to_request()).await;
        let cookie = start
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .expect("session cookie set")
            .into_owned();
        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/take").cookie(cookie).to_request(),
        )
        .await;
        assert_eq!(test::read_body(res).await, "v-123:false");
    }
}
