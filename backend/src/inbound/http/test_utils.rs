//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_http::Request;
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{test as actix_test, web};
use mockable::DefaultClock;
use serde_json::json;

use crate::domain::ports::AuthStateChannel;
use crate::domain::{DeployEnvironment, EmailDomain};
use crate::inbound::http::state::{AuthPolicy, HttpState};
use crate::outbound::memory::{FIXTURE_PASSWORD, MemoryBackend};

/// Name of the session cookie in tests.
pub const SESSION_COOKIE: &str = "session";

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name(SESSION_COOKIE.to_owned())
        .cookie_secure(false)
        .build()
}

/// Sign-in rules for tests: `uw.edu`, Google, development.
pub fn test_policy() -> AuthPolicy {
    AuthPolicy {
        domain: EmailDomain::new("uw.edu").expect("domain"),
        oauth_provider: "google".to_owned(),
        environment: DeployEnvironment::Development,
    }
}

/// Handler state over a freshly seeded fixture backend.
///
/// The backend is returned too so tests can inspect what was written.
pub fn memory_state() -> (web::Data<HttpState>, MemoryBackend) {
    let backend = MemoryBackend::seeded(Arc::new(DefaultClock), AuthStateChannel::new());
    let state = HttpState::new(backend.ports(), test_policy(), Arc::new(DefaultClock));
    (web::Data::new(state), backend)
}

/// Sign `email` in with the fixture password and return the session cookie.
pub async fn sign_in_cookie<S, B>(app: &S, email: &str) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = actix_test::TestRequest::post()
        .uri("/api/v1/auth/sign-in")
        .set_json(json!({ "email": email, "password": FIXTURE_PASSWORD }))
        .to_request();
    let res = actix_test::call_service(app, req).await;
    assert_eq!(res.status(), StatusCode::OK, "sign-in for {email}");
    session_cookie(&res).expect("session cookie")
}

/// The session cookie set on `res`, if any.
pub fn session_cookie<B>(res: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(Cookie::into_owned)
}
