//! Handler tests for sign-in, sign-up and the OAuth round trip.

use super::*;
use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test};
use rstest::rstest;
use serde_json::Value;
use url::Url;

use crate::inbound::http::configure;
use crate::inbound::http::test_utils::{
    memory_state, session_cookie, sign_in_cookie, test_session_middleware,
};
use crate::outbound::memory::FIXTURE_PASSWORD;

async fn app() -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>
{
    let (state, _backend) = memory_state();
    actix_test::init_service(
        App::new()
            .app_data(state)
            .wrap(test_session_middleware())
            .configure(configure),
    )
    .await
}

fn location<B>(res: &ServiceResponse<B>) -> String {
    res.headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .expect("location header")
        .to_owned()
}

#[rstest]
#[actix_web::test]
async fn sign_in_starts_a_session_seen_by_the_header() {
    let app = app().await;
    let cookie = sign_in_cookie(&app, "Harry@UW.edu").await;

    let req = actix_test::TestRequest::get()
        .uri("/api/v1/auth/me?path=/profile")
        .cookie(cookie)
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["userName"], "Harry Husky");
    assert_eq!(body["authAction"]["label"], "Sign Out");
}

#[rstest]
#[actix_web::test]
async fn wrong_password_is_unauthorised() {
    let app = app().await;
    let req = actix_test::TestRequest::post()
        .uri("/api/v1/auth/sign-in")
        .set_json(json!({ "email": "harry@uw.edu", "password": "nope-nope" }))
        .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(session_cookie(&res).is_none_or(|cookie| cookie.value().is_empty()));
}

#[rstest]
#[actix_web::test]
async fn outside_domain_sign_in_is_forbidden() {
    let app = app().await;
    let req = actix_test::TestRequest::post()
        .uri("/api/v1/auth/sign-in")
        .set_json(json!({ "email": "guest@gmail.com", "password": FIXTURE_PASSWORD }))
        .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["message"], "Sign in restricted to @uw.edu email addresses.");
    assert_eq!(body["details"]["reason"], "domain_restricted");
}

#[rstest]
#[case("", "pw123456", "email")]
#[case("someone@uw.edu", "", "password")]
#[actix_web::test]
async fn blank_credentials_name_the_field(
    #[case] email: &str,
    #[case] password: &str,
    #[case] field: &str,
) {
    let app = app().await;
    let req = actix_test::TestRequest::post()
        .uri("/api/v1/auth/sign-in")
        .set_json(json!({ "email": email, "password": password }))
        .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["details"]["field"], field);
}

#[rstest]
#[actix_web::test]
async fn gmail_sign_up_is_refused() {
    let app = app().await;
    let req = actix_test::TestRequest::post()
        .uri("/api/v1/auth/sign-up")
        .set_json(json!({ "email": "new@gmail.com", "password": "secret123", "fullName": "New" }))
        .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[rstest]
#[actix_web::test]
async fn sign_up_signs_the_member_in() {
    let app = app().await;
    let req = actix_test::TestRequest::post()
        .uri("/api/v1/auth/sign-up")
        .set_json(json!({ "email": "new@uw.edu", "password": "secret123", "fullName": " Pat " }))
        .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let cookie = session_cookie(&res).expect("session cookie");
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["signedIn"], true);
    assert_eq!(body["message"], SIGN_UP_MESSAGE);

    let req = actix_test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .cookie(cookie)
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["userName"], "Pat");
}

#[rstest]
#[actix_web::test]
async fn sign_out_revokes_the_session() {
    let app = app().await;
    let cookie = sign_in_cookie(&app, "harry@uw.edu").await;

    let req = actix_test::TestRequest::post()
        .uri("/api/v1/auth/sign-out")
        .cookie(cookie.clone())
        .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    // The old cookie still decodes but its token was revoked.
    let req = actix_test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .cookie(cookie)
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["userName"], Value::Null);
}

#[rstest]
#[case(None, Value::Null)]
#[case(Some("domain_restricted"), json!("Sign in restricted to @uw.edu email addresses."))]
#[case(Some("auth_failed"), json!("auth_failed"))]
#[actix_web::test]
async fn login_page_banner(#[case] error: Option<&str>, #[case] banner: Value) {
    let app = app().await;
    let uri = error.map_or_else(
        || "/api/v1/auth/login-message".to_owned(),
        |code| format!("/api/v1/auth/login-message?error={code}"),
    );
    let req = actix_test::TestRequest::get().uri(&uri).to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["banner"], banner);
    assert_eq!(body["allowedDomain"], "uw.edu");
}

#[rstest]
#[actix_web::test]
async fn oauth_round_trip_lands_on_the_requested_page() {
    let app = app().await;
    let req = actix_test::TestRequest::get()
        .uri("/api/v1/auth/oauth?redirect=/profile")
        .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    let verifier_cookie = session_cookie(&res).expect("verifier cookie");
    let consent = Url::parse(&location(&res)).expect("consent url");
    assert_eq!(consent.path(), "/auth/callback");
    let callback = format!("{}?{}", consent.path(), consent.query().unwrap_or_default());

    let req = actix_test::TestRequest::get()
        .uri(&callback)
        .cookie(verifier_cookie)
        .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert!(location(&res).ends_with("/profile"), "{}", location(&res));
    let session = session_cookie(&res).expect("session cookie");

    let req = actix_test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .cookie(session)
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["userName"], "Harry Husky");
}

#[rstest]
#[actix_web::test]
async fn callback_without_verifier_fails() {
    let app = app().await;
    let req = actix_test::TestRequest::get()
        .uri("/auth/callback?code=abc&redirect=/profile")
        .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert!(location(&res).ends_with("/login?error=auth_failed"));
}

#[rstest]
#[actix_web::test]
async fn callback_redirect_cannot_leave_the_site() {
    let app = app().await;
    let req = actix_test::TestRequest::get()
        .uri("/api/v1/auth/oauth?redirect=//evil.example")
        .to_request();
    let res = actix_test::call_service(&app, req).await;
    let consent = Url::parse(&location(&res)).expect("consent url");
    let redirect = consent
        .query_pairs()
        .find(|(key, _)| key == "redirect")
        .map(|(_, value)| value.into_owned());
    assert_eq!(redirect.as_deref(), Some("/"));
}
