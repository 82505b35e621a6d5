//! Handler tests for the profile page.

use super::*;
use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test};
use rstest::rstest;
use serde_json::Value;

use crate::domain::avatar::AVATAR_BUCKET;
use crate::inbound::http::configure;
use crate::inbound::http::test_utils::{memory_state, sign_in_cookie, test_session_middleware};

const HARRY: &str = "00000000-0000-0000-0000-00005eed0001";
const CALCULUS: &str = "00000000-0000-0000-0000-000000110001";

macro_rules! test_app {
    ($state:expr) => {
        actix_test::init_service(
            App::new()
                .app_data($state)
                .wrap(test_session_middleware())
                .configure(configure),
        )
        .await
    };
}

#[rstest]
#[actix_web::test]
async fn visitors_need_to_sign_in() {
    let (state, _backend) = memory_state();
    let app = test_app!(state);
    let req = actix_test::TestRequest::get().uri("/api/v1/profile").to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[rstest]
#[actix_web::test]
async fn profile_gathers_listings_and_testimonials() {
    let (state, _backend) = memory_state();
    let app = test_app!(state);
    let cookie = sign_in_cookie(&app, "harry@uw.edu").await;

    let req = actix_test::TestRequest::get()
        .uri("/api/v1/profile")
        .cookie(cookie)
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, req).await;
    let profile = &body["profile"];
    assert_eq!(profile["displayName"], "Harry Husky");
    assert_eq!(profile["initials"], "HH");
    assert_eq!(profile["listings"].as_array().map(Vec::len), Some(2));
    assert_eq!(profile["testimonials"].as_array().map(Vec::len), Some(2));
}

#[rstest]
#[case(json!({ "fullName": "  ", "aboutMe": "", "contactInfo": "" }), StatusCode::BAD_REQUEST)]
#[case(json!({ "fullName": " Harold ", "aboutMe": "Hi", "contactInfo": "" }), StatusCode::OK)]
#[actix_web::test]
async fn saving_requires_a_name(#[case] form: Value, #[case] status: StatusCode) {
    let (state, _backend) = memory_state();
    let app = test_app!(state);
    let cookie = sign_in_cookie(&app, "harry@uw.edu").await;

    let req = actix_test::TestRequest::put()
        .uri("/api/v1/profile")
        .cookie(cookie)
        .set_json(form)
        .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), status);
    let body: Value = actix_test::read_body_json(res).await;
    if status == StatusCode::OK {
        assert_eq!(body["profile"]["profile"]["fullName"], "Harold");
        assert_eq!(body["form"]["message"], "Profile updated!");
        assert_eq!(body["editing"], Value::Null);
    } else {
        assert_eq!(body["details"]["field"], "fullName");
    }
}

#[rstest]
#[actix_web::test]
async fn photo_is_stored_under_the_owner() {
    let (state, backend) = memory_state();
    let app = test_app!(state);
    let cookie = sign_in_cookie(&app, "harry@uw.edu").await;

    let req = actix_test::TestRequest::post()
        .uri("/api/v1/profile/photo?fileName=me.png")
        .cookie(cookie)
        .insert_header((CONTENT_TYPE, "image/png"))
        .set_payload(vec![0x89, b'P', b'N', b'G'])
        .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(res).await;
    let url = body["photoUrl"].as_str().unwrap_or_default();
    assert!(url.contains(&format!("{HARRY}/avatar.png?t=")), "{url}");

    let stored = backend.object_info(AVATAR_BUCKET, &format!("{HARRY}/avatar.png"));
    assert_eq!(stored, Some(("image/png".to_owned(), 4)));
}

#[rstest]
#[case("text/plain", vec![1_u8], "Please select an image file.")]
#[case("image/png", Vec::new(), "choose an image to upload")]
#[actix_web::test]
async fn photo_validation(
    #[case] content_type: &str,
    #[case] payload: Vec<u8>,
    #[case] message: &str,
) {
    let (state, _backend) = memory_state();
    let app = test_app!(state);
    let cookie = sign_in_cookie(&app, "harry@uw.edu").await;

    let req = actix_test::TestRequest::post()
        .uri("/api/v1/profile/photo?fileName=notes.txt")
        .cookie(cookie)
        .insert_header((CONTENT_TYPE, content_type))
        .set_payload(payload)
        .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["message"], message);
}

#[rstest]
#[actix_web::test]
async fn saved_provider_can_be_removed() {
    let (state, _backend) = memory_state();
    let app = test_app!(state);
    let cookie = sign_in_cookie(&app, "dana@uw.edu").await;

    let req = actix_test::TestRequest::post()
        .uri(&format!("/api/v1/listings/{CALCULUS}/wishlist"))
        .cookie(cookie.clone())
        .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);

    let req = actix_test::TestRequest::get()
        .uri("/api/v1/profile")
        .cookie(cookie.clone())
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, req).await;
    let entry = body["profile"]["wishlist"]
        .get(0)
        .cloned()
        .expect("wishlist entry");
    assert_eq!(entry["providerName"], "Harry Husky");
    let id = entry["id"].as_str().expect("entry id").to_owned();

    let req = actix_test::TestRequest::delete()
        .uri(&format!("/api/v1/wishlist/{id}"))
        .cookie(cookie.clone())
        .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let req = actix_test::TestRequest::get()
        .uri("/api/v1/profile")
        .cookie(cookie)
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["profile"]["wishlist"].as_array().map(Vec::len), Some(0));
}
