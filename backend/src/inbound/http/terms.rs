//! Terms and conditions acceptance.
//!
//! ```text
//! GET  /api/v1/terms
//! POST /api/v1/terms/accept
//! ```

use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::{HttpRequest, HttpResponse, get, post, web};

use crate::domain::DeployEnvironment;
use crate::domain::pages::terms::{TERMS_ACCEPTED, TERMS_COOKIE, TermsView};
use crate::inbound::http::state::HttpState;

/// How long acceptance is remembered.
const ACCEPTANCE_DAYS: i64 = 365;

/// The terms text and whether this browser accepted them.
#[utoipa::path(
    get,
    path = "/api/v1/terms",
    responses((status = 200, description = "Terms text and acceptance flag")),
    tags = ["terms"],
    operation_id = "getTerms",
    security([])
)]
#[get("/terms")]
pub async fn get_terms(req: HttpRequest) -> web::Json<TermsView> {
    let cookie = req.cookie(TERMS_COOKIE);
    web::Json(TermsView::for_cookie(cookie.as_ref().map(Cookie::value)))
}

/// Record acceptance in a long-lived cookie.
#[utoipa::path(
    post,
    path = "/api/v1/terms/accept",
    responses((status = 200, description = "Accepted", headers(("Set-Cookie" = String, description = "Acceptance cookie")))),
    tags = ["terms"],
    operation_id = "acceptTerms",
    security([])
)]
#[post("/terms/accept")]
pub async fn accept_terms(state: web::Data<HttpState>) -> HttpResponse {
    let cookie = Cookie::build(TERMS_COOKIE, TERMS_ACCEPTED)
        .path("/")
        .max_age(CookieDuration::days(ACCEPTANCE_DAYS))
        .same_site(SameSite::Lax)
        .secure(state.policy.environment == DeployEnvironment::Production)
        .finish();
    HttpResponse::Ok()
        .cookie(cookie)
        .json(TermsView::for_cookie(Some(TERMS_ACCEPTED)))
}
