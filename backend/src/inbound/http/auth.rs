//! Sign-in, sign-up, sign-out and the OAuth round trip.
//!
//! ```text
//! POST /api/v1/auth/sign-in  {"email":"husky@uw.edu","password":"..."}
//! POST /api/v1/auth/sign-up  {"email":"husky@uw.edu","password":"...","fullName":"Harry"}
//! POST /api/v1/auth/sign-out
//! GET  /api/v1/auth/login-message?error=domain_restricted
//! GET  /api/v1/auth/me?path=/profile
//! GET  /api/v1/auth/oauth?redirect=/profile
//! GET  /auth/callback?code=...&redirect=/profile
//! ```

use actix_web::http::header::{self, HeaderMap};
use actix_web::{HttpRequest, HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::domain::auth::{CallbackOrigin, RedirectPath, SignUpDetails};
use crate::domain::pages::callback::{self, CallbackRequest};
use crate::domain::pages::header::{HeaderSnapshot, HeaderView};
use crate::domain::pages::login::{self, LoginController, SIGN_UP_MESSAGE};
use crate::domain::pages::confirm_user;
use crate::domain::ports::SignUpOutcome;
use crate::domain::user::AuthUser;
use crate::domain::{Credentials, DeployEnvironment, Error, LoginValidationError};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Request body for `POST /api/v1/auth/sign-in`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    /// Institutional email.
    pub email: String,
    /// Password.
    pub password: String,
}

/// Request body for `POST /api/v1/auth/sign-up`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    /// Institutional email.
    pub email: String,
    /// Password.
    pub password: String,
    /// Name shown on listings.
    #[serde(default)]
    pub full_name: String,
}

/// Result of a sign-up.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpResponse {
    /// The new account.
    pub user: AuthUser,
    /// Whether a session was started straight away.
    pub signed_in: bool,
    /// Confirmation text for the login page.
    pub message: &'static str,
}

/// Query for `GET /api/v1/auth/login-message`.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    error: Option<String>,
}

/// Query carrying a post-login redirect path.
#[derive(Debug, Deserialize)]
pub struct RedirectQuery {
    redirect: Option<String>,
}

/// Query for `GET /auth/callback`.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    redirect: Option<String>,
}

/// Query for `GET /api/v1/auth/me`.
#[derive(Debug, Deserialize)]
pub struct HeaderQuery {
    path: Option<String>,
}

fn credentials(email: &str, password: &str) -> Result<Credentials, Error> {
    Credentials::try_from_parts(email, password).map_err(|err| {
        let field = match err {
            LoginValidationError::EmptyEmail => "email",
            LoginValidationError::EmptyPassword => "password",
        };
        Error::invalid_request(err.to_string()).with_details(json!({ "field": field }))
    })
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

/// Origin facts of `req` for building redirects.
#[must_use]
pub(crate) fn request_origin(req: &HttpRequest, environment: DeployEnvironment) -> CallbackOrigin {
    let info = req.connection_info();
    let host = header_value(req.headers(), header::HOST.as_str())
        .unwrap_or_else(|| info.host().to_owned());
    CallbackOrigin {
        origin: format!("{}://{host}", info.scheme()),
        forwarded_host: header_value(req.headers(), "x-forwarded-host"),
        environment,
    }
}

fn redirect_to(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .finish()
}

/// Sign in with email and password.
#[utoipa::path(
    post,
    path = "/api/v1/auth/sign-in",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in; body is the user", headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Missing email or password", body = ErrorSchema),
        (status = 401, description = "Invalid credentials", body = ErrorSchema),
        (status = 403, description = "Email outside the allowed domain", body = ErrorSchema),
        (status = 503, description = "Auth service unavailable", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "signIn",
    security([])
)]
#[post("/auth/sign-in")]
pub async fn sign_in(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SignInRequest>,
) -> ApiResult<web::Json<AuthUser>> {
    let credentials = credentials(&payload.email, &payload.password)?;
    let mut controller = LoginController::new();
    let auth = login::sign_in(
        &mut controller,
        &state.ports,
        &state.policy.domain,
        &credentials,
    )
    .await?;
    session.persist(&auth)?;
    Ok(web::Json(auth.user))
}

/// Create an account.
#[utoipa::path(
    post,
    path = "/api/v1/auth/sign-up",
    request_body = SignUpRequest,
    responses(
        (status = 200, description = "Account created"),
        (status = 400, description = "Invalid request or refused by the auth service", body = ErrorSchema),
        (status = 403, description = "Email outside the allowed domain", body = ErrorSchema),
        (status = 503, description = "Auth service unavailable", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "signUp",
    security([])
)]
#[post("/auth/sign-up")]
pub async fn sign_up(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SignUpRequest>,
) -> ApiResult<web::Json<SignUpResponse>> {
    let SignUpRequest {
        email,
        password,
        full_name,
    } = payload.into_inner();
    let details = SignUpDetails {
        credentials: credentials(&email, &password)?,
        full_name,
    };
    let mut controller = LoginController::new();
    let outcome = login::sign_up(
        &mut controller,
        &state.ports,
        &state.policy.domain,
        &details,
    )
    .await?;
    let signed_in = match &outcome {
        SignUpOutcome::SignedIn(auth) => {
            session.persist(auth)?;
            true
        }
        SignUpOutcome::ConfirmationRequired(_) => false,
    };
    Ok(web::Json(SignUpResponse {
        user: outcome.user().clone(),
        signed_in,
        message: SIGN_UP_MESSAGE,
    }))
}

/// End the session.
///
/// The cookie is cleared even when the auth service cannot be reached.
#[utoipa::path(
    post,
    path = "/api/v1/auth/sign-out",
    responses((status = 204, description = "Signed out")),
    tags = ["auth"],
    operation_id = "signOut"
)]
#[post("/auth/sign-out")]
pub async fn sign_out(state: web::Data<HttpState>, session: SessionContext) -> HttpResponse {
    let caller = session.caller();
    if let Some(token) = caller.access_token() {
        if let Err(err) = state.ports.auth.sign_out(token).await {
            warn!(error = %err, "sign-out was not acknowledged by the auth service");
        }
    }
    session.clear();
    HttpResponse::NoContent().finish()
}

/// Login page state, including the banner for an `error` parameter.
#[utoipa::path(
    get,
    path = "/api/v1/auth/login-message",
    params(("error" = Option<String>, Query, description = "Failure code from the OAuth callback")),
    responses((status = 200, description = "Login page snapshot")),
    tags = ["auth"],
    operation_id = "loginPage",
    security([])
)]
#[get("/auth/login-message")]
pub async fn login_page(
    state: web::Data<HttpState>,
    query: web::Query<LoginQuery>,
) -> HttpResponse {
    let controller = LoginController::new();
    HttpResponse::Ok().json(controller.snapshot(query.error.as_deref(), &state.policy.domain))
}

/// Header for the caller, confirmed with the auth service.
///
/// A session the service no longer honours is cleared.
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    params(("path" = Option<String>, Query, description = "Current page path for link highlighting")),
    responses((status = 200, description = "Header snapshot")),
    tags = ["auth"],
    operation_id = "currentHeader"
)]
#[get("/auth/me")]
pub async fn current_header(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<HeaderQuery>,
) -> web::Json<HeaderSnapshot> {
    let caller = session.caller();
    let mut header = HeaderView::from_caller(&caller);
    if caller.access_token().is_some() && confirm_user(&state.ports, &caller).await.is_none() {
        session.clear();
        header = HeaderView::default();
    }
    web::Json(header.snapshot(query.path.as_deref().unwrap_or("/")))
}

/// Send the browser to the OAuth provider.
#[utoipa::path(
    get,
    path = "/api/v1/auth/oauth",
    params(("redirect" = Option<String>, Query, description = "Path to return to after sign-in")),
    responses(
        (status = 302, description = "Redirect to the provider"),
        (status = 400, description = "Provider not available", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "startOAuth",
    security([])
)]
#[get("/auth/oauth")]
pub async fn start_oauth(
    req: HttpRequest,
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<RedirectQuery>,
) -> ApiResult<HttpResponse> {
    let next = RedirectPath::sanitise(query.redirect.as_deref());
    let base = request_origin(&req, state.policy.environment).success_target(&RedirectPath::root());
    let hand_off = login::start_oauth(
        &state.ports,
        &state.policy.domain,
        &state.policy.oauth_provider,
        &base,
        &next,
    )?;
    session.store_verifier(&hand_off.verifier)?;
    Ok(redirect_to(hand_off.url.as_str()))
}

/// Finish the OAuth round trip and redirect.
#[utoipa::path(
    get,
    path = "/auth/callback",
    params(
        ("code" = Option<String>, Query, description = "Authorisation code"),
        ("redirect" = Option<String>, Query, description = "Path to return to")
    ),
    responses((status = 302, description = "Redirect to the requested page or back to login")),
    tags = ["auth"],
    operation_id = "oauthCallback",
    security([])
)]
#[get("/auth/callback")]
pub async fn oauth_callback(
    req: HttpRequest,
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<CallbackQuery>,
) -> ApiResult<HttpResponse> {
    let origin = request_origin(&req, state.policy.environment);
    let next = RedirectPath::sanitise(query.redirect.as_deref());
    let verifier = session.take_verifier();
    let outcome = callback::complete(
        &state.ports,
        &state.policy.domain,
        CallbackRequest {
            code: query.code.as_deref(),
            verifier: verifier.as_ref(),
            next: &next,
            origin: &origin,
        },
    )
    .await;
    match &outcome.session {
        Some(auth) => {
            session.persist(auth)?;
            info!(user = %auth.user.id, "oauth sign-in");
        }
        None => session.clear(),
    }
    Ok(redirect_to(&outcome.location))
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
