//! The caller's profile page.
//!
//! ```text
//! GET    /api/v1/profile
//! PUT    /api/v1/profile                      {"fullName":"Harry","aboutMe":"","contactInfo":""}
//! POST   /api/v1/profile/photo?fileName=me.png (raw image body)
//! DELETE /api/v1/wishlist/{id}
//! ```

use actix_web::http::header::{self, CONTENT_TYPE};
use actix_web::{HttpRequest, HttpResponse, delete, get, post, put, web};
use serde::Deserialize;
use serde_json::json;

use crate::domain::avatar::{AvatarUpload, MAX_AVATAR_BYTES};
use crate::domain::pages::profile::{self as page, ProfileController};
use crate::domain::profile::ProfileEdit;
use crate::domain::{Caller, Error};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::{ApiResult, ensure_ready, parse_id};

/// Largest request body accepted by the photo endpoint.
///
/// Bodies between this and [`MAX_AVATAR_BYTES`] reach validation and get the
/// friendly size message.
pub const PHOTO_BODY_LIMIT: usize = MAX_AVATAR_BYTES * 2;

/// Query for `POST /api/v1/profile/photo`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoQuery {
    file_name: Option<String>,
}

async fn mounted_profile(state: &HttpState, caller: &Caller) -> Result<ProfileController, Error> {
    let mut controller = ProfileController::new();
    let applied = page::mount(&mut controller, &state.ports, caller).await;
    ensure_ready(controller.phase(), applied)?;
    Ok(controller)
}

/// Profile, own listings, wishlist and received testimonials.
#[utoipa::path(
    get,
    path = "/api/v1/profile",
    responses(
        (status = 200, description = "Profile page snapshot"),
        (status = 401, description = "Signed out", body = ErrorSchema)
    ),
    tags = ["profile"],
    operation_id = "getProfile"
)]
#[get("/profile")]
pub async fn get_profile(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let caller = session.caller();
    let controller = mounted_profile(&state, &caller).await?;
    Ok(HttpResponse::Ok().json(controller.snapshot()))
}

/// Save the profile form.
#[utoipa::path(
    put,
    path = "/api/v1/profile",
    responses(
        (status = 200, description = "Profile page after saving"),
        (status = 400, description = "Name missing", body = ErrorSchema),
        (status = 401, description = "Signed out", body = ErrorSchema)
    ),
    tags = ["profile"],
    operation_id = "updateProfile"
)]
#[put("/profile")]
pub async fn update_profile(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<ProfileEdit>,
) -> ApiResult<HttpResponse> {
    let caller = session.caller();
    let mut controller = mounted_profile(&state, &caller).await?;
    controller.begin_edit()?;
    page::save_profile(&mut controller, &state.ports, &caller, payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(controller.snapshot()))
}

/// Replace the profile photo with the raw request body.
#[utoipa::path(
    post,
    path = "/api/v1/profile/photo",
    params(("fileName" = Option<String>, Query, description = "Original file name; its extension is kept")),
    request_body(content = Vec<u8>, content_type = "image/*"),
    responses(
        (status = 200, description = "New photo URL"),
        (status = 400, description = "Not an image, empty or too large", body = ErrorSchema),
        (status = 401, description = "Signed out", body = ErrorSchema)
    ),
    tags = ["profile"],
    operation_id = "uploadPhoto"
)]
#[post("/profile/photo")]
pub async fn upload_photo(
    req: HttpRequest,
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<PhotoQuery>,
    body: web::Bytes,
) -> ApiResult<HttpResponse> {
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let file_name = query.file_name.as_deref().unwrap_or("avatar");
    let upload = AvatarUpload::new(file_name, content_type, body.to_vec()).map_err(|err| {
        Error::invalid_request(err.to_string()).with_details(json!({ "field": "photo" }))
    })?;
    let caller = session.caller();
    let mut controller = mounted_profile(&state, &caller).await?;
    let url = page::upload_photo(&mut controller, &state.ports, &caller, upload, &state.clock).await?;
    Ok(HttpResponse::Ok()
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .json(json!({ "photoUrl": url.as_str() })))
}

/// Remove a saved provider.
#[utoipa::path(
    delete,
    path = "/api/v1/wishlist/{id}",
    params(("id" = String, Path, description = "Wishlist entry id")),
    responses(
        (status = 204, description = "Removed"),
        (status = 401, description = "Signed out", body = ErrorSchema)
    ),
    tags = ["profile"],
    operation_id = "removeWishlistEntry"
)]
#[delete("/wishlist/{id}")]
pub async fn remove_wishlist_entry(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_id(&path, "id")?;
    let caller = session.caller();
    let mut controller = mounted_profile(&state, &caller).await?;
    page::remove_wishlist_entry(&mut controller, &state.ports, &caller, id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
#[path = "profile_tests.rs"]
mod tests;
