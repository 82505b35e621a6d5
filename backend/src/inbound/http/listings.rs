//! Browse, detail and listing mutations.
//!
//! ```text
//! GET    /api/v1/listings?q=calc&category=Tutoring
//! POST   /api/v1/listings
//! GET    /api/v1/listings/{id}
//! DELETE /api/v1/listings/{id}
//! POST   /api/v1/listings/{id}/wishlist
//! POST   /api/v1/listings/{id}/testimonials
//! ```

use actix_web::{HttpRequest, HttpResponse, delete, get, post, web};
use serde::Deserialize;
use serde_json::json;

use crate::domain::listing::{ListingForm, ListingId};
use crate::domain::pages::listing_detail::{self, ListingDetailController};
use crate::domain::pages::post_listing::{self, PostListingController};
use crate::domain::pages::profile::{self, ProfileController};
use crate::domain::pages::{browse, terms};
use crate::domain::pages::browse::BrowseController;
use crate::domain::testimonial::FeedbackForm;
use crate::domain::{Caller, CategoryFilter, Error};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::{ApiResult, ensure_ready, parse_id};

/// Query for `GET /api/v1/listings`.
#[derive(Debug, Default, Deserialize)]
pub struct BrowseQuery {
    q: Option<String>,
    category: Option<String>,
}

fn category_filter(raw: Option<&str>) -> Result<CategoryFilter, Error> {
    raw.unwrap_or_default().parse::<CategoryFilter>().map_err(|err| {
        Error::invalid_request(err.to_string())
            .with_details(json!({ "field": "category" }))
    })
}

/// Whether the browser still has to accept the terms.
#[must_use]
pub(crate) fn terms_pending(req: &HttpRequest) -> bool {
    let cookie = req.cookie(terms::TERMS_COOKIE);
    !terms::is_accepted(cookie.as_ref().map(|c| c.value()))
}

async fn mounted_detail(
    state: &HttpState,
    caller: &Caller,
    id: ListingId,
) -> Result<ListingDetailController, Error> {
    let mut controller = ListingDetailController::new(id);
    let applied = listing_detail::mount(&mut controller, &state.ports, caller).await;
    ensure_ready(controller.phase(), applied)?;
    Ok(controller)
}

/// Browse listings, filtered by free text and category.
#[utoipa::path(
    get,
    path = "/api/v1/listings",
    params(
        ("q" = Option<String>, Query, description = "Free-text search over title, description and provider"),
        ("category" = Option<String>, Query, description = "Category label, or `All`")
    ),
    responses(
        (status = 200, description = "Browse page snapshot"),
        (status = 400, description = "Unknown category", body = ErrorSchema),
        (status = 503, description = "Backend unavailable", body = ErrorSchema)
    ),
    tags = ["listings"],
    operation_id = "browseListings",
    security([])
)]
#[get("/listings")]
pub async fn browse_listings(
    req: HttpRequest,
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<BrowseQuery>,
) -> ApiResult<HttpResponse> {
    let category = category_filter(query.category.as_deref())?;
    let caller = session.caller();
    let mut controller = BrowseController::new();
    let applied = browse::mount(&mut controller, &state.ports, &caller).await;
    ensure_ready(controller.phase(), applied)?;
    controller.set_query(query.q.as_deref().unwrap_or_default());
    controller.set_category(category);
    Ok(HttpResponse::Ok().json(controller.snapshot(terms_pending(&req))))
}

/// Post a new listing as the caller.
#[utoipa::path(
    post,
    path = "/api/v1/listings",
    responses(
        (status = 201, description = "Listing posted; body carries the redirect target"),
        (status = 400, description = "Invalid form field", body = ErrorSchema),
        (status = 401, description = "Signed out", body = ErrorSchema)
    ),
    tags = ["listings"],
    operation_id = "createListing"
)]
#[post("/listings")]
pub async fn create_listing(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<ListingForm>,
) -> ApiResult<HttpResponse> {
    let caller = session.caller();
    let mut controller = PostListingController::new();
    post_listing::submit(&mut controller, &state.ports, &caller, &payload).await?;
    Ok(HttpResponse::Created().json(controller.snapshot()))
}

/// One listing with its provider, testimonials and wishlist state.
#[utoipa::path(
    get,
    path = "/api/v1/listings/{id}",
    params(("id" = String, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Listing detail snapshot"),
        (status = 400, description = "Malformed id", body = ErrorSchema),
        (status = 404, description = "Service not found", body = ErrorSchema)
    ),
    tags = ["listings"],
    operation_id = "listingDetail",
    security([])
)]
#[get("/listings/{id}")]
pub async fn get_listing(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_id(&path, "id")?;
    let caller = session.caller();
    let controller = mounted_detail(&state, &caller, id).await?;
    Ok(HttpResponse::Ok().json(controller.snapshot()))
}

/// Delete one of the caller's listings.
#[utoipa::path(
    delete,
    path = "/api/v1/listings/{id}",
    params(("id" = String, Path, description = "Listing id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Signed out", body = ErrorSchema),
        (status = 404, description = "Not one of the caller's listings", body = ErrorSchema)
    ),
    tags = ["listings"],
    operation_id = "deleteListing"
)]
#[delete("/listings/{id}")]
pub async fn delete_listing(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_id(&path, "id")?;
    let caller = session.caller();
    caller.require_user()?;
    let mut controller = ProfileController::new();
    let applied = profile::mount(&mut controller, &state.ports, &caller).await;
    ensure_ready(controller.phase(), applied)?;
    profile::delete_listing(&mut controller, &state.ports, &caller, id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Save or unsave the listing's provider.
#[utoipa::path(
    post,
    path = "/api/v1/listings/{id}/wishlist",
    params(("id" = String, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Listing detail after the toggle"),
        (status = 401, description = "Signed out", body = ErrorSchema),
        (status = 403, description = "Own listing", body = ErrorSchema)
    ),
    tags = ["listings"],
    operation_id = "toggleWishlist"
)]
#[post("/listings/{id}/wishlist")]
pub async fn toggle_wishlist(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_id(&path, "id")?;
    let caller = session.caller();
    caller.require_user()?;
    let mut controller = mounted_detail(&state, &caller, id).await?;
    listing_detail::toggle_wishlist(&mut controller, &state.ports, &caller).await?;
    Ok(HttpResponse::Ok().json(controller.snapshot()))
}

/// Leave a rating and comment for the listing's provider.
#[utoipa::path(
    post,
    path = "/api/v1/listings/{id}/testimonials",
    params(("id" = String, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Listing detail reloaded with the new testimonial"),
        (status = 400, description = "Invalid rating or comment", body = ErrorSchema),
        (status = 401, description = "Signed out", body = ErrorSchema),
        (status = 403, description = "Own listing", body = ErrorSchema)
    ),
    tags = ["listings"],
    operation_id = "submitFeedback"
)]
#[post("/listings/{id}/testimonials")]
pub async fn submit_feedback(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<FeedbackForm>,
) -> ApiResult<HttpResponse> {
    let id = parse_id(&path, "id")?;
    let caller = session.caller();
    caller.require_user()?;
    let mut controller = mounted_detail(&state, &caller, id).await?;
    listing_detail::submit_feedback(&mut controller, &state.ports, &caller, &payload).await?;
    Ok(HttpResponse::Ok().json(controller.snapshot()))
}

#[cfg(test)]
#[path = "listings_tests.rs"]
mod tests;
