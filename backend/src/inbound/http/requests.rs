//! Posting service requests.
//!
//! ```text
//! POST /api/v1/service-requests {"category":"Rides","dateNeeded":"2025-03-01","timeNeeded":"09:30","duration":"1 hour","details":""}
//! ```

use actix_web::{HttpResponse, post, web};

use crate::domain::pages::post_request::{self, PostRequestController};
use crate::domain::service_request::ServiceRequestForm;
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Ask the community for help.
#[utoipa::path(
    post,
    path = "/api/v1/service-requests",
    responses(
        (status = 201, description = "Request posted; body carries the redirect target"),
        (status = 400, description = "Invalid form field", body = ErrorSchema),
        (status = 401, description = "Signed out", body = ErrorSchema)
    ),
    tags = ["requests"],
    operation_id = "createServiceRequest"
)]
#[post("/service-requests")]
pub async fn create_request(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<ServiceRequestForm>,
) -> ApiResult<HttpResponse> {
    let caller = session.caller();
    let mut controller = PostRequestController::new();
    post_request::submit(&mut controller, &state.ports, &caller, &payload).await?;
    Ok(HttpResponse::Created().json(controller.snapshot()))
}
