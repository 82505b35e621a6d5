//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every REST endpoint from the inbound layer, the error
//! schema wrappers ([`ErrorSchema`], [`ErrorCodeSchema`]) that keep domain
//! types free of utoipa, and the session cookie security scheme.
//!
//! Swagger UI serves the document in debug builds; `openapi-dump` prints it.

use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/auth/sign-in or the OAuth callback.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Husky Helpers API",
        description = "Campus marketplace: browse listings, post services, request help, and leave testimonials."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::auth::sign_in,
        crate::inbound::http::auth::sign_up,
        crate::inbound::http::auth::sign_out,
        crate::inbound::http::auth::login_page,
        crate::inbound::http::auth::current_header,
        crate::inbound::http::auth::start_oauth,
        crate::inbound::http::auth::oauth_callback,
        crate::inbound::http::listings::browse_listings,
        crate::inbound::http::listings::create_listing,
        crate::inbound::http::listings::get_listing,
        crate::inbound::http::listings::delete_listing,
        crate::inbound::http::listings::toggle_wishlist,
        crate::inbound::http::listings::submit_feedback,
        crate::inbound::http::profile::get_profile,
        crate::inbound::http::profile::update_profile,
        crate::inbound::http::profile::upload_photo,
        crate::inbound::http::profile::remove_wishlist_entry,
        crate::inbound::http::requests::create_request,
        crate::inbound::http::terms::get_terms,
        crate::inbound::http::terms::accept_terms,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(ErrorSchema, ErrorCodeSchema)),
    tags(
        (name = "auth", description = "Sign-in, sign-up and the OAuth hand-off"),
        (name = "listings", description = "Browsing, posting and reviewing services"),
        (name = "profile", description = "The signed-in member's profile and wishlist"),
        (name = "requests", description = "Requests for help"),
        (name = "terms", description = "Terms-of-service acknowledgement"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
