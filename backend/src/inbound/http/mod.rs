//! HTTP inbound adapter exposing the marketplace pages as JSON endpoints.
//!
//! Each request builds a fresh page controller, mounts it against the driven
//! ports with the caller from the session cookie, applies at most one action
//! and returns the controller's snapshot.

pub mod auth;
pub mod error;
pub mod health;
pub mod listings;
pub mod profile;
pub mod requests;
pub mod schemas;
pub mod session;
pub mod session_config;
pub mod state;
pub mod terms;
#[cfg(test)]
pub mod test_utils;

use std::fmt::Display;
use std::str::FromStr;

use actix_web::web;
use serde_json::json;

use crate::domain::Error;
use crate::domain::view_state::{Applied, PagePhase};

pub use error::ApiResult;

/// Register every route served under `/api/v1`, plus the OAuth callback.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .app_data(web::PayloadConfig::new(profile::PHOTO_BODY_LIMIT))
            .service(auth::sign_in)
            .service(auth::sign_up)
            .service(auth::sign_out)
            .service(auth::login_page)
            .service(auth::current_header)
            .service(auth::start_oauth)
            .service(listings::browse_listings)
            .service(listings::create_listing)
            .service(listings::get_listing)
            .service(listings::delete_listing)
            .service(listings::toggle_wishlist)
            .service(listings::submit_feedback)
            .service(profile::get_profile)
            .service(profile::update_profile)
            .service(profile::upload_photo)
            .service(profile::remove_wishlist_entry)
            .service(requests::create_request)
            .service(terms::get_terms)
            .service(terms::accept_terms),
    )
    .service(auth::oauth_callback);
}

/// Turn a page's error phase into the request's error.
///
/// A fresh controller is always current, so `applied` only matters for
/// logging.
pub(crate) fn ensure_ready(phase: &PagePhase, applied: Applied) -> Result<(), Error> {
    if applied == Applied::Stale {
        tracing::debug!("page load superseded");
    }
    match phase {
        PagePhase::Ready => Ok(()),
        PagePhase::Error { error } => Err(Error::new(error.code, error.message.clone())),
        PagePhase::Idle | PagePhase::Loading => Err(Error::conflict("page is not ready")),
    }
}

/// Parse an identifier from the path.
pub(crate) fn parse_id<T>(raw: &str, field: &str) -> Result<T, Error>
where
    T: FromStr,
    T::Err: Display,
{
    raw.parse().map_err(|err: T::Err| {
        Error::invalid_request(err.to_string()).with_details(json!({ "field": field }))
    })
}
