//! Page controllers.
//!
//! Each page owns a [`PageState`](super::view_state::PageState) and changes
//! only through its transition methods. The `mount` functions drive a
//! controller through one load against the [`BackendPorts`], running the
//! page's fetches concurrently.

pub mod browse;
pub mod callback;
pub mod header;
pub mod listing_detail;
pub mod login;
pub mod post_listing;
pub mod post_request;
pub mod profile;
pub mod terms;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::warn;

use super::Error;
use super::auth::Caller;
use super::ports::BackendPorts;
use super::testimonial::Testimonial;
use super::user::AuthUser;

/// Inline message for forms submitted while signed out.
pub const LOGIN_REQUIRED: &str = "You must be logged in.";

/// A labelled link rendered as a button or menu entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavLink {
    /// Visible text.
    pub label: &'static str,
    /// Target path.
    pub href: &'static str,
}

impl NavLink {
    const fn new(label: &'static str, href: &'static str) -> Self {
        Self { label, href }
    }
}

/// A testimonial as rendered on detail and profile pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestimonialCard {
    /// Author name with the fallback applied.
    pub author: String,
    /// Single-letter avatar.
    pub author_initial: String,
    /// Stars given.
    pub rating: u8,
    /// Comment text.
    pub comment: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl From<&Testimonial> for TestimonialCard {
    fn from(testimonial: &Testimonial) -> Self {
        Self {
            author: testimonial.author_label().to_owned(),
            author_initial: testimonial.author_initial(),
            rating: testimonial.rating.get(),
            comment: testimonial.comment.clone(),
            created_at: testimonial.created_at,
        }
    }
}

/// `invalid_request` naming the offending form field.
#[must_use]
pub(crate) fn field_error(field: &str, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({ "field": field }))
}

/// Confirm the caller's session with the auth service.
///
/// A token the service no longer honours, or an unreachable service, is
/// treated as signed out; the page still renders.
pub(crate) async fn confirm_user(ports: &BackendPorts, caller: &Caller) -> Option<AuthUser> {
    let token = caller.access_token()?;
    match ports.auth.current_user(token).await {
        Ok(user) => user,
        Err(err) => {
            warn!(error = %err, "could not confirm session; treating caller as signed out");
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support;
