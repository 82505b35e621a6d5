//! Port for the `testimonials` table.

use async_trait::async_trait;

use crate::domain::auth::Caller;
use crate::domain::listing::ListingId;
use crate::domain::testimonial::{Testimonial, TestimonialDraft};
use crate::domain::user::UserId;

use super::define_port_error;

define_port_error! {
    /// Errors raised by testimonial adapters.
    pub enum TestimonialRepositoryError {
        /// Backend unreachable or timed out.
        Unavailable { message: String } =>
            ServiceUnavailable: "testimonial store unavailable: {message}",
        /// The caller's token was refused.
        Unauthorized { message: String } => Unauthorized: "{message}",
        /// The backend refused the insert.
        Rejected { message: String } => InvalidRequest: "{message}",
        /// A row did not have the expected shape.
        Decode { message: String } =>
            InternalError: "testimonial row could not be decoded: {message}",
    }
}

/// Port for testimonials. Lists are newest first with the author's name
/// joined in.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TestimonialRepository: Send + Sync {
    /// Testimonials left on one listing.
    async fn list_for_listing(
        &self,
        caller: &Caller,
        listing_id: &ListingId,
    ) -> Result<Vec<Testimonial>, TestimonialRepositoryError>;

    /// Testimonials received by a provider across all their listings.
    async fn list_for_provider(
        &self,
        caller: &Caller,
        provider_id: &UserId,
    ) -> Result<Vec<Testimonial>, TestimonialRepositoryError>;

    /// Record a testimonial.
    async fn insert(
        &self,
        caller: &Caller,
        draft: &TestimonialDraft,
    ) -> Result<(), TestimonialRepositoryError>;
}
