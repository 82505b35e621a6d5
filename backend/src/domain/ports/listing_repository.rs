//! Port for the `services` table, where listings live.

use async_trait::async_trait;

use crate::domain::auth::Caller;
use crate::domain::listing::{Listing, ListingDraft, ListingId, ListingRecord};
use crate::domain::profile::Profile;
use crate::domain::user::UserId;

use super::define_port_error;

define_port_error! {
    /// Errors raised by listing repository adapters.
    pub enum ListingRepositoryError {
        /// Backend unreachable or timed out.
        Unavailable { message: String } =>
            ServiceUnavailable: "listing store unavailable: {message}",
        /// The caller's token was refused.
        Unauthorized { message: String } => Unauthorized: "{message}",
        /// The backend refused the change; its text is shown verbatim.
        Rejected { message: String } => InvalidRequest: "{message}",
        /// A row did not have the expected shape.
        Decode { message: String } =>
            InternalError: "listing row could not be decoded: {message}",
    }
}

/// A listing joined with its provider's full profile.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingDetailRecord {
    /// The listing.
    pub listing: Listing,
    /// Provider profile; absent when the join found nothing.
    pub provider: Option<Profile>,
}

/// Port for listings.
///
/// Every list is ordered newest first.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ListingRepository: Send + Sync {
    /// All listings with provider name/photo and testimonial ratings joined.
    async fn list_with_provider_and_ratings(
        &self,
        caller: &Caller,
    ) -> Result<Vec<ListingRecord>, ListingRepositoryError>;

    /// One listing with its provider.
    async fn find_detail(
        &self,
        caller: &Caller,
        id: &ListingId,
    ) -> Result<Option<ListingDetailRecord>, ListingRepositoryError>;

    /// Every listing owned by `provider_id`.
    async fn list_by_provider(
        &self,
        caller: &Caller,
        provider_id: &UserId,
    ) -> Result<Vec<Listing>, ListingRepositoryError>;

    /// Create a listing owned by `provider_id`.
    async fn insert(
        &self,
        caller: &Caller,
        provider_id: &UserId,
        draft: &ListingDraft,
    ) -> Result<(), ListingRepositoryError>;

    /// Delete a listing. Only its provider may do so.
    async fn delete(&self, caller: &Caller, id: &ListingId) -> Result<(), ListingRepositoryError>;
}
