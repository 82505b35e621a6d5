//! Port for the `wishlists` table.

use async_trait::async_trait;

use crate::domain::auth::Caller;
use crate::domain::user::UserId;
use crate::domain::wishlist::{WishlistEntry, WishlistEntryId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by wishlist adapters.
    pub enum WishlistRepositoryError {
        /// Backend unreachable or timed out.
        Unavailable { message: String } =>
            ServiceUnavailable: "wishlist store unavailable: {message}",
        /// The caller's token was refused.
        Unauthorized { message: String } => Unauthorized: "{message}",
        /// The backend refused the change.
        Rejected { message: String } => InvalidRequest: "{message}",
        /// A row did not have the expected shape.
        Decode { message: String } =>
            InternalError: "wishlist row could not be decoded: {message}",
    }
}

/// Port for a member's saved providers.
///
/// Uniqueness of `(user, provider)` is not enforced here.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WishlistRepository: Send + Sync {
    /// Entries owned by `user_id`, with provider name and email joined.
    async fn list_for_user(
        &self,
        caller: &Caller,
        user_id: &UserId,
    ) -> Result<Vec<WishlistEntry>, WishlistRepositoryError>;

    /// The entry saving `provider_id` for `user_id`, if any.
    async fn find(
        &self,
        caller: &Caller,
        user_id: &UserId,
        provider_id: &UserId,
    ) -> Result<Option<WishlistEntryId>, WishlistRepositoryError>;

    /// Save `provider_id` for `user_id`.
    async fn add(
        &self,
        caller: &Caller,
        user_id: &UserId,
        provider_id: &UserId,
    ) -> Result<(), WishlistRepositoryError>;

    /// Remove every entry saving `provider_id` for `user_id`.
    async fn remove_provider(
        &self,
        caller: &Caller,
        user_id: &UserId,
        provider_id: &UserId,
    ) -> Result<(), WishlistRepositoryError>;

    /// Remove one entry by id.
    async fn remove(
        &self,
        caller: &Caller,
        id: &WishlistEntryId,
    ) -> Result<(), WishlistRepositoryError>;
}
