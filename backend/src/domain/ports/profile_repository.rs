//! Port for the `profiles` table.

use async_trait::async_trait;
use url::Url;

use crate::domain::auth::Caller;
use crate::domain::profile::{Profile, ProfileEdit, ProfileSeed};
use crate::domain::user::UserId;

use super::define_port_error;

define_port_error! {
    /// Errors raised by profile repository adapters.
    pub enum ProfileRepositoryError {
        /// Backend unreachable or timed out.
        Unavailable { message: String } =>
            ServiceUnavailable: "profile store unavailable: {message}",
        /// The caller's token was refused.
        Unauthorized { message: String } => Unauthorized: "{message}",
        /// The backend refused the change; its text is shown verbatim.
        Rejected { message: String } => InvalidRequest: "{message}",
        /// A row did not have the expected shape.
        Decode { message: String } =>
            InternalError: "profile row could not be decoded: {message}",
    }
}

/// Port for reading and writing member profiles.
///
/// Row-level security on the backend restricts writes to the owner; the
/// caller's token is forwarded with every request.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Fetch a profile by id.
    async fn find(
        &self,
        caller: &Caller,
        id: &UserId,
    ) -> Result<Option<Profile>, ProfileRepositoryError>;

    /// Insert the profile or merge into the existing row.
    async fn upsert_seed(
        &self,
        caller: &Caller,
        seed: &ProfileSeed,
    ) -> Result<(), ProfileRepositoryError>;

    /// Save the editable fields.
    async fn update(
        &self,
        caller: &Caller,
        id: &UserId,
        edit: &ProfileEdit,
    ) -> Result<(), ProfileRepositoryError>;

    /// Point the profile at a new photo.
    async fn set_photo_url(
        &self,
        caller: &Caller,
        id: &UserId,
        url: &Url,
    ) -> Result<(), ProfileRepositoryError>;
}
