//! Port for object storage used by profile photos.

use async_trait::async_trait;
use url::Url;

use crate::domain::auth::Caller;

use super::define_port_error;

define_port_error! {
    /// Errors raised by storage adapters.
    pub enum AvatarStorageError {
        /// Storage unreachable or timed out.
        Unavailable { message: String } =>
            ServiceUnavailable: "storage unavailable: {message}",
        /// The caller's token was refused.
        Unauthorized { message: String } => Unauthorized: "{message}",
        /// The upload was refused; the text reads "Upload failed: ...".
        Rejected { message: String } => InvalidRequest: "Upload failed: {message}",
        /// The object path could not form a URL.
        InvalidPath { path: String } => InternalError: "invalid object path: {path}",
    }
}

/// An object to store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Bucket name.
    pub bucket: String,
    /// Path inside the bucket.
    pub path: String,
    /// MIME type.
    pub content_type: String,
    /// Object body.
    pub bytes: Vec<u8>,
    /// Replace an existing object at the same path.
    pub overwrite: bool,
}

/// Port for uploading objects and resolving their public URLs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AvatarStorage: Send + Sync {
    /// Upload an object on behalf of `caller`.
    async fn upload(
        &self,
        caller: &Caller,
        object: &StoredObject,
    ) -> Result<(), AvatarStorageError>;

    /// Public URL of an object. No network call.
    fn public_url(&self, bucket: &str, path: &str) -> Result<Url, AvatarStorageError>;
}
