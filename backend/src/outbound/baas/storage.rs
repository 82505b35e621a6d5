//! Object storage adapter over `/storage/v1`.

use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use super::client::{BaasClient, Failure};
use crate::domain::auth::Caller;
use crate::domain::ports::{AvatarStorage, AvatarStorageError, StoredObject};

impl From<Failure> for AvatarStorageError {
    fn from(failure: Failure) -> Self {
        match failure {
            Failure::Unauthorized(message) => Self::unauthorized(message),
            Failure::Rejected(message) => Self::rejected(message),
            Failure::Unavailable(message) | Failure::Decode(message) => Self::unavailable(message),
        }
    }
}

/// [`AvatarStorage`] backed by the hosted object store.
#[derive(Debug, Clone)]
pub struct BaasAvatarStorage {
    client: BaasClient,
}

impl BaasAvatarStorage {
    /// Storage sharing `client`.
    #[must_use]
    pub const fn new(client: BaasClient) -> Self {
        Self { client }
    }

    fn object_url(&self, prefix: &str, bucket: &str, path: &str) -> Result<Url, AvatarStorageError> {
        let mut url = self
            .client
            .endpoint(prefix)
            .map_err(|_| AvatarStorageError::invalid_path(path))?;
        url.path_segments_mut()
            .map_err(|()| AvatarStorageError::invalid_path(path))?
            .pop_if_empty()
            .push(bucket)
            .extend(path.split('/').filter(|segment| !segment.is_empty()));
        Ok(url)
    }
}

#[async_trait]
impl AvatarStorage for BaasAvatarStorage {
    async fn upload(
        &self,
        caller: &Caller,
        object: &StoredObject,
    ) -> Result<(), AvatarStorageError> {
        let url = self.object_url("storage/v1/object/", &object.bucket, &object.path)?;
        let request = self
            .client
            .request(Method::POST, url, caller.access_token())
            .header(CONTENT_TYPE, object.content_type.as_str())
            .header("x-upsert", if object.overwrite { "true" } else { "false" })
            .body(object.bytes.clone());
        self.client.send(request).await?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> Result<Url, AvatarStorageError> {
        self.object_url("storage/v1/object/public/", bucket, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn public_url_escapes_segments() {
        let client = BaasClient::new(
            Url::parse("https://proj.supabase.co").expect("url"),
            "anon",
            Duration::from_secs(1),
        )
        .expect("client");
        let storage = BaasAvatarStorage::new(client);
        let url = storage
            .public_url("avatars", "3f2c8a52-7d4e-4c1b-9a51-0f6d9e2b7c11/avatar.my png")
            .expect("url");
        assert_eq!(
            url.as_str(),
            "https://proj.supabase.co/storage/v1/object/public/avatars/3f2c8a52-7d4e-4c1b-9a51-0f6d9e2b7c11/avatar.my%20png"
        );
    }
}
