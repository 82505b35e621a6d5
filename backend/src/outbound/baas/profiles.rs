//! `profiles` table adapter.

use async_trait::async_trait;
use reqwest::Method;
use url::Url;

use super::client::{BaasClient, RETURN_MINIMAL, eq, impl_from_failure};
use super::dto::{PhotoUrlRow, ProfileEditRow, ProfileRow, ProfileSeedRow};
use crate::domain::auth::Caller;
use crate::domain::ports::{ProfileRepository, ProfileRepositoryError};
use crate::domain::profile::{Profile, ProfileEdit, ProfileSeed};
use crate::domain::user::UserId;

impl_from_failure!(ProfileRepositoryError);

const TABLE: &str = "rest/v1/profiles";

/// [`ProfileRepository`] over the hosted REST API.
#[derive(Debug, Clone)]
pub struct BaasProfileRepository {
    client: BaasClient,
}

impl BaasProfileRepository {
    /// Repository sharing `client`.
    #[must_use]
    pub const fn new(client: BaasClient) -> Self {
        Self { client }
    }

    async fn patch<B: serde::Serialize + Sync>(
        &self,
        caller: &Caller,
        id: &UserId,
        body: &B,
    ) -> Result<(), ProfileRepositoryError> {
        let url = self.client.endpoint(TABLE)?;
        let request = self
            .client
            .json_request(Method::PATCH, url, caller.access_token())
            .query(&[("id", eq(id))])
            .header("Prefer", RETURN_MINIMAL)
            .json(body);
        self.client.send(request).await?;
        Ok(())
    }
}

#[async_trait]
impl ProfileRepository for BaasProfileRepository {
    async fn find(
        &self,
        caller: &Caller,
        id: &UserId,
    ) -> Result<Option<Profile>, ProfileRepositoryError> {
        let url = self.client.endpoint(TABLE)?;
        let request = self
            .client
            .request(Method::GET, url, caller.access_token())
            .query(&[("select", "*".to_owned()), ("id", eq(id))]);
        let rows: Vec<ProfileRow> = self.client.fetch(request).await?;
        Ok(rows.into_iter().next().map(Profile::from))
    }

    async fn upsert_seed(
        &self,
        caller: &Caller,
        seed: &ProfileSeed,
    ) -> Result<(), ProfileRepositoryError> {
        let url = self.client.endpoint(TABLE)?;
        let request = self
            .client
            .json_request(Method::POST, url, caller.access_token())
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&ProfileSeedRow::from(seed));
        self.client.send(request).await?;
        Ok(())
    }

    async fn update(
        &self,
        caller: &Caller,
        id: &UserId,
        edit: &ProfileEdit,
    ) -> Result<(), ProfileRepositoryError> {
        self.patch(caller, id, &ProfileEditRow::from(edit)).await
    }

    async fn set_photo_url(
        &self,
        caller: &Caller,
        id: &UserId,
        url: &Url,
    ) -> Result<(), ProfileRepositoryError> {
        let body = PhotoUrlRow {
            photo_url: url.as_str(),
        };
        self.patch(caller, id, &body).await
    }
}
