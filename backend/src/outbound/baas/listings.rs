//! `services` table adapter.

use async_trait::async_trait;
use reqwest::Method;

use super::client::{BaasClient, RETURN_MINIMAL, eq, impl_from_failure};
use super::dto::{
    NewServiceRow, ServiceRow, ServiceWithJoinsRow, ServiceWithProviderRow, convert_rows,
};
use crate::domain::auth::Caller;
use crate::domain::listing::{Listing, ListingDraft, ListingId, ListingRecord};
use crate::domain::ports::{ListingDetailRecord, ListingRepository, ListingRepositoryError};
use crate::domain::profile::Profile;
use crate::domain::user::UserId;

impl_from_failure!(ListingRepositoryError);

const TABLE: &str = "rest/v1/services";
const NEWEST_FIRST: &str = "created_at.desc";
const BROWSE_SELECT: &str =
    "*,profiles!services_provider_id_fkey(full_name,photo_url),testimonials(rating)";
const DETAIL_SELECT: &str = "*,profiles!services_provider_id_fkey(id,full_name,photo_url,about_me,contact_info,email)";

/// [`ListingRepository`] over the hosted REST API.
#[derive(Debug, Clone)]
pub struct BaasListingRepository {
    client: BaasClient,
}

impl BaasListingRepository {
    /// Repository sharing `client`.
    #[must_use]
    pub const fn new(client: BaasClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ListingRepository for BaasListingRepository {
    async fn list_with_provider_and_ratings(
        &self,
        caller: &Caller,
    ) -> Result<Vec<ListingRecord>, ListingRepositoryError> {
        let url = self.client.endpoint(TABLE)?;
        let request = self
            .client
            .request(Method::GET, url, caller.access_token())
            .query(&[("select", BROWSE_SELECT), ("order", NEWEST_FIRST)]);
        let rows: Vec<ServiceWithJoinsRow> = self.client.fetch(request).await?;
        Ok(convert_rows(rows))
    }

    async fn find_detail(
        &self,
        caller: &Caller,
        id: &ListingId,
    ) -> Result<Option<ListingDetailRecord>, ListingRepositoryError> {
        let url = self.client.endpoint(TABLE)?;
        let request = self
            .client
            .request(Method::GET, url, caller.access_token())
            .query(&[("select", DETAIL_SELECT.to_owned()), ("id", eq(id))]);
        let rows: Vec<ServiceWithProviderRow> = self.client.fetch(request).await?;
        let Some(row) = rows.into_iter().next() else {
            return Ok(None);
        };
        let listing = Listing::try_from(row.service).map_err(ListingRepositoryError::decode)?;
        Ok(Some(ListingDetailRecord {
            listing,
            provider: row.profiles.map(Profile::from),
        }))
    }

    async fn list_by_provider(
        &self,
        caller: &Caller,
        provider_id: &UserId,
    ) -> Result<Vec<Listing>, ListingRepositoryError> {
        let url = self.client.endpoint(TABLE)?;
        let request = self
            .client
            .request(Method::GET, url, caller.access_token())
            .query(&[
                ("select", "*".to_owned()),
                ("provider_id", eq(provider_id)),
                ("order", NEWEST_FIRST.to_owned()),
            ]);
        let rows: Vec<ServiceRow> = self.client.fetch(request).await?;
        Ok(convert_rows(rows))
    }

    async fn insert(
        &self,
        caller: &Caller,
        provider_id: &UserId,
        draft: &ListingDraft,
    ) -> Result<(), ListingRepositoryError> {
        let url = self.client.endpoint(TABLE)?;
        let request = self
            .client
            .json_request(Method::POST, url, caller.access_token())
            .header("Prefer", RETURN_MINIMAL)
            .json(&NewServiceRow::new(*provider_id, draft));
        self.client.send(request).await?;
        Ok(())
    }

    async fn delete(&self, caller: &Caller, id: &ListingId) -> Result<(), ListingRepositoryError> {
        let url = self.client.endpoint(TABLE)?;
        let request = self
            .client
            .request(Method::DELETE, url, caller.access_token())
            .query(&[("id", eq(id))]);
        self.client.send(request).await?;
        Ok(())
    }
}
