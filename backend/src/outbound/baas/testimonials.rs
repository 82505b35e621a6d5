//! `testimonials` table adapter.

use async_trait::async_trait;
use reqwest::Method;

use super::client::{BaasClient, RETURN_MINIMAL, eq, impl_from_failure};
use super::dto::{NewTestimonialRow, TestimonialRow, convert_rows};
use crate::domain::auth::Caller;
use crate::domain::listing::ListingId;
use crate::domain::ports::{TestimonialRepository, TestimonialRepositoryError};
use crate::domain::testimonial::{Testimonial, TestimonialDraft};
use crate::domain::user::UserId;

impl_from_failure!(TestimonialRepositoryError);

const TABLE: &str = "rest/v1/testimonials";
const WITH_AUTHOR: &str = "*,profiles!testimonials_from_user_id_fkey(full_name)";

/// [`TestimonialRepository`] over the hosted REST API.
#[derive(Debug, Clone)]
pub struct BaasTestimonialRepository {
    client: BaasClient,
}

impl BaasTestimonialRepository {
    /// Repository sharing `client`.
    #[must_use]
    pub const fn new(client: BaasClient) -> Self {
        Self { client }
    }

    async fn list_where(
        &self,
        caller: &Caller,
        column: &str,
        value: String,
    ) -> Result<Vec<Testimonial>, TestimonialRepositoryError> {
        let url = self.client.endpoint(TABLE)?;
        let request = self
            .client
            .request(Method::GET, url, caller.access_token())
            .query(&[
                ("select", WITH_AUTHOR.to_owned()),
                (column, value),
                ("order", "created_at.desc".to_owned()),
            ]);
        let rows: Vec<TestimonialRow> = self.client.fetch(request).await?;
        Ok(convert_rows(rows))
    }
}

#[async_trait]
impl TestimonialRepository for BaasTestimonialRepository {
    async fn list_for_listing(
        &self,
        caller: &Caller,
        listing_id: &ListingId,
    ) -> Result<Vec<Testimonial>, TestimonialRepositoryError> {
        self.list_where(caller, "service_id", eq(listing_id)).await
    }

    async fn list_for_provider(
        &self,
        caller: &Caller,
        provider_id: &UserId,
    ) -> Result<Vec<Testimonial>, TestimonialRepositoryError> {
        self.list_where(caller, "to_user_id", eq(provider_id)).await
    }

    async fn insert(
        &self,
        caller: &Caller,
        draft: &TestimonialDraft,
    ) -> Result<(), TestimonialRepositoryError> {
        let url = self.client.endpoint(TABLE)?;
        let request = self
            .client
            .json_request(Method::POST, url, caller.access_token())
            .header("Prefer", RETURN_MINIMAL)
            .json(&NewTestimonialRow::from(draft));
        self.client.send(request).await?;
        Ok(())
    }
}
