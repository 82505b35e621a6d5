//! `service_requests` table adapter.

use async_trait::async_trait;
use reqwest::Method;

use super::client::{BaasClient, Failure, RETURN_MINIMAL};
use super::dto::NewServiceRequestRow;
use crate::domain::auth::Caller;
use crate::domain::ports::{ServiceRequestRepository, ServiceRequestRepositoryError};
use crate::domain::service_request::ServiceRequestDraft;

impl From<Failure> for ServiceRequestRepositoryError {
    fn from(failure: Failure) -> Self {
        match failure {
            Failure::Unauthorized(message) => Self::unauthorized(message),
            Failure::Rejected(message) => Self::rejected(message),
            Failure::Unavailable(message) | Failure::Decode(message) => Self::unavailable(message),
        }
    }
}

/// [`ServiceRequestRepository`] over the hosted REST API.
#[derive(Debug, Clone)]
pub struct BaasServiceRequestRepository {
    client: BaasClient,
}

impl BaasServiceRequestRepository {
    /// Repository sharing `client`.
    #[must_use]
    pub const fn new(client: BaasClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ServiceRequestRepository for BaasServiceRequestRepository {
    async fn insert(
        &self,
        caller: &Caller,
        draft: &ServiceRequestDraft,
    ) -> Result<(), ServiceRequestRepositoryError> {
        let url = self.client.endpoint("rest/v1/service_requests")?;
        let request = self
            .client
            .json_request(Method::POST, url, caller.access_token())
            .header("Prefer", RETURN_MINIMAL)
            .json(&NewServiceRequestRow::from(draft));
        self.client.send(request).await?;
        Ok(())
    }
}
