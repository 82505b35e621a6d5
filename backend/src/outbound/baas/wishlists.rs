//! `wishlists` table adapter.

use async_trait::async_trait;
use reqwest::Method;

use super::client::{BaasClient, RETURN_MINIMAL, eq, impl_from_failure};
use super::dto::{NewWishlistRow, WishlistIdRow, WishlistRow};
use crate::domain::auth::Caller;
use crate::domain::ports::{WishlistRepository, WishlistRepositoryError};
use crate::domain::user::UserId;
use crate::domain::wishlist::{WishlistEntry, WishlistEntryId};

impl_from_failure!(WishlistRepositoryError);

const TABLE: &str = "rest/v1/wishlists";
const LIST_SELECT: &str = "*,profiles!wishlists_provider_id_fkey(full_name,email)";

/// [`WishlistRepository`] over the hosted REST API.
#[derive(Debug, Clone)]
pub struct BaasWishlistRepository {
    client: BaasClient,
}

impl BaasWishlistRepository {
    /// Repository sharing `client`.
    #[must_use]
    pub const fn new(client: BaasClient) -> Self {
        Self { client }
    }

    async fn delete_where(
        &self,
        caller: &Caller,
        filters: &[(&str, String)],
    ) -> Result<(), WishlistRepositoryError> {
        let url = self.client.endpoint(TABLE)?;
        let request = self
            .client
            .request(Method::DELETE, url, caller.access_token())
            .query(filters);
        self.client.send(request).await?;
        Ok(())
    }
}

#[async_trait]
impl WishlistRepository for BaasWishlistRepository {
    async fn list_for_user(
        &self,
        caller: &Caller,
        user_id: &UserId,
    ) -> Result<Vec<WishlistEntry>, WishlistRepositoryError> {
        let url = self.client.endpoint(TABLE)?;
        let request = self
            .client
            .request(Method::GET, url, caller.access_token())
            .query(&[("select", LIST_SELECT.to_owned()), ("user_id", eq(user_id))]);
        let rows: Vec<WishlistRow> = self.client.fetch(request).await?;
        Ok(rows.into_iter().map(WishlistEntry::from).collect())
    }

    async fn find(
        &self,
        caller: &Caller,
        user_id: &UserId,
        provider_id: &UserId,
    ) -> Result<Option<WishlistEntryId>, WishlistRepositoryError> {
        let url = self.client.endpoint(TABLE)?;
        let request = self
            .client
            .request(Method::GET, url, caller.access_token())
            .query(&[
                ("select", "id".to_owned()),
                ("user_id", eq(user_id)),
                ("provider_id", eq(provider_id)),
                ("limit", "1".to_owned()),
            ]);
        let rows: Vec<WishlistIdRow> = self.client.fetch(request).await?;
        Ok(rows.into_iter().next().map(|row| row.id))
    }

    async fn add(
        &self,
        caller: &Caller,
        user_id: &UserId,
        provider_id: &UserId,
    ) -> Result<(), WishlistRepositoryError> {
        let url = self.client.endpoint(TABLE)?;
        let body = NewWishlistRow {
            user_id: *user_id,
            provider_id: *provider_id,
        };
        let request = self
            .client
            .json_request(Method::POST, url, caller.access_token())
            .header("Prefer", RETURN_MINIMAL)
            .json(&body);
        self.client.send(request).await?;
        Ok(())
    }

    async fn remove_provider(
        &self,
        caller: &Caller,
        user_id: &UserId,
        provider_id: &UserId,
    ) -> Result<(), WishlistRepositoryError> {
        self.delete_where(
            caller,
            &[("user_id", eq(user_id)), ("provider_id", eq(provider_id))],
        )
        .await
    }

    async fn remove(
        &self,
        caller: &Caller,
        id: &WishlistEntryId,
    ) -> Result<(), WishlistRepositoryError> {
        self.delete_where(caller, &[("id", eq(id))]).await
    }
}
