//! Server-side cart reached over the storefront API.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::CartStoreError;
use crate::domain::aggregates::CartItem;
use crate::http::auth::USER_ID_HEADER;

#[async_trait]
pub trait RemoteCartStore: Send + Sync {
    async fn fetch(&self) -> Result<Vec<CartItem>, CartStoreError>;
    async fn save(&self, items: &[CartItem]) -> Result<(), CartStoreError>;
    /// Merges `items` into the server cart and returns the result.
    async fn merge(&self, items: &[CartItem]) -> Result<Vec<CartItem>, CartStoreError>;
}

#[async_trait]
impl<T: RemoteCartStore + ?Sized> RemoteCartStore for Arc<T> {
    async fn fetch(&self) -> Result<Vec<CartItem>, CartStoreError> {
        (**self).fetch().await
    }

    async fn save(&self, items: &[CartItem]) -> Result<(), CartStoreError> {
        (**self).save(items).await
    }

    async fn merge(&self, items: &[CartItem]) -> Result<Vec<CartItem>, CartStoreError> {
        (**self).merge(items).await
    }
}

#[derive(Serialize)]
struct CartBody<'a> {
    items: &'a [CartItem],
}

#[derive(Deserialize)]
struct ItemsResponse {
    #[serde(default)]
    items: Vec<CartItem>,
}

/// Cart endpoints for one signed-in user.
#[derive(Debug, Clone)]
pub struct HttpCartClient {
    client: reqwest::Client,
    base_url: String,
    user_id: String,
}

impl HttpCartClient {
    pub fn new(base_url: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, user_id)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>, user_id: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url, user_id: user_id.into() }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, CartStoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(CartStoreError::Rejected { status: status.as_u16(), body })
    }
}

#[async_trait]
impl RemoteCartStore for HttpCartClient {
    async fn fetch(&self) -> Result<Vec<CartItem>, CartStoreError> {
        let response = self.client.get(self.url("/api/cart")).header(USER_ID_HEADER, &self.user_id).send().await?;
        let body: ItemsResponse = Self::check(response).await?.json().await?;
        Ok(body.items)
    }

    async fn save(&self, items: &[CartItem]) -> Result<(), CartStoreError> {
        let response = self
            .client
            .post(self.url("/api/cart"))
            .header(USER_ID_HEADER, &self.user_id)
            .json(&CartBody { items })
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn merge(&self, items: &[CartItem]) -> Result<Vec<CartItem>, CartStoreError> {
        let response = self
            .client
            .post(self.url("/api/cart/merge"))
            .header(USER_ID_HEADER, &self.user_id)
            .json(&CartBody { items })
            .send()
            .await?;
        let body: ItemsResponse = Self::check(response).await?.json().await?;
        Ok(body.items)
    }
}
