//! Workers KV change cache.
//!
//! Talks to the Cloudflare KV REST API: `GET`/`PUT`/`DELETE` on
//! `{namespace_url}/values/{key}`. A `GET` 404 means the key is absent.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::error::{AppError, Result};
use crate::models::CacheConfig;
use crate::storage::ChangeCache;

/// HTTP-backed key-value change cache.
#[derive(Clone)]
pub struct HttpKvCache {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpKvCache {
    /// Create a new KV cache client for a namespace URL.
    pub fn new(client: Client, base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    /// Create a KV cache client from configuration.
    pub fn from_config(client: Client, config: &CacheConfig) -> Self {
        Self::new(client, config.url.trim_end_matches('/'), &config.token)
    }

    fn value_url(&self, key: &str) -> String {
        format!("{}/values/{}", self.base_url, key)
    }
}

#[async_trait]
impl ChangeCache for HttpKvCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let response = self
            .client
            .get(self.value_url(key))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(AppError::cache)?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                Ok(Some(response.text().await.map_err(AppError::cache)?))
            }
            status => Err(AppError::cache(format!("get {key}: {status}"))),
        }
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        let response = self
            .client
            .put(self.value_url(key))
            .bearer_auth(&self.token)
            .body(value.to_string())
            .send()
            .await
            .map_err(AppError::cache)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::cache(format!("put {key}: {status}")));
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.value_url(key))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(AppError::cache)?;

        let status = response.status();
        // Deleting a missing key is fine
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            return Err(AppError::cache(format!("delete {key}: {status}")));
        }
        Ok(())
    }
}
