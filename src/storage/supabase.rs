//! Supabase storage implementations.
//!
//! The catalog lives in a Postgres table reached through PostgREST
//! (`/rest/v1`), mirrored banners in a storage bucket (`/storage/v1`).
//! Both share one HTTP client and the service-role key.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE};

use crate::error::{AppError, Result};
use crate::models::{AssetConfig, CatalogConfig, CatalogEvent};
use crate::storage::{AssetStore, CatalogStore, ImageSource};

/// PostgREST-backed event catalog.
#[derive(Clone)]
pub struct SupabaseCatalog {
    client: Client,
    base_url: String,
    api_key: String,
    table: String,
}

impl SupabaseCatalog {
    /// Create a new catalog store.
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            table: table.into(),
        }
    }

    /// Create a catalog store from configuration.
    pub fn from_config(client: Client, config: &CatalogConfig) -> Self {
        Self::new(client, config.url.trim_end_matches('/'), &config.api_key, &config.table)
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn read_rows(&self, url: &str) -> Result<Vec<CatalogEvent>> {
        let response = self
            .authed(self.client.get(url))
            .send()
            .await
            .map_err(AppError::catalog_read)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::catalog_read(format!("{status}: {body}")));
        }
        response.json().await.map_err(AppError::catalog_read)
    }
}

#[async_trait]
impl CatalogStore for SupabaseCatalog {
    async fn fetch_all(&self) -> Result<Vec<CatalogEvent>> {
        let url = format!("{}?select=*", self.table_url());
        self.read_rows(&url).await
    }

    async fn fetch_one(&self, id: i64) -> Result<Option<CatalogEvent>> {
        let url = format!("{}?id=eq.{}&select=*", self.table_url(), id);
        let mut rows = self.read_rows(&url).await?;
        Ok(rows.drain(..).next())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let url = format!("{}?id=eq.{}", self.table_url(), id);
        let response = self
            .authed(self.client.delete(&url))
            .send()
            .await
            .map_err(AppError::catalog_write)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::catalog_write(format!(
                "delete id {id}: {status}: {body}"
            )));
        }
        Ok(())
    }

    async fn upsert(&self, event: &CatalogEvent) -> Result<()> {
        let url = format!("{}?on_conflict=id", self.table_url());
        let response = self
            .authed(self.client.post(&url))
            .header("Prefer", "resolution=merge-duplicates")
            .json(&[event])
            .send()
            .await
            .map_err(AppError::catalog_write)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::catalog_write(format!(
                "upsert id {}: {status}: {body}",
                event.id
            )));
        }
        Ok(())
    }
}

/// Supabase storage bucket holding mirrored banners.
#[derive(Clone)]
pub struct SupabaseAssets {
    client: Client,
    base_url: String,
    api_key: String,
    bucket: String,
    cache_control_secs: u64,
}

impl SupabaseAssets {
    /// Create a new asset store.
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        config: &AssetConfig,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            bucket: config.bucket.clone(),
            cache_control_secs: config.cache_control_secs,
        }
    }

    fn object_url(&self, name: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, name)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
    }
}

#[async_trait]
impl AssetStore for SupabaseAssets {
    async fn upload(&self, name: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        let response = self
            .authed(self.client.post(self.object_url(name)))
            .header(CONTENT_TYPE, content_type)
            .header(CACHE_CONTROL, format!("max-age={}", self.cache_control_secs))
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await
            .map_err(AppError::asset_upload)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::asset_upload(format!("{name}: {status}: {body}")));
        }
        Ok(())
    }

    async fn remove(&self, names: &[String]) -> Result<()> {
        if names.is_empty() {
            return Ok(());
        }
        let url = format!("{}/storage/v1/object/{}", self.base_url, self.bucket);
        let response = self
            .authed(self.client.delete(&url))
            .json(&serde_json::json!({ "prefixes": names }))
            .send()
            .await
            .map_err(AppError::asset_remove)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::asset_remove(format!(
                "{names:?}: {status}: {body}"
            )));
        }
        Ok(())
    }

    fn public_url(&self, name: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, name
        )
    }
}

/// Downloads source banners over HTTP.
#[derive(Clone)]
pub struct HttpImageSource {
    client: Client,
}

impl HttpImageSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn download(&self, url: &str) -> Result<(Vec<u8>, String)> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(AppError::asset_download)?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::asset_download(format!("{url}: {status}")));
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/png")
            .to_string();
        let bytes = response.bytes().await.map_err(AppError::asset_download)?;
        Ok((bytes.to_vec(), content_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answer every request with a 500 until the test ends.
    async fn spawn_error_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    let _ = socket.read(&mut buf).await;
                    let _ = socket
                        .write_all(
                            b"HTTP/1.1 500 Error\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
                        )
                        .await;
                });
            }
        });
        base
    }

    fn assets() -> SupabaseAssets {
        SupabaseAssets::new(
            Client::new(),
            "https://project.supabase.co",
            "key",
            &AssetConfig::default(),
        )
    }

    #[test]
    fn test_public_url_shape() {
        assert_eq!(
            assets().public_url("142.png"),
            "https://project.supabase.co/storage/v1/object/public/images/142.png"
        );
    }

    #[tokio::test]
    async fn test_remove_failure_reports_removal_error() {
        let base = spawn_error_server().await;
        let assets = SupabaseAssets::new(Client::new(), base, "key", &AssetConfig::default());

        let err = assets.remove(&["1.png".to_string()]).await.unwrap_err();
        assert!(matches!(err, AppError::AssetRemove(_)));
    }

    #[test]
    fn test_catalog_table_url() {
        let catalog = SupabaseCatalog::new(
            Client::new(),
            "https://project.supabase.co",
            "key",
            "events",
        );
        assert_eq!(
            catalog.table_url(),
            "https://project.supabase.co/rest/v1/events"
        );
    }
}
