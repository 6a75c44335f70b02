//! In-memory storage backend.
//!
//! Backs development runs and tests with plain maps behind the same traits
//! as the production stores. Each store counts its write operations so
//! tests can assert that a no-op run performs no writes.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::CatalogEvent;
use crate::storage::{AssetStore, CatalogStore, ChangeCache, ImageSource};

/// In-memory event catalog.
#[derive(Default)]
pub struct MemoryCatalog {
    records: Mutex<HashMap<i64, CatalogEvent>>,
    upserts: AtomicUsize,
    deletes: AtomicUsize,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the catalog with existing records.
    pub fn with_records(records: impl IntoIterator<Item = CatalogEvent>) -> Self {
        let catalog = Self::default();
        {
            let mut map = catalog.records.lock().unwrap();
            for record in records {
                map.insert(record.id, record);
            }
        }
        catalog
    }

    pub fn contains(&self, id: i64) -> bool {
        self.records.lock().unwrap().contains_key(&id)
    }

    pub fn get(&self, id: i64) -> Option<CatalogEvent> {
        self.records.lock().unwrap().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn upsert_count(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn fetch_all(&self) -> Result<Vec<CatalogEvent>> {
        Ok(self.records.lock().unwrap().values().cloned().collect())
    }

    async fn fetch_one(&self, id: i64) -> Result<Option<CatalogEvent>> {
        Ok(self.get(id))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.records.lock().unwrap().remove(&id);
        self.deletes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn upsert(&self, event: &CatalogEvent) -> Result<()> {
        self.records.lock().unwrap().insert(event.id, event.clone());
        self.upserts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// In-memory asset store.
#[derive(Default)]
pub struct MemoryAssets {
    objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
    uploads: AtomicUsize,
    removals: AtomicUsize,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with an existing object.
    pub fn with_object(self, name: &str, bytes: Vec<u8>) -> Self {
        self.objects
            .lock()
            .unwrap()
            .insert(name.to_string(), (bytes, "image/png".to_string()));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.objects.lock().unwrap().contains_key(name)
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn removal_count(&self) -> usize {
        self.removals.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssetStore for MemoryAssets {
    async fn upload(&self, name: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        self.objects
            .lock()
            .unwrap()
            .insert(name.to_string(), (bytes, content_type.to_string()));
        self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn remove(&self, names: &[String]) -> Result<()> {
        let mut objects = self.objects.lock().unwrap();
        for name in names {
            objects.remove(name);
        }
        self.removals.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn public_url(&self, name: &str) -> String {
        format!("memory://assets/{name}")
    }
}

/// In-memory change cache.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
    puts: AtomicUsize,
    deletes: AtomicUsize,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the cache with an entry.
    pub fn with_entry(self, key: &str, value: &str) -> Self {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn peek(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChangeCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.peek(key))
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.lock().unwrap().remove(key);
        self.deletes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// In-memory image source serving canned bytes per URL.
#[derive(Default)]
pub struct MemoryImages {
    images: Mutex<HashMap<String, Vec<u8>>>,
    downloads: AtomicUsize,
}

impl MemoryImages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the bytes served for a source URL.
    pub fn with_image(self, url: &str, bytes: Vec<u8>) -> Self {
        self.images
            .lock()
            .unwrap()
            .insert(url.to_string(), bytes);
        self
    }

    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageSource for MemoryImages {
    async fn download(&self, url: &str) -> Result<(Vec<u8>, String)> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        let images = self.images.lock().unwrap();
        match images.get(url) {
            Some(bytes) => Ok((bytes.clone(), "image/png".to_string())),
            None => Err(AppError::asset_download(format!("unknown image: {url}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(id: i64) -> CatalogEvent {
        CatalogEvent {
            id,
            name: format!("Event {id}"),
            starts_on: Utc::now(),
            slug: format!("event-{id}"),
            mirrored_image_ref: None,
            original_image_url: None,
        }
    }

    #[tokio::test]
    async fn test_catalog_upsert_replaces() {
        let catalog = MemoryCatalog::new();
        catalog.upsert(&record(1)).await.unwrap();
        let mut updated = record(1);
        updated.name = "Renamed".to_string();
        catalog.upsert(&updated).await.unwrap();

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(1).unwrap().name, "Renamed");
        assert_eq!(catalog.upsert_count(), 2);
    }

    #[tokio::test]
    async fn test_cache_roundtrip_and_counts() {
        let cache = MemoryCache::new();
        assert!(cache.get("k").await.unwrap().is_none());
        cache.put("k", "abc").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("abc"));
        cache.delete("k").await.unwrap();
        assert!(cache.get("k").await.unwrap().is_none());
        assert_eq!(cache.put_count(), 1);
        assert_eq!(cache.delete_count(), 1);
    }

    #[tokio::test]
    async fn test_assets_remove_missing_is_ok() {
        let assets = MemoryAssets::new();
        assert!(assets.remove(&["nope.png".to_string()]).await.is_ok());
    }
}
