//! Storage abstractions for the external collaborators.
//!
//! The reconciler talks to three independently consistent systems plus an
//! image source, each behind a trait:
//!
//! - [`CatalogStore`]: the persisted event catalog (relational)
//! - [`AssetStore`]: content-addressed-by-name banner storage
//! - [`ChangeCache`]: key-value store of last-seen content hashes
//! - [`ImageSource`]: fetches source banner bytes
//!
//! Production deployments use the Supabase/KV implementations; the memory
//! backend serves development and tests.

pub mod kv;
pub mod memory;
pub mod supabase;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::CatalogEvent;

// Re-export for convenience
pub use kv::HttpKvCache;
pub use memory::{MemoryAssets, MemoryCache, MemoryCatalog, MemoryImages};
pub use supabase::{HttpImageSource, SupabaseAssets, SupabaseCatalog};

/// Trait for the persisted event catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Load the full catalog.
    async fn fetch_all(&self) -> Result<Vec<CatalogEvent>>;

    /// Load a single record by id, if present.
    async fn fetch_one(&self, id: i64) -> Result<Option<CatalogEvent>>;

    /// Delete a record by id. Deleting a missing id is not an error.
    async fn delete(&self, id: i64) -> Result<()>;

    /// Insert or replace a record, keyed by id.
    async fn upsert(&self, event: &CatalogEvent) -> Result<()>;
}

/// Trait for the banner image store.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Upload an object under the given name, overwriting any existing one.
    async fn upload(&self, name: &str, bytes: Vec<u8>, content_type: &str) -> Result<()>;

    /// Remove the named objects. Removing missing objects is not an error.
    async fn remove(&self, names: &[String]) -> Result<()>;

    /// Resolve the public URL for an object name.
    fn public_url(&self, name: &str) -> String;
}

/// Trait for the change-detection cache.
#[async_trait]
pub trait ChangeCache: Send + Sync {
    /// Read the stored hash for a key, if any.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a hash under a key.
    async fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a key. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Trait for downloading source banner images.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Download an image, returning its bytes and content type.
    async fn download(&self, url: &str) -> Result<(Vec<u8>, String)>;
}
