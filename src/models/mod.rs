// src/models/mod.rs

//! Domain models for the sync application.

mod config;
mod event;

// Re-export all public types
pub use config::{
    AssetConfig, CacheConfig, CatalogConfig, Config, FeedConfig, SyncConfig,
};
pub use event::{CandidateEvent, CatalogEvent, SyncEvent};
