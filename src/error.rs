// src/error.rs

//! Unified error handling for the sync application.

use std::fmt;

use thiserror::Error;

/// Result type alias for sync operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// A feed page request returned a non-success status
    #[error("Feed fetch failed for {url}: {status}")]
    Feed { url: String, status: String },

    /// Reading from the event catalog failed
    #[error("Catalog read error: {0}")]
    CatalogRead(String),

    /// Writing to the event catalog failed
    #[error("Catalog write error: {0}")]
    CatalogWrite(String),

    /// Uploading a banner image failed
    #[error("Asset upload error: {0}")]
    AssetUpload(String),

    /// Downloading a source banner image failed
    #[error("Asset download error: {0}")]
    AssetDownload(String),

    /// Removing a mirrored banner failed
    #[error("Asset removal error: {0}")]
    AssetRemove(String),

    /// Change-cache read/write/delete failed
    #[error("Cache error: {0}")]
    Cache(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a feed fetch error.
    pub fn feed(url: impl Into<String>, status: impl fmt::Display) -> Self {
        Self::Feed {
            url: url.into(),
            status: status.to_string(),
        }
    }

    /// Create a catalog read error.
    pub fn catalog_read(message: impl fmt::Display) -> Self {
        Self::CatalogRead(message.to_string())
    }

    /// Create a catalog write error.
    pub fn catalog_write(message: impl fmt::Display) -> Self {
        Self::CatalogWrite(message.to_string())
    }

    /// Create an asset upload error.
    pub fn asset_upload(message: impl fmt::Display) -> Self {
        Self::AssetUpload(message.to_string())
    }

    /// Create an asset download error.
    pub fn asset_download(message: impl fmt::Display) -> Self {
        Self::AssetDownload(message.to_string())
    }

    /// Create an asset removal error.
    pub fn asset_remove(message: impl fmt::Display) -> Self {
        Self::AssetRemove(message.to_string())
    }

    /// Create a cache error.
    pub fn cache(message: impl fmt::Display) -> Self {
        Self::Cache(message.to_string())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
