//! Application configuration structures.

use std::fs;
use std::path::Path;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote feed settings
    #[serde(default)]
    pub feed: FeedConfig,

    /// Event catalog (PostgREST) settings
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Banner image storage settings
    #[serde(default)]
    pub assets: AssetConfig,

    /// Change-detection cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Reconciliation behavior settings
    #[serde(default)]
    pub sync: SyncConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Apply environment variable overrides.
    ///
    /// Used in the Lambda environment where no config file is bundled.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("FEED_BASE_URL") {
            self.feed.base_url = url;
        }
        if let Ok(url) = std::env::var("SUPABASE_URL") {
            self.catalog.url = url;
        }
        if let Ok(key) = std::env::var("SUPABASE_KEY") {
            self.catalog.api_key = key;
        }
        if let Ok(table) = std::env::var("CATALOG_TABLE") {
            self.catalog.table = table;
        }
        if let Ok(bucket) = std::env::var("ASSET_BUCKET") {
            self.assets.bucket = bucket;
        }
        if let Ok(url) = std::env::var("KV_URL") {
            self.cache.url = url;
        }
        if let Ok(token) = std::env::var("KV_TOKEN") {
            self.cache.token = token;
        }
        if let Ok(prefix) = std::env::var("CACHE_PREFIX") {
            self.cache.prefix = prefix;
        }
        if let Ok(tz) = std::env::var("SYNC_TIMEZONE") {
            self.sync.timezone = tz;
        }
        if let Ok(n) = std::env::var("MAX_CONCURRENT") {
            if let Ok(n) = n.parse() {
                self.sync.max_concurrent = n;
            }
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.feed.base_url.trim().is_empty() {
            return Err(AppError::validation("feed.base_url is empty"));
        }
        if self.feed.user_agent.trim().is_empty() {
            return Err(AppError::validation("feed.user_agent is empty"));
        }
        if self.feed.timeout_secs == 0 {
            return Err(AppError::validation("feed.timeout_secs must be > 0"));
        }
        if self.catalog.url.trim().is_empty() {
            return Err(AppError::validation("catalog.url is empty"));
        }
        if self.catalog.api_key.trim().is_empty() {
            return Err(AppError::validation("catalog.api_key is empty"));
        }
        if self.catalog.table.trim().is_empty() {
            return Err(AppError::validation("catalog.table is empty"));
        }
        if self.assets.bucket.trim().is_empty() {
            return Err(AppError::validation("assets.bucket is empty"));
        }
        if self.cache.prefix.trim().is_empty() {
            return Err(AppError::validation("cache.prefix is empty"));
        }
        if self.sync.max_concurrent == 0 {
            return Err(AppError::validation("sync.max_concurrent must be > 0"));
        }
        url::Url::parse(&self.feed.base_url)?;
        url::Url::parse(&self.catalog.url)?;
        if !self.cache.url.trim().is_empty() {
            url::Url::parse(&self.cache.url)?;
        }
        self.sync.reference_timezone()?;
        Ok(())
    }
}

/// Remote feed settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// First page of the event collection listing
    #[serde(default = "defaults::feed_base_url")]
    pub base_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::feed_base_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Event catalog settings (Supabase PostgREST).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Supabase project URL
    #[serde(default)]
    pub url: String,

    /// Service-role API key
    #[serde(default)]
    pub api_key: String,

    /// Table holding catalog events
    #[serde(default = "defaults::catalog_table")]
    pub table: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            table: defaults::catalog_table(),
        }
    }
}

/// Banner image storage settings (Supabase storage bucket).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Storage bucket name
    #[serde(default = "defaults::asset_bucket")]
    pub bucket: String,

    /// Cache-Control max-age applied to uploads, in seconds
    #[serde(default = "defaults::cache_control_secs")]
    pub cache_control_secs: u64,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            bucket: defaults::asset_bucket(),
            cache_control_secs: defaults::cache_control_secs(),
        }
    }
}

/// Change-detection cache settings (Workers KV REST).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// KV namespace base URL
    #[serde(default)]
    pub url: String,

    /// Bearer token for the KV API
    #[serde(default)]
    pub token: String,

    /// Key prefix for event hash entries
    #[serde(default = "defaults::cache_prefix")]
    pub prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            token: String::new(),
            prefix: defaults::cache_prefix(),
        }
    }
}

/// Reconciliation behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Reference timezone for expiry checks (IANA name)
    #[serde(default = "defaults::timezone")]
    pub timezone: String,

    /// Maximum concurrent per-event operations
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl SyncConfig {
    /// Parse the configured reference timezone.
    pub fn reference_timezone(&self) -> Result<Tz> {
        self.timezone.parse::<Tz>().map_err(|e| {
            AppError::validation(format!("sync.timezone '{}': {}", self.timezone, e))
        })
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            timezone: defaults::timezone(),
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

/// Default values for configuration fields.
mod defaults {
    pub fn feed_base_url() -> String {
        "https://www.showpass.com/api/public/events/?venue__in=11799".to_string()
    }

    pub fn user_agent() -> String {
        format!("eventsync/{}", env!("CARGO_PKG_VERSION"))
    }

    pub fn timeout() -> u64 {
        30
    }

    pub fn catalog_table() -> String {
        "events".to_string()
    }

    pub fn asset_bucket() -> String {
        "images".to_string()
    }

    pub fn cache_control_secs() -> u64 {
        3600
    }

    pub fn cache_prefix() -> String {
        "kp_event_hash_".to_string()
    }

    pub fn timezone() -> String {
        "America/Halifax".to_string()
    }

    pub fn max_concurrent() -> usize {
        8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_fails_validation_without_credentials() {
        let config = Config::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_populated_config_validates() {
        let mut config = Config::default();
        config.catalog.url = "https://project.supabase.co".into();
        config.catalog.api_key = "key".into();
        config.cache.url = "https://kv.example.com/ns".into();
        config.cache.token = "token".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_malformed_catalog_url_rejected() {
        let mut config = Config::default();
        config.catalog.url = "not a url".into();
        config.catalog.api_key = "key".into();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, AppError::Url(_)));
    }

    #[test]
    fn test_invalid_timezone_rejected() {
        let mut config = Config::default();
        config.catalog.url = "https://project.supabase.co".into();
        config.catalog.api_key = "key".into();
        config.sync.timezone = "Not/AZone".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[feed]
base_url = "https://feed.example.com/events/"

[catalog]
url = "https://project.supabase.co"
api_key = "secret"

[sync]
timezone = "America/Halifax"
max_concurrent = 4
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.feed.base_url, "https://feed.example.com/events/");
        assert_eq!(config.sync.max_concurrent, 4);
        assert_eq!(config.catalog.table, "events");
        assert!(config.sync.reference_timezone().is_ok());
    }

    #[test]
    fn test_load_or_default_on_missing_file() {
        let config = Config::load_or_default("/nonexistent/config.toml");
        assert_eq!(config.cache.prefix, "kp_event_hash_");
    }
}
