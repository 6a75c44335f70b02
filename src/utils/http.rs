// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use crate::error::Result;
use crate::models::FeedConfig;

/// Create a configured asynchronous HTTP client.
///
/// One client is shared by the feed, the stores, and image downloads.
pub fn create_async_client(config: &FeedConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}
