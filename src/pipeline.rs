// src/pipeline.rs

//! One reconciliation run, end to end.

use std::time::Instant;

use tracing::info;

use crate::error::Result;
use crate::models::Config;
use crate::reconcile::{Reconciler, RunStats, SyncOptions};
use crate::services::FeedClient;
use crate::storage::{HttpImageSource, HttpKvCache, SupabaseAssets, SupabaseCatalog};
use crate::utils::http;

/// Run one full sync: fetch the feed, reconcile, report.
pub async fn run_sync(config: &Config) -> Result<RunStats> {
    let started = Instant::now();
    info!("Sync run starting");

    config.validate()?;

    let client = http::create_async_client(&config.feed)?;
    let feed = FeedClient::new(client.clone(), &config.feed.base_url);
    let catalog = SupabaseCatalog::from_config(client.clone(), &config.catalog);
    let assets = SupabaseAssets::new(
        client.clone(),
        config.catalog.url.trim_end_matches('/'),
        &config.catalog.api_key,
        &config.assets,
    );
    let cache = HttpKvCache::from_config(client.clone(), &config.cache);
    let images = HttpImageSource::new(client);

    let options = SyncOptions::from_config(config)?;
    let reconciler = Reconciler::new(&catalog, &assets, &cache, &images, options);

    let candidates = feed.fetch_all().await?;
    info!("Fetched {} candidates from the feed", candidates.len());

    let stats = reconciler.run(candidates).await?;

    info!(
        "Sync run complete in {} ms: {} published, {} orphans purged, {} expired, {} updated, {} skipped",
        started.elapsed().as_millis(),
        stats.published,
        stats.orphans_purged,
        stats.expired_purged,
        stats.updated,
        stats.skipped
    );

    Ok(stats)
}
