//! AWS Lambda entry point for eventsync
//!
//! Deploy with `cargo lambda build --release --features lambda` and trigger
//! on a cron schedule.
//!
//! ## Environment Variables
//!
//! - `FEED_BASE_URL`: first page of the event collection listing
//! - `SUPABASE_URL` / `SUPABASE_KEY`: catalog and asset store credentials
//! - `CATALOG_TABLE`: catalog table name (default: `events`)
//! - `ASSET_BUCKET`: storage bucket for mirrored banners (default: `images`)
//! - `KV_URL` / `KV_TOKEN`: change-cache namespace and bearer token
//! - `CACHE_PREFIX`: hash key prefix (default: `kp_event_hash_`)
//! - `SYNC_TIMEZONE`: reference timezone (default: `America/Halifax`)
//! - `MAX_CONCURRENT`: per-event concurrency bound
//! - `RUST_LOG`: log level (e.g., `info`, `debug`)

use lambda_runtime::service_fn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use eventsync::handler;

/// Main entry point for the AWS Lambda function.
#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    tracing::info!("eventsync Lambda starting...");
    lambda_runtime::run(service_fn(handler::handler)).await
}
