// src/handler.rs

//! AWS Lambda handler for the scheduled sync.
//!
//! The trigger is a cron rule with no meaningful payload; all configuration
//! comes from environment variables. Errors are reported in the response
//! body rather than crashing the runtime, since the schedule itself is the
//! retry mechanism.

use lambda_runtime::{Error as LambdaError, LambdaEvent};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, instrument};

use crate::error::Result;
use crate::models::Config;
use crate::pipeline::run_sync;
use crate::reconcile::RunStats;

/// Lambda response payload.
#[derive(Debug, Default, Serialize)]
pub struct SyncResponse {
    /// Whether the run completed
    pub success: bool,

    /// Run counters, present on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<RunStats>,

    /// Error message if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Execution time in milliseconds
    pub execution_time_ms: u64,
}

/// Main Lambda handler function.
#[instrument(skip(event))]
pub async fn handler(event: LambdaEvent<Value>) -> std::result::Result<SyncResponse, LambdaError> {
    let start = std::time::Instant::now();
    info!("Scheduled sync triggered: {:?}", event.payload);

    match run_scheduled_sync().await {
        Ok(stats) => {
            let execution_time_ms = start.elapsed().as_millis() as u64;
            info!(
                "Sync succeeded: {} updated, {} skipped in {} ms",
                stats.updated, stats.skipped, execution_time_ms
            );
            Ok(SyncResponse {
                success: true,
                stats: Some(stats),
                error: None,
                execution_time_ms,
            })
        }
        Err(e) => {
            error!("Sync failed: {}", e);
            Ok(SyncResponse {
                success: false,
                error: Some(e.to_string()),
                execution_time_ms: start.elapsed().as_millis() as u64,
                ..SyncResponse::default()
            })
        }
    }
}

/// Build configuration from the environment and run one sync.
async fn run_scheduled_sync() -> Result<RunStats> {
    let mut config = Config::default();
    config.apply_env_overrides();
    run_sync(&config).await
}
