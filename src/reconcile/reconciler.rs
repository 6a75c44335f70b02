//! The reconciler: merges the remote candidate set against the catalog and
//! issues the minimal set of deletes, uploads, and upserts.
//!
//! One run is a pure function of current external state (feed + catalog +
//! cache), so a crashed run is self-healing: the next run reprocesses any
//! unfinished ids and skips everything already applied.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::Result;
use crate::models::{CandidateEvent, CatalogEvent, Config, SyncEvent};
use crate::reconcile::hash::{CacheKeys, signature_hash};
use crate::reconcile::merge::{merge_events, orphan_ids};
use crate::storage::{AssetStore, CatalogStore, ChangeCache, ImageSource};

/// Reconciliation settings threaded in at construction.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Cache key prefix for hash entries
    pub cache_prefix: String,

    /// Reference timezone for expiry checks
    pub timezone: Tz,

    /// Bound on concurrent per-event operations
    pub max_concurrent: usize,
}

impl SyncOptions {
    /// Build options from the application configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            cache_prefix: config.cache.prefix.clone(),
            timezone: config.sync.reference_timezone()?,
            max_concurrent: config.sync.max_concurrent.max(1),
        })
    }
}

/// Counters for one reconciliation run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStats {
    /// Published candidates considered
    pub published: usize,

    /// Catalog events purged as orphans
    pub orphans_purged: usize,

    /// Events purged because their start time has passed
    pub expired_purged: usize,

    /// Events upserted (created or changed)
    pub updated: usize,

    /// Events skipped as unchanged
    pub skipped: usize,
}

/// Per-event processing outcome.
enum Outcome {
    Expired,
    Skipped,
    Updated,
}

/// Deterministic asset-store object name for an event id.
fn object_name(id: i64) -> String {
    format!("{id}.png")
}

/// Core reconciliation engine over the external stores.
pub struct Reconciler<'a> {
    catalog: &'a dyn CatalogStore,
    assets: &'a dyn AssetStore,
    cache: &'a dyn ChangeCache,
    images: &'a dyn ImageSource,
    options: SyncOptions,
}

impl<'a> Reconciler<'a> {
    /// Create a new reconciler over the given stores.
    pub fn new(
        catalog: &'a dyn CatalogStore,
        assets: &'a dyn AssetStore,
        cache: &'a dyn ChangeCache,
        images: &'a dyn ImageSource,
        options: SyncOptions,
    ) -> Self {
        Self {
            catalog,
            assets,
            cache,
            images,
            options,
        }
    }

    /// Run one reconciliation over an unfiltered candidate set.
    ///
    /// Any store failure aborts the run; outstanding concurrent work for
    /// the run is dropped and the first error propagates.
    pub async fn run(&self, candidates: Vec<CandidateEvent>) -> Result<RunStats> {
        let published: Vec<CandidateEvent> =
            candidates.into_iter().filter(|e| e.is_published).collect();
        let catalog_events = self.catalog.fetch_all().await?;

        info!(
            "Reconciling {} published candidates against {} catalog events",
            published.len(),
            catalog_events.len()
        );

        let mut stats = RunStats {
            published: published.len(),
            ..RunStats::default()
        };

        // Phase 1: purge orphans, concurrently per id.
        let orphans = orphan_ids(&catalog_events, &published);
        let orphan_events = catalog_events.iter().filter(|e| orphans.contains(&e.id));

        let mut purges = stream::iter(orphan_events)
            .map(|event| async move {
                debug!("Purging orphaned event {}", event.id);
                self.purge(event.id, event.mirrored_image_ref.is_some())
                    .await
            })
            .buffer_unordered(self.options.max_concurrent);

        while let Some(result) = purges.next().await {
            result?;
            stats.orphans_purged += 1;
        }
        drop(purges);

        // Phase 2: merge, then update-or-skip per event.
        let merged = merge_events(&catalog_events, &published, &orphans);
        let now = Utc::now();

        let mut outcomes = stream::iter(merged)
            .map(|event| self.process_event(event, now))
            .buffer_unordered(self.options.max_concurrent);

        while let Some(result) = outcomes.next().await {
            match result? {
                Outcome::Expired => stats.expired_purged += 1,
                Outcome::Skipped => stats.skipped += 1,
                Outcome::Updated => stats.updated += 1,
            }
        }

        Ok(stats)
    }

    /// Decide and apply the fate of one merged event.
    async fn process_event(&self, event: SyncEvent, now: DateTime<Utc>) -> Result<Outcome> {
        // Expiry check in the reference timezone
        let starts = event.starts_on.with_timezone(&self.options.timezone);
        if starts < now.with_timezone(&self.options.timezone) {
            debug!("Event {} has already started, purging", event.id);
            self.purge(event.id, event.mirrored_image_ref.is_some())
                .await?;
            return Ok(Outcome::Expired);
        }

        // Change detection against every cache generation
        let hash = signature_hash(&event);
        let keys = CacheKeys::new(&self.options.cache_prefix, event.id);
        for key in keys.all() {
            if self.cache.get(key).await?.as_deref() == Some(hash.as_str()) {
                debug!("Event {} unchanged, skipping", event.id);
                return Ok(Outcome::Skipped);
            }
        }

        info!("Event {} changed, updating", event.id);
        let existing = self.catalog.fetch_one(event.id).await?;
        let mirrored_image_ref = self.sync_image(&event, existing.as_ref()).await?;

        let record = CatalogEvent {
            id: event.id,
            name: event.name,
            starts_on: event.starts_on,
            slug: event.slug,
            mirrored_image_ref,
            original_image_url: event.source_image_url,
        };
        self.catalog.upsert(&record).await?;

        // Only the current generation is ever written
        self.cache.put(keys.current(), &hash).await?;
        Ok(Outcome::Updated)
    }

    /// Remove one event's record, mirrored image, and cache generations.
    async fn purge(&self, id: i64, mirrored: bool) -> Result<()> {
        let keys = CacheKeys::new(&self.options.cache_prefix, id);

        let remove_mirror = async {
            if mirrored {
                self.assets.remove(&[object_name(id)]).await?;
            }
            Ok::<(), crate::error::AppError>(())
        };
        let clear_cache = async {
            for key in keys.all() {
                self.cache.delete(key).await?;
            }
            Ok::<(), crate::error::AppError>(())
        };

        futures::try_join!(self.catalog.delete(id), remove_mirror, clear_cache)?;
        Ok(())
    }

    /// Bring the mirrored banner in line with the event's source URL.
    ///
    /// Returns the mirror reference to persist. The mirror is replaced only
    /// when the source URL differs from the previously recorded one
    /// (including the no-prior-record case); a matching URL keeps the
    /// existing reference untouched.
    async fn sync_image(
        &self,
        event: &SyncEvent,
        existing: Option<&CatalogEvent>,
    ) -> Result<Option<String>> {
        if let Some(prior) = existing {
            if prior.original_image_url == event.source_image_url {
                return Ok(prior.mirrored_image_ref.clone());
            }
            if prior.mirrored_image_ref.is_some() {
                self.assets.remove(&[object_name(event.id)]).await?;
            }
        }

        let Some(source) = event.source_image_url.as_deref() else {
            return Ok(None);
        };

        let (bytes, content_type) = self.images.download(source).await?;
        let name = object_name(event.id);
        self.assets.upload(&name, bytes, &content_type).await?;
        Ok(Some(self.assets.public_url(&name)))
    }
}
