//! Event data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An event as reported by the remote feed.
///
/// Immutable once fetched; unknown feed fields are ignored on
/// deserialization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateEvent {
    /// Natural key shared with the catalog
    pub id: i64,

    /// Event display name
    pub name: String,

    /// Event start instant
    pub starts_on: DateTime<Utc>,

    /// URL slug
    pub slug: String,

    /// Source banner image URL, if the feed provides one
    #[serde(default)]
    pub image_banner: Option<String>,

    /// Whether the event is published on the remote side
    #[serde(default)]
    pub is_published: bool,
}

/// The persisted, authoritative catalog record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogEvent {
    /// Natural key
    pub id: i64,

    /// Event display name
    pub name: String,

    /// Event start instant
    pub starts_on: DateTime<Utc>,

    /// URL slug
    pub slug: String,

    /// Public URL of the mirrored banner in the asset store
    #[serde(default)]
    pub mirrored_image_ref: Option<String>,

    /// Source banner URL the mirror was taken from
    #[serde(default)]
    pub original_image_url: Option<String>,
}

/// A merged working record for one reconciliation run.
///
/// Carries the change-relevant fields plus the source image URL the
/// mirroring step compares against the persisted record.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncEvent {
    pub id: i64,
    pub name: String,
    pub starts_on: DateTime<Utc>,
    pub slug: String,
    pub source_image_url: Option<String>,
    /// Mirror reference carried over from the catalog, if this record came
    /// from there; used when an expired event's mirror must be purged
    pub mirrored_image_ref: Option<String>,
}

impl From<CandidateEvent> for SyncEvent {
    fn from(event: CandidateEvent) -> Self {
        Self {
            id: event.id,
            name: event.name,
            starts_on: event.starts_on,
            slug: event.slug,
            source_image_url: event.image_banner,
            mirrored_image_ref: None,
        }
    }
}

impl From<CatalogEvent> for SyncEvent {
    /// A catalog-sourced event's source URL is its recorded original, so
    /// an unchanged image is never re-mirrored.
    fn from(event: CatalogEvent) -> Self {
        Self {
            id: event.id,
            name: event.name,
            starts_on: event.starts_on,
            slug: event.slug,
            source_image_url: event.original_image_url,
            mirrored_image_ref: event.mirrored_image_ref,
        }
    }
}
