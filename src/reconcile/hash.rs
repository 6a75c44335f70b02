//! Content hashing and cache key generations.
//!
//! Change detection hashes a minimal signature of the change-relevant
//! fields. Stored hashes live under versioned cache keys: the key-naming
//! scheme has evolved once, so a legacy generation is still read (a match
//! against any generation counts as unchanged) while writes always go to
//! the current generation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::models::SyncEvent;

/// Key suffixes per generation, current generation first.
const GENERATION_SUFFIXES: &[&str] = &["_v2", ""];

/// Minimal signature over the fields that count as a change.
///
/// Field order is the serialization order, so it is part of the hash
/// format. Do not reorder.
#[derive(Serialize)]
struct EventSignature<'a> {
    id: i64,
    name: &'a str,
    starts_on: &'a DateTime<Utc>,
    slug: &'a str,
}

/// Compute the hex SHA-256 content hash for an event.
pub fn signature_hash(event: &SyncEvent) -> String {
    let signature = EventSignature {
        id: event.id,
        name: &event.name,
        starts_on: &event.starts_on,
        slug: &event.slug,
    };
    let json = serde_json::to_vec(&signature).expect("signature serialization is infallible");
    hex::encode(Sha256::digest(&json))
}

/// The cache keys for one event id across all generations.
#[derive(Debug, Clone)]
pub struct CacheKeys {
    keys: Vec<String>,
}

impl CacheKeys {
    /// Build the generation keys for an event id, current first.
    pub fn new(prefix: &str, id: i64) -> Self {
        Self {
            keys: GENERATION_SUFFIXES
                .iter()
                .map(|suffix| format!("{prefix}{id}{suffix}"))
                .collect(),
        }
    }

    /// The current (write) generation key.
    pub fn current(&self) -> &str {
        &self.keys[0]
    }

    /// All generation keys, current first.
    pub fn all(&self) -> &[String] {
        &self.keys
    }
}
