// src/reconcile/mod.rs

//! Reconciliation core: merge, purge, and update-or-skip decisions.

mod hash;
mod merge;
mod reconciler;

pub use hash::{CacheKeys, signature_hash};
pub use merge::{merge_events, orphan_ids};
pub use reconciler::{Reconciler, RunStats, SyncOptions};
