//! Merge phase: orphan detection and working-set construction.
//!
//! Pure set arithmetic over the two event sets. Orphans are computed up
//! front and the post-deletion working set derived by subtraction, so no
//! collection is ever mutated while concurrent deletions run.

use std::collections::{HashMap, HashSet};

use crate::models::{CandidateEvent, CatalogEvent, SyncEvent};

/// Ids of catalog events with no matching candidate id.
pub fn orphan_ids(catalog: &[CatalogEvent], candidates: &[CandidateEvent]) -> HashSet<i64> {
    let candidate_ids: HashSet<i64> = candidates.iter().map(|e| e.id).collect();
    catalog
        .iter()
        .map(|e| e.id)
        .filter(|id| !candidate_ids.contains(id))
        .collect()
}

/// Build the authoritative working set for per-event processing.
///
/// Seeded with the surviving catalog events (catalog wins for a shared id),
/// then extended with candidate-only ids, which are brand-new events.
pub fn merge_events(
    catalog: &[CatalogEvent],
    candidates: &[CandidateEvent],
    orphans: &HashSet<i64>,
) -> Vec<SyncEvent> {
    let mut merged: HashMap<i64, SyncEvent> = catalog
        .iter()
        .filter(|e| !orphans.contains(&e.id))
        .map(|e| (e.id, SyncEvent::from(e.clone())))
        .collect();

    for candidate in candidates {
        merged
            .entry(candidate.id)
            .or_insert_with(|| SyncEvent::from(candidate.clone()));
    }

    merged.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn candidate(id: i64, name: &str) -> CandidateEvent {
        CandidateEvent {
            id,
            name: name.to_string(),
            starts_on: Utc::now(),
            slug: format!("slug-{id}"),
            image_banner: None,
            is_published: true,
        }
    }

    fn record(id: i64, name: &str) -> CatalogEvent {
        CatalogEvent {
            id,
            name: name.to_string(),
            starts_on: Utc::now(),
            slug: format!("slug-{id}"),
            mirrored_image_ref: None,
            original_image_url: None,
        }
    }

    #[test]
    fn test_orphans_absent_from_candidates() {
        let catalog = vec![record(1, "kept"), record(2, "orphaned")];
        let candidates = vec![candidate(1, "kept"), candidate(3, "new")];

        let orphans = orphan_ids(&catalog, &candidates);
        assert_eq!(orphans, HashSet::from([2]));
    }

    #[test]
    fn test_no_orphans_when_catalog_empty() {
        let candidates = vec![candidate(1, "new")];
        assert!(orphan_ids(&[], &candidates).is_empty());
    }

    #[test]
    fn test_everything_orphaned_on_empty_feed() {
        let catalog = vec![record(1, "a"), record(2, "b")];
        assert_eq!(orphan_ids(&catalog, &[]), HashSet::from([1, 2]));
    }

    #[test]
    fn test_merge_catalog_wins_for_shared_id() {
        let catalog = vec![record(1, "catalog name")];
        let candidates = vec![candidate(1, "remote name"), candidate(2, "brand new")];

        let merged = merge_events(&catalog, &candidates, &HashSet::new());
        assert_eq!(merged.len(), 2);

        let shared = merged.iter().find(|e| e.id == 1).unwrap();
        assert_eq!(shared.name, "catalog name");

        let fresh = merged.iter().find(|e| e.id == 2).unwrap();
        assert_eq!(fresh.name, "brand new");
    }

    #[test]
    fn test_merge_excludes_orphans() {
        let catalog = vec![record(1, "kept"), record(2, "orphaned")];
        let candidates = vec![candidate(1, "kept")];
        let orphans = HashSet::from([2]);

        let merged = merge_events(&catalog, &candidates, &orphans);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].id, 1);
    }

    #[test]
    fn test_merge_of_disjoint_sets() {
        let catalog = vec![record(1, "old")];
        let candidates = vec![candidate(2, "new")];

        let mut ids: Vec<i64> = merge_events(&catalog, &candidates, &HashSet::new())
            .iter()
            .map(|e| e.id)
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2]);
    }
}
