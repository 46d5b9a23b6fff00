use crate::algorithms::containment::PointFilter;
use crate::cache::SelectionCache;
use crate::dataset::PointDataset;
use crate::model::PolygonId;
use crate::store::PolygonStore;

/// Union of the containment sets of all enabled polygons, deduplicated and
/// in ascending order.
///
/// Stale cache entries of enabled polygons are refreshed first; disabled
/// polygons are skipped even when they still have an entry.
pub fn aggregate<F: PointFilter>(
    store: &PolygonStore,
    cache: &mut SelectionCache<F>,
    dataset: &PointDataset<'_>,
) -> Vec<u32> {
    #[cfg(feature = "threads")]
    let committed = refresh_parallel(store, cache, dataset);
    #[cfg(not(feature = "threads"))]
    let committed: Vec<PolygonId> = Vec::new();

    // entries committed just above (ascending ids) must not count as hits
    for polygon in store.enabled().filter(|p| committed.binary_search(&p.id).is_err()) {
        cache.ensure_fresh_polygon(polygon, dataset);
    }
    let sets: Vec<&[u32]> = store
        .enabled()
        .filter_map(|p| cache.entry(p.id))
        .map(|e| e.indices.as_slice())
        .collect();
    union_sorted(&sets)
}

/// Merge ascending index sets into one ascending set without duplicates.
pub fn union_sorted(sets: &[&[u32]]) -> Vec<u32> {
    match sets {
        [] => Vec::new(),
        [only] => only.to_vec(),
        _ => {
            let total = sets.iter().map(|s| s.len()).sum();
            let mut out = Vec::with_capacity(total);
            for s in sets {
                out.extend_from_slice(s);
            }
            out.sort_unstable();
            out.dedup();
            out
        }
    }
}

// Several polygons went stale at once (first aggregation, dataset swap): scan
// them side by side and commit afterwards.
#[cfg(feature = "threads")]
fn refresh_parallel<F: PointFilter>(
    store: &PolygonStore,
    cache: &mut SelectionCache<F>,
    dataset: &PointDataset<'_>,
) -> Vec<PolygonId> {
    use crate::cache::{CommitOutcome, PendingEntry};
    use rayon::prelude::*;

    let stale = cache.stale_enabled(store);
    if stale.len() < 2 {
        return Vec::new();
    }
    let filter = cache.filter();
    let pending: Vec<PendingEntry> = stale
        .par_iter()
        .map(|p| PendingEntry::compute(p, dataset, filter))
        .collect();
    let mut committed = Vec::with_capacity(pending.len());
    for entry in pending {
        let id = entry.id;
        if cache.commit(store, entry) == CommitOutcome::Committed {
            committed.push(id);
        }
    }
    committed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_of_nothing_is_empty() {
        assert!(union_sorted(&[]).is_empty());
    }

    #[test]
    fn union_dedups_overlap() {
        let a = [0u32, 2, 5, 9];
        let b = [2u32, 3, 9, 11];
        assert_eq!(union_sorted(&[&a[..], &b[..]]), vec![0, 2, 3, 5, 9, 11]);
    }

    #[test]
    fn union_single_set_is_copied() {
        let a = [4u32, 7];
        assert_eq!(union_sorted(&[&a[..]]), vec![4, 7]);
    }
}
