//! Per-polygon containment cache.
//!
//! Each entry records the polygon version it was computed for. Freshness is
//! checked when an entry is read: a version mismatch (or a missing entry)
//! triggers a rescan of the dataset for that polygon only, so editing one
//! shape never rescans any other.

use crate::algorithms::containment::{EvenOdd, PointFilter};
use crate::dataset::PointDataset;
use crate::error::{Result, SelectError};
use crate::model::{Polygon, PolygonId, ShapeKind};
use crate::store::PolygonStore;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, trace, warn};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheEntry {
    pub version: u64,
    /// Ascending point indices inside the polygon at `version`.
    pub indices: Vec<u32>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub recomputes: u64,
    /// Detached results dropped because the polygon moved on before commit.
    pub discarded: u64,
}

/// Containment computed away from the cache, e.g. on a worker thread.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingEntry {
    pub id: PolygonId,
    pub version: u64,
    pub indices: Vec<u32>,
}

impl PendingEntry {
    pub fn compute<F: PointFilter + ?Sized>(
        polygon: &Polygon,
        dataset: &PointDataset<'_>,
        filter: &F,
    ) -> Self {
        PendingEntry {
            id: polygon.id,
            version: polygon.version,
            indices: scan(filter, polygon, dataset),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// The polygon was edited or deleted after the scan started.
    Stale,
}

fn scan<F: PointFilter + ?Sized>(filter: &F, polygon: &Polygon, dataset: &PointDataset<'_>) -> Vec<u32> {
    if polygon.kind == ShapeKind::LineString {
        return Vec::new();
    }
    filter.filter(&polygon.ring, dataset)
}

#[derive(Debug)]
pub struct SelectionCache<F = EvenOdd> {
    entries: HashMap<PolygonId, CacheEntry>,
    filter: F,
    stats: CacheStats,
}

impl SelectionCache<EvenOdd> {
    pub fn new() -> Self {
        Self::with_filter(EvenOdd::default())
    }
}

impl Default for SelectionCache<EvenOdd> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: PointFilter> SelectionCache<F> {
    pub fn with_filter(filter: F) -> Self {
        SelectionCache {
            entries: HashMap::new(),
            filter,
            stats: CacheStats::default(),
        }
    }

    pub fn filter(&self) -> &F {
        &self.filter
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn entry(&self, id: PolygonId) -> Option<&CacheEntry> {
        self.entries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the cached entry matches the polygon's current version.
    pub fn is_fresh(&self, polygon: &Polygon) -> bool {
        self.entries
            .get(&polygon.id)
            .is_some_and(|e| e.version == polygon.version)
    }

    /// Point indices currently inside polygon `id`, rescanning only if stale.
    pub fn ensure_fresh(
        &mut self,
        store: &PolygonStore,
        id: PolygonId,
        dataset: &PointDataset<'_>,
    ) -> Result<&[u32]> {
        let polygon = store.get(id).ok_or(SelectError::NotFound(id))?;
        Ok(self.ensure_fresh_polygon(polygon, dataset))
    }

    pub(crate) fn ensure_fresh_polygon(&mut self, polygon: &Polygon, dataset: &PointDataset<'_>) -> &[u32] {
        let id = polygon.id;
        if self.is_fresh(polygon) {
            self.stats.hits += 1;
            trace!(polygon = %id, version = polygon.version, "containment cache hit");
        } else {
            let indices = scan(&self.filter, polygon, dataset);
            debug!(
                polygon = %id,
                version = polygon.version,
                points = dataset.len(),
                hits = indices.len(),
                "rescanned polygon"
            );
            self.stats.recomputes += 1;
            self.entries.insert(
                id,
                CacheEntry {
                    version: polygon.version,
                    indices,
                },
            );
        }
        self.entries.get(&id).map(|e| e.indices.as_slice()).unwrap_or(&[])
    }

    /// Polygons that would be rescanned by the next aggregation.
    pub fn stale_enabled<'s>(&self, store: &'s PolygonStore) -> Vec<&'s Polygon> {
        store.enabled().filter(|p| !self.is_fresh(p)).collect()
    }

    /// Store a detached result if the polygon still has the version it was
    /// computed for; otherwise drop it.
    pub fn commit(&mut self, store: &PolygonStore, pending: PendingEntry) -> CommitOutcome {
        match store.get(pending.id) {
            Some(p) if p.version == pending.version => {
                self.stats.recomputes += 1;
                self.entries.insert(
                    pending.id,
                    CacheEntry {
                        version: pending.version,
                        indices: pending.indices,
                    },
                );
                CommitOutcome::Committed
            }
            current => {
                warn!(
                    polygon = %pending.id,
                    computed = pending.version,
                    current = current.map(|p| p.version),
                    "discarding stale containment result"
                );
                self.stats.discarded += 1;
                CommitOutcome::Stale
            }
        }
    }

    /// Force a rescan of `id` on its next read.
    pub fn invalidate(&mut self, id: PolygonId) {
        if self.entries.remove(&id).is_some() {
            debug!(polygon = %id, "invalidated containment entry");
        }
    }

    /// Force a rescan of every polygon, e.g. after the dataset was replaced.
    pub fn invalidate_all(&mut self) {
        debug!(entries = self.entries.len(), "invalidated all containment entries");
        self.entries.clear();
    }

    /// Drop the entry of a deleted polygon.
    pub fn evict(&mut self, id: PolygonId) -> bool {
        self.entries.remove(&id).is_some()
    }
}
