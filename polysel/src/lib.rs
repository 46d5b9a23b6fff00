pub mod cache;
pub mod config;
pub mod dataset;
pub mod error;
pub mod model;
pub mod store;
pub mod geometry {
    pub mod bounds;
    pub mod limits;
}
pub mod algorithms {
    pub mod aggregate;
    pub mod containment;
}
#[cfg(not(target_arch = "wasm32"))]
pub mod worker;

pub use algorithms::containment::{contains, filter_points, EvenOdd, PointFilter};
pub use cache::{CacheEntry, CacheStats, CommitOutcome, PendingEntry, SelectionCache};
pub use config::SelectorConfig;
pub use dataset::{PointCloud, PointDataset};
pub use error::{Result, SelectError};
pub use model::{
    EditKind, Interaction, Polygon, PolygonEditEvent, PolygonId, PolygonSummary, ShapeKind, Vertex,
};
pub use store::PolygonStore;

use tracing::debug;

/// Polygon store, containment cache and the settled selection, kept in step.
///
/// Every mutation bumps `state_ver`; the selection is rebuilt lazily the next
/// time it is read, and only the polygons whose version moved are rescanned.
#[derive(Debug)]
pub struct SelectionEngine<F = EvenOdd> {
    pub(crate) store: PolygonStore,
    pub(crate) cache: SelectionCache<F>,
    pub(crate) config: SelectorConfig,
    pub(crate) interaction: Interaction,
    pub(crate) state_ver: u64,
    // (state_ver it was built at, indices)
    pub(crate) settled: Option<(u64, Vec<u32>)>,
}

impl SelectionEngine<EvenOdd> {
    pub fn new() -> Self {
        Self::with_config(SelectorConfig::default())
    }

    pub fn with_config(config: SelectorConfig) -> Self {
        let filter = EvenOdd {
            parallel_threshold: config.parallel_threshold,
        };
        Self::with_filter(filter, config)
    }
}

impl Default for SelectionEngine<EvenOdd> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: PointFilter> SelectionEngine<F> {
    pub fn with_filter(filter: F, config: SelectorConfig) -> Self {
        SelectionEngine {
            store: PolygonStore::new(),
            cache: SelectionCache::with_filter(filter),
            config,
            interaction: Interaction::Idle,
            state_ver: 1,
            settled: None,
        }
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    pub fn store(&self) -> &PolygonStore {
        &self.store
    }

    pub fn cache(&self) -> &SelectionCache<F> {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Monotonic counter of state changes that can affect the selection.
    pub fn state_version(&self) -> u64 {
        self.state_ver
    }

    fn touch(&mut self) {
        self.state_ver = self.state_ver.wrapping_add(1);
    }

    // Shapes

    pub fn create(&mut self, ring: Vec<Vertex>) -> Result<PolygonId> {
        self.create_shape(ShapeKind::Polygon, ring)
    }

    pub fn create_shape(&mut self, kind: ShapeKind, ring: Vec<Vertex>) -> Result<PolygonId> {
        let id = self.store.create_shape(kind, ring)?;
        self.touch();
        Ok(id)
    }

    pub fn update(&mut self, id: PolygonId, ring: Vec<Vertex>) -> Result<u64> {
        let version = self.store.update(id, ring)?;
        self.touch();
        Ok(version)
    }

    pub fn set_enabled(&mut self, id: PolygonId, enabled: bool) -> Result<()> {
        self.store.set_enabled(id, enabled)?;
        self.touch();
        Ok(())
    }

    /// Remove the polygon and its cache entry together.
    pub fn delete(&mut self, id: PolygonId) -> Result<()> {
        self.store.delete(id)?;
        self.cache.evict(id);
        self.touch();
        Ok(())
    }

    pub fn get(&self, id: PolygonId) -> Option<&Polygon> {
        self.store.get(id)
    }

    pub fn list(&self) -> Vec<PolygonSummary> {
        self.store.list()
    }

    pub fn polygon_count(&self) -> usize {
        self.store.len()
    }

    /// Apply one edit event. Returns the new id for `Created`.
    ///
    /// Events must be fed in delivery order; nothing is batched or reordered.
    pub fn apply(&mut self, event: PolygonEditEvent) -> Result<Option<PolygonId>> {
        let PolygonEditEvent {
            kind,
            id,
            ring,
            enabled,
            shape,
        } = event;
        let target = || id.ok_or_else(|| SelectError::invalid(format!("{kind:?} event without id")));
        match kind {
            EditKind::Created => self.create_shape(shape, ring.unwrap_or_default()).map(Some),
            EditKind::Updated => {
                let id = target()?;
                let ring = ring.ok_or_else(|| SelectError::invalid("Updated event without ring"))?;
                self.update(id, ring)?;
                Ok(None)
            }
            EditKind::Deleted => {
                self.delete(target()?)?;
                Ok(None)
            }
            EditKind::VisibilityChanged => {
                let id = target()?;
                let enabled = enabled
                    .ok_or_else(|| SelectError::invalid("VisibilityChanged event without enabled"))?;
                self.set_enabled(id, enabled)?;
                Ok(None)
            }
        }
    }

    // Cache

    pub fn ensure_fresh(&mut self, id: PolygonId, dataset: &PointDataset<'_>) -> Result<&[u32]> {
        self.cache.ensure_fresh(&self.store, id, dataset)
    }

    pub fn invalidate(&mut self, id: PolygonId) -> Result<()> {
        if !self.store.contains(id) {
            return Err(SelectError::NotFound(id));
        }
        self.cache.invalidate(id);
        self.touch();
        Ok(())
    }

    /// The dataset was swapped out-of-band; rescan everything on next read.
    pub fn invalidate_all(&mut self) {
        self.cache.invalidate_all();
        self.touch();
    }

    // Interaction hint

    pub fn interaction(&self) -> Interaction {
        self.interaction
    }

    pub fn begin_drag(&mut self) {
        self.interaction = Interaction::Dragging;
    }

    pub fn end_drag(&mut self) {
        self.interaction = Interaction::Idle;
    }

    // Aggregation

    /// Build the union now, independent of drag state and memoization.
    pub fn aggregate(&mut self, dataset: &PointDataset<'_>) -> Vec<u32> {
        algorithms::aggregate::aggregate(&self.store, &mut self.cache, dataset)
    }

    /// Whether the settled selection lags behind the latest edit.
    pub fn is_dirty(&self) -> bool {
        !matches!(&self.settled, Some((ver, _)) if *ver == self.state_ver)
    }

    /// The current selection, rebuilt if anything changed since the last call.
    ///
    /// While a drag is in progress (and deferral is enabled) the previous
    /// selection is returned as-is; it catches up on the first read after
    /// `end_drag`.
    pub fn selection(&mut self, dataset: &PointDataset<'_>) -> &[u32] {
        let deferred = self.interaction == Interaction::Dragging
            && self.config.defer_while_dragging
            && self.settled.is_some();
        if self.is_dirty() {
            if deferred {
                debug!(state = self.state_ver, "selection rebuild deferred while dragging");
            } else {
                let indices = self.aggregate(dataset);
                debug!(
                    state = self.state_ver,
                    polygons = self.store.len(),
                    selected = indices.len(),
                    "selection rebuilt"
                );
                self.settled = Some((self.state_ver, indices));
            }
        }
        self.settled.as_ref().map(|(_, s)| s.as_slice()).unwrap_or(&[])
    }

    /// Last settled selection without triggering a rebuild.
    pub fn settled_selection(&self) -> Option<&[u32]> {
        self.settled.as_ref().map(|(_, s)| s.as_slice())
    }
}
