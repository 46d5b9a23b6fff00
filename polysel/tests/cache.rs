use polysel::model::ring_from_pairs;
use polysel::{
    CommitOutcome, EvenOdd, PendingEntry, PointDataset, PointFilter, PolygonId, PolygonStore,
    SelectError, SelectionCache, Vertex,
};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Wraps the real filter and counts how many scans it runs.
#[derive(Default)]
struct CountingFilter {
    inner: EvenOdd,
    scans: AtomicUsize,
}

impl CountingFilter {
    fn scans(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }
}

impl PointFilter for CountingFilter {
    fn filter(&self, ring: &[Vertex], dataset: &PointDataset<'_>) -> Vec<u32> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        self.inner.filter(ring, dataset)
    }
}

fn square(x0: f32, y0: f32, size: f32) -> Vec<Vertex> {
    ring_from_pairs(&[(x0, y0), (x0 + size, y0), (x0 + size, y0 + size), (x0, y0 + size)])
}

const XS: [f32; 5] = [0.5, 2.5, 0.2, 5.0, 2.2];
const YS: [f32; 5] = [0.5, 2.5, 0.8, 5.0, 2.9];

fn dataset() -> PointDataset<'static> {
    PointDataset::new(&XS, &YS).unwrap()
}

#[test]
fn second_ensure_fresh_does_not_rescan() {
    let ds = dataset();
    let mut store = PolygonStore::new();
    let id = store.create(square(0.0, 0.0, 1.0)).unwrap();
    let mut cache = SelectionCache::with_filter(CountingFilter::default());

    let first = cache.ensure_fresh(&store, id, &ds).unwrap().to_vec();
    let second = cache.ensure_fresh(&store, id, &ds).unwrap().to_vec();
    assert_eq!(first, vec![0, 2]);
    assert_eq!(first, second);
    assert_eq!(cache.filter().scans(), 1, "second call must hit the cache");
    assert_eq!(cache.stats().hits, 1);
    assert_eq!(cache.stats().recomputes, 1);
}

#[test]
fn update_forces_rescan_with_new_ring() {
    let ds = dataset();
    let mut store = PolygonStore::new();
    let id = store.create(square(0.0, 0.0, 1.0)).unwrap();
    let mut cache = SelectionCache::with_filter(CountingFilter::default());
    assert_eq!(cache.ensure_fresh(&store, id, &ds).unwrap(), &[0, 2]);

    store.update(id, square(2.0, 2.0, 1.0)).unwrap();
    assert_eq!(cache.ensure_fresh(&store, id, &ds).unwrap(), &[1, 4]);
    assert_eq!(cache.entry(id).unwrap().version, 1);
    assert_eq!(cache.filter().scans(), 2);
}

#[test]
fn editing_one_polygon_leaves_others_cached() {
    let ds = dataset();
    let mut store = PolygonStore::new();
    let a = store.create(square(0.0, 0.0, 1.0)).unwrap();
    let b = store.create(square(2.0, 2.0, 1.0)).unwrap();
    let mut cache = SelectionCache::with_filter(CountingFilter::default());
    cache.ensure_fresh(&store, a, &ds).unwrap();
    cache.ensure_fresh(&store, b, &ds).unwrap();
    assert_eq!(cache.filter().scans(), 2);

    store.update(a, square(0.0, 0.0, 6.0)).unwrap();
    cache.ensure_fresh(&store, a, &ds).unwrap();
    cache.ensure_fresh(&store, b, &ds).unwrap();
    assert_eq!(cache.filter().scans(), 3, "only the edited polygon is rescanned");
}

#[test]
fn visibility_does_not_invalidate() {
    let ds = dataset();
    let mut store = PolygonStore::new();
    let id = store.create(square(0.0, 0.0, 1.0)).unwrap();
    let mut cache = SelectionCache::with_filter(CountingFilter::default());
    cache.ensure_fresh(&store, id, &ds).unwrap();
    store.set_enabled(id, false).unwrap();
    store.set_enabled(id, true).unwrap();
    cache.ensure_fresh(&store, id, &ds).unwrap();
    assert_eq!(cache.filter().scans(), 1);
}

#[test]
fn invalidate_and_evict() {
    let ds = dataset();
    let mut store = PolygonStore::new();
    let id = store.create(square(0.0, 0.0, 1.0)).unwrap();
    let mut cache = SelectionCache::with_filter(CountingFilter::default());
    cache.ensure_fresh(&store, id, &ds).unwrap();

    cache.invalidate(id);
    assert!(cache.entry(id).is_none());
    cache.ensure_fresh(&store, id, &ds).unwrap();
    assert_eq!(cache.filter().scans(), 2);

    assert!(cache.evict(id));
    assert!(!cache.evict(id));
    assert!(cache.is_empty());
}

#[test]
fn unknown_id_is_not_found() {
    let ds = dataset();
    let mut store = PolygonStore::new();
    let id = store.create(square(0.0, 0.0, 1.0)).unwrap();
    store.delete(id).unwrap();
    let mut cache = SelectionCache::new();
    assert_eq!(cache.ensure_fresh(&store, id, &ds).unwrap_err(), SelectError::NotFound(id));
    assert_eq!(
        cache.ensure_fresh(&store, PolygonId(999), &ds).unwrap_err(),
        SelectError::NotFound(PolygonId(999))
    );
}

#[test]
fn degenerate_polygon_caches_empty_set() {
    let ds = dataset();
    let mut store = PolygonStore::new();
    let id = store.create(ring_from_pairs(&[(0.0, 0.0), (9.0, 9.0)])).unwrap();
    let mut cache = SelectionCache::new();
    assert!(cache.ensure_fresh(&store, id, &ds).unwrap().is_empty());
    assert_eq!(cache.entry(id).unwrap().version, 0);
}

#[test]
fn detached_commit_checks_version() {
    let ds = dataset();
    let mut store = PolygonStore::new();
    let id = store.create(square(0.0, 0.0, 1.0)).unwrap();
    let mut cache = SelectionCache::new();

    let pending = PendingEntry::compute(store.get(id).unwrap(), &ds, cache.filter());
    assert_eq!(cache.commit(&store, pending), CommitOutcome::Committed);
    assert!(cache.is_fresh(store.get(id).unwrap()));

    // the polygon moves on while a scan of the old version is in flight
    let in_flight = PendingEntry::compute(store.get(id).unwrap(), &ds, cache.filter());
    store.update(id, square(2.0, 2.0, 1.0)).unwrap();
    assert_eq!(cache.commit(&store, in_flight), CommitOutcome::Stale);
    assert_eq!(cache.stats().discarded, 1);
    assert_eq!(cache.ensure_fresh(&store, id, &ds).unwrap(), &[1, 4]);

    // and a scan of a deleted polygon is dropped as well
    let orphan = PendingEntry::compute(store.get(id).unwrap(), &ds, cache.filter());
    store.delete(id).unwrap();
    assert_eq!(cache.commit(&store, orphan), CommitOutcome::Stale);
}
