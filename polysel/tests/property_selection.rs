use polysel::{contains, PointCloud, PolygonId, SelectError, SelectionEngine, Vertex};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Debug)]
enum Op {
    Create { ring: Vec<(i8, i8)> },
    Update { idx: u16, ring: Vec<(i8, i8)> },
    Toggle { idx: u16 },
    Delete { idx: u16 },
    DeleteUnknown { raw: u32 },
    Read,
    Drag { begin: bool },
}

fn ring_strategy() -> impl Strategy<Value = Vec<(i8, i8)>> {
    prop::collection::vec((any::<i8>(), any::<i8>()), 0..8)
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        ring_strategy().prop_map(|ring| Op::Create { ring }),
        (any::<u16>(), ring_strategy()).prop_map(|(idx, ring)| Op::Update { idx, ring }),
        any::<u16>().prop_map(|idx| Op::Toggle { idx }),
        any::<u16>().prop_map(|idx| Op::Delete { idx }),
        (10_000u32..20_000).prop_map(|raw| Op::DeleteUnknown { raw }),
        Just(Op::Read),
        any::<bool>().prop_map(|begin| Op::Drag { begin }),
    ]
}

fn to_ring(ring: &[(i8, i8)]) -> Vec<Vertex> {
    ring.iter()
        .map(|&(x, y)| Vertex::new(x as f32 * 0.5, y as f32 * 0.5))
        .collect()
}

fn cloud() -> PointCloud {
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for j in -16..16 {
        for i in -16..16 {
            xs.push(i as f32 * 4.1 + 0.3);
            ys.push(j as f32 * 3.7 - 0.2);
        }
    }
    xs.push(f32::NAN);
    ys.push(0.0);
    PointCloud::new(xs, ys).unwrap()
}

/// Reference: union of a brute-force scan over every enabled ring.
fn brute_force(model: &BTreeMap<PolygonId, (Vec<Vertex>, bool)>, cloud: &PointCloud) -> Vec<u32> {
    let ds = cloud.view();
    let mut out = BTreeSet::new();
    for (ring, enabled) in model.values() {
        if !enabled {
            continue;
        }
        for i in 0..ds.len() {
            if contains(ring, ds.xs()[i], ds.ys()[i]) {
                out.insert(i as u32);
            }
        }
    }
    out.into_iter().collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn selection_matches_brute_force(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let cloud = cloud();
        let ds = cloud.view();
        let mut engine = SelectionEngine::new();
        let mut model: BTreeMap<PolygonId, (Vec<Vertex>, bool)> = BTreeMap::new();
        let mut issued: Vec<PolygonId> = Vec::new();

        for op in ops {
            match op {
                Op::Create { ring } => {
                    let ring = to_ring(&ring);
                    let id = engine.create(ring.clone()).unwrap();
                    prop_assert!(!issued.contains(&id), "id reused");
                    issued.push(id);
                    model.insert(id, (ring, true));
                }
                Op::Update { idx, ring } => {
                    if issued.is_empty() { continue; }
                    let id = issued[idx as usize % issued.len()];
                    let ring = to_ring(&ring);
                    let res = engine.update(id, ring.clone());
                    match model.get_mut(&id) {
                        Some(entry) => { prop_assert!(res.is_ok()); entry.0 = ring; }
                        None => { prop_assert_eq!(res.unwrap_err(), SelectError::NotFound(id)); }
                    }
                }
                Op::Toggle { idx } => {
                    if issued.is_empty() { continue; }
                    let id = issued[idx as usize % issued.len()];
                    match model.get_mut(&id) {
                        Some(entry) => { entry.1 = !entry.1; engine.set_enabled(id, entry.1).unwrap(); }
                        None => { prop_assert!(engine.set_enabled(id, true).is_err()); }
                    }
                }
                Op::Delete { idx } => {
                    if issued.is_empty() { continue; }
                    let id = issued[idx as usize % issued.len()];
                    let res = engine.delete(id);
                    prop_assert_eq!(res.is_ok(), model.remove(&id).is_some());
                }
                Op::DeleteUnknown { raw } => {
                    let id = PolygonId(raw);
                    prop_assert_eq!(engine.delete(id).unwrap_err(), SelectError::NotFound(id));
                }
                Op::Read => {
                    engine.end_drag();
                    let got = engine.selection(&ds).to_vec();
                    prop_assert_eq!(got, brute_force(&model, &cloud));
                }
                Op::Drag { begin } => {
                    if begin { engine.begin_drag(); } else { engine.end_drag(); }
                }
            }
        }

        engine.end_drag();
        let got = engine.selection(&ds).to_vec();
        prop_assert_eq!(got.clone(), brute_force(&model, &cloud));
        prop_assert!(got.windows(2).all(|w| w[0] < w[1]), "sorted and deduplicated");
        prop_assert_eq!(engine.aggregate(&ds), got);
        // cache entries never outlive their polygons
        prop_assert!(engine.cache().len() <= model.len());
    }
}
