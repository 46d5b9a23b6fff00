use polysel::{model::ring_from_pairs, PointCloud, SelectError, SelectionEngine, Vertex};
use std::time::Instant;

// Deterministic scatter over [0, 1000) x [0, 1000), with a sprinkling of NaNs.
fn build_cloud(points: usize) -> Result<PointCloud, SelectError> {
    let mut seed: u64 = 0x9E37_79B9_7F4A_7C15;
    let mut rnd = || {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((seed >> 40) as f32) / ((1u64 << 24) as f32)
    };
    let mut xs = Vec::with_capacity(points);
    let mut ys = Vec::with_capacity(points);
    for i in 0..points {
        if i % 997 == 0 { xs.push(f32::NAN); } else { xs.push(rnd() * 1000.0); }
        ys.push(rnd() * 1000.0);
    }
    PointCloud::new(xs, ys)
}

fn fail(what: &str, err: SelectError) -> ! {
    eprintln!("FAIL: {}: {}", what, err);
    std::process::exit(1);
}

fn star(cx: f32, cy: f32, r: f32, spikes: usize) -> Vec<Vertex> {
    let mut pairs = Vec::with_capacity(spikes * 2);
    for k in 0..spikes * 2 {
        let a = k as f32 * std::f32::consts::PI / spikes as f32;
        let rr = if k % 2 == 0 { r } else { r * 0.45 };
        pairs.push((cx + rr * a.cos(), cy + rr * a.sin()));
    }
    ring_from_pairs(&pairs)
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() { return 0.0; }
    let idx = ((sorted.len() as f64 - 1.0) * p).round() as usize;
    sorted[idx.min(sorted.len()-1)]
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let mut points = 1_000_000usize;
    let mut polygons = 12usize;
    let mut edits = 200usize;
    let mut vertices = 64usize;
    let mut assert_ms: Option<f64> = None;
    for a in &args[1..] {
        if let Some(val)=a.strip_prefix("--points=") { if let Ok(v)=val.parse() { points=v; } }
        else if let Some(val)=a.strip_prefix("--polygons=") { if let Ok(v)=val.parse() { polygons=v; } }
        else if let Some(val)=a.strip_prefix("--edits=") { if let Ok(v)=val.parse() { edits=v; } }
        else if let Some(val)=a.strip_prefix("--vertices=") { if let Ok(v)=val.parse() { vertices=v; } }
        else if let Some(val)=a.strip_prefix("--assert-ms=") { if let Ok(v)=val.parse() { assert_ms=Some(v); } }
    }
    let polygons = polygons.max(1);
    let spikes = (vertices / 2).max(2);

    let cloud = build_cloud(points).unwrap_or_else(|e| fail("build cloud", e));
    let ds = cloud.view();
    let mut engine = SelectionEngine::new();
    let mut ids = Vec::with_capacity(polygons);
    for k in 0..polygons {
        let c = 80.0 + (k % 6) as f32 * 150.0;
        match engine.create(star(c, 200.0 + (k / 6) as f32 * 300.0, 120.0, spikes)) {
            Ok(id) => ids.push(id),
            Err(e) => fail("create polygon", e),
        }
    }
    // Warm-up: first aggregation scans every polygon
    let t0 = Instant::now();
    let initial = engine.selection(&ds).len();
    let warm_ms = t0.elapsed().as_secs_f64() * 1000.0;

    // Each edit nudges one polygon; only that polygon is rescanned
    let mut times_ms: Vec<f64> = Vec::with_capacity(edits);
    let start_all = Instant::now();
    let mut selected = 0usize;
    for e in 0..edits {
        let k = e % polygons;
        let c = 80.0 + (k % 6) as f32 * 150.0 + (e % 7) as f32;
        let t = Instant::now();
        if let Err(e) = engine.update(ids[k], star(c, 200.0 + (k / 6) as f32 * 300.0, 120.0, spikes)) {
            fail("update polygon", e);
        }
        selected = engine.selection(&ds).len();
        times_ms.push(t.elapsed().as_secs_f64() * 1000.0);
    }
    let dur_all = start_all.elapsed().as_secs_f64() * 1000.0;
    times_ms.sort_by(|a,b| a.total_cmp(b));
    let med = percentile(&times_ms, 0.5);
    let p90 = percentile(&times_ms, 0.9);
    let p99 = percentile(&times_ms, 0.99);
    let stats = engine.cache_stats();
    println!("points={} polygons={} vertices={} edits={} initial={} selected={} warm_ms={:.3} total_ms={:.3} median_ms={:.4} p90_ms={:.4} p99_ms={:.4} rescans={} hits={}",
        points, polygons, spikes*2, edits, initial, selected, warm_ms, dur_all, med, p90, p99, stats.recomputes, stats.hits);
    if let Some(th) = assert_ms { if med > th { eprintln!("FAIL: median {:.4} ms > threshold {:.3} ms", med, th); std::process::exit(1); } }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cloud_has_requested_points() {
        let cloud = build_cloud(2000).unwrap();
        assert_eq!(cloud.len(), 2000);
        let ds = cloud.view();
        assert!(ds.xs()[0].is_nan());
        assert!(ds.xs()[1].is_finite());
    }

    #[test]
    fn star_edits_rescan_without_error() {
        let cloud = build_cloud(500).unwrap();
        let mut engine = SelectionEngine::new();
        let id = engine.create(star(500.0, 500.0, 120.0, 8)).unwrap();
        assert!(!engine.selection(&cloud.view()).is_empty());
        engine.update(id, star(505.0, 500.0, 120.0, 8)).unwrap();
        engine.selection(&cloud.view());
        assert_eq!(engine.cache_stats().recomputes, 2);
    }
}
