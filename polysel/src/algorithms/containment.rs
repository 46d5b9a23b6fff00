//! Point-in-polygon containment by the even-odd rule.
//!
//! A horizontal ray is cast from the test point towards +x and the ring edges
//! it crosses are counted; an odd count means inside. Rings are implicitly
//! closed (the last vertex joins the first) and rings with fewer than three
//! vertices contain nothing.
//!
//! Boundary points are classified by the rule as written, without special
//! casing: for an axis-aligned square the left and bottom edges are inside,
//! the right and top edges are outside.

use crate::dataset::PointDataset;
use crate::error::{Result, SelectError};
use crate::geometry::bounds::Bounds;
use crate::model::Vertex;
use tracing::warn;

/// A ring prepared for repeated containment queries: bounds are computed once
/// so the per-point path only reads the vertex slice.
#[derive(Clone, Copy, Debug)]
pub struct RingTest<'r> {
    ring: &'r [Vertex],
    bounds: Option<Bounds>,
}

impl<'r> RingTest<'r> {
    pub fn new(ring: &'r [Vertex]) -> Self {
        let bounds = if ring.len() < 3 { None } else { Bounds::of_ring(ring) };
        RingTest { ring, bounds }
    }

    /// True when no point can ever be inside.
    pub fn is_empty(&self) -> bool {
        self.bounds.is_none()
    }

    #[inline]
    pub fn contains(&self, x: f32, y: f32) -> bool {
        match self.bounds {
            // the bounds test also rejects NaN coordinates
            Some(b) if b.contains(x, y) => crossing_number(x, y, self.ring) % 2 == 1,
            _ => false,
        }
    }
}

/// Number of ring edges crossed by the ray from `(px, py)` towards +x.
///
/// Edge `(ring[i], ring[j])` counts when exactly one endpoint lies strictly
/// above `py` and the edge meets the ray's line to the right of `px`.
pub fn crossing_number(px: f32, py: f32, ring: &[Vertex]) -> u32 {
    let n = ring.len();
    if n < 3 {
        return 0;
    }

    let mut crossings = 0u32;
    let mut j = n - 1;
    for i in 0..n {
        let vi = ring[i];
        let vj = ring[j];
        if (vi.y > py) != (vj.y > py) && px < (vj.x - vi.x) * (py - vi.y) / (vj.y - vi.y) + vi.x {
            crossings += 1;
        }
        j = i;
    }
    crossings
}

/// Even-odd containment of a single point.
pub fn contains(ring: &[Vertex], x: f32, y: f32) -> bool {
    RingTest::new(ring).contains(x, y)
}

/// Ascending indices `i` with `contains(ring, xs[i], ys[i])`.
pub fn filter_points(ring: &[Vertex], xs: &[f32], ys: &[f32]) -> Result<Vec<u32>> {
    check_columns(xs, ys)?;
    let mut out = Vec::new();
    scan_into(&RingTest::new(ring), xs, ys, 0, &mut out);
    Ok(out)
}

/// Same result as [`filter_points`]; datasets of at least `parallel_threshold`
/// points are split across the rayon pool when the `threads` feature is on.
pub fn filter_points_with(
    ring: &[Vertex],
    xs: &[f32],
    ys: &[f32],
    parallel_threshold: usize,
) -> Result<Vec<u32>> {
    check_columns(xs, ys)?;
    let test = RingTest::new(ring);
    if test.is_empty() {
        return Ok(Vec::new());
    }
    #[cfg(feature = "threads")]
    {
        if xs.len() >= parallel_threshold.max(1) {
            return Ok(scan_parallel(&test, xs, ys));
        }
    }
    #[cfg(not(feature = "threads"))]
    let _ = parallel_threshold;

    let mut out = Vec::new();
    scan_into(&test, xs, ys, 0, &mut out);
    Ok(out)
}

fn check_columns(xs: &[f32], ys: &[f32]) -> Result<()> {
    if xs.len() != ys.len() {
        return Err(SelectError::length_mismatch("ys", xs.len(), ys.len()));
    }
    if xs.len() > u32::MAX as usize {
        return Err(SelectError::invalid("dataset exceeds u32 index range"));
    }
    Ok(())
}

fn scan_into(test: &RingTest<'_>, xs: &[f32], ys: &[f32], base: u32, out: &mut Vec<u32>) {
    if test.is_empty() {
        return;
    }
    for (i, (&x, &y)) in xs.iter().zip(ys).enumerate() {
        if test.contains(x, y) {
            out.push(base + i as u32);
        }
    }
}

#[cfg(feature = "threads")]
const PAR_CHUNK: usize = 16 * 1024;

#[cfg(feature = "threads")]
fn scan_parallel(test: &RingTest<'_>, xs: &[f32], ys: &[f32]) -> Vec<u32> {
    use rayon::prelude::*;

    // chunk results are concatenated in chunk order, keeping indices ascending
    let parts: Vec<Vec<u32>> = xs
        .par_chunks(PAR_CHUNK)
        .zip(ys.par_chunks(PAR_CHUNK))
        .enumerate()
        .map(|(c, (cx, cy))| {
            let mut part = Vec::new();
            scan_into(test, cx, cy, (c * PAR_CHUNK) as u32, &mut part);
            part
        })
        .collect();
    let total = parts.iter().map(Vec::len).sum();
    let mut out = Vec::with_capacity(total);
    for part in parts {
        out.extend_from_slice(&part);
    }
    out
}

/// Batch containment as used by the selection cache.
///
/// This is the seam where the cache runs its O(n·v) scans; wrap it to observe
/// or replace the scan.
pub trait PointFilter: Send + Sync {
    fn filter(&self, ring: &[Vertex], dataset: &PointDataset<'_>) -> Vec<u32>;
}

/// The production filter: even-odd rule with bounding-box prefilter.
#[derive(Clone, Copy, Debug)]
pub struct EvenOdd {
    pub parallel_threshold: usize,
}

impl Default for EvenOdd {
    fn default() -> Self {
        EvenOdd {
            parallel_threshold: crate::config::DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl PointFilter for EvenOdd {
    fn filter(&self, ring: &[Vertex], dataset: &PointDataset<'_>) -> Vec<u32> {
        // PointDataset and PointCloud check their column lengths on
        // construction, so this only fails for datasets past the u32 range
        match filter_points_with(ring, dataset.xs(), dataset.ys(), self.parallel_threshold) {
            Ok(indices) => indices,
            Err(e) => {
                warn!(error = %e, points = dataset.len(), "containment scan rejected dataset");
                debug_assert!(false, "containment scan rejected dataset: {e}");
                Vec::new()
            }
        }
    }
}

impl<F: PointFilter + ?Sized> PointFilter for &F {
    fn filter(&self, ring: &[Vertex], dataset: &PointDataset<'_>) -> Vec<u32> {
        (**self).filter(ring, dataset)
    }
}

impl<F: PointFilter + ?Sized> PointFilter for Box<F> {
    fn filter(&self, ring: &[Vertex], dataset: &PointDataset<'_>) -> Vec<u32> {
        (**self).filter(ring, dataset)
    }
}
