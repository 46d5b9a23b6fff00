// Ingestion caps enforced at the host boundary (wasm `_res` methods)

// Shapes
pub const MAX_RING_VERTICES: usize = 100_000;
pub const MAX_POLYGONS: usize = 10_000;

// Dataset
pub const MAX_POINTS: usize = 50_000_000;

// Numeric bounds for ring vertices
pub const COORD_MIN: f32 = -1.0e9;
pub const COORD_MAX: f32 = 1.0e9;

#[inline]
pub fn in_coord_bounds(x: f32) -> bool { x.is_finite() && x >= COORD_MIN && x <= COORD_MAX }

/// Index of the first component of a flat `[x, y, ...]` buffer that is out of bounds.
pub fn first_bad_coord(flat: &[f32]) -> Option<usize> {
    flat.iter().position(|&v| !in_coord_bounds(v))
}
