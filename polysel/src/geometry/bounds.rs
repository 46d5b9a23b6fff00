use crate::model::Vertex;

/// Axis-aligned bounds of a ring, used to reject points before the edge walk.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    /// `None` for an empty ring or one whose vertices are all NaN.
    pub fn of_ring(ring: &[Vertex]) -> Option<Bounds> {
        let mut b = Bounds {
            min_x: f32::INFINITY,
            min_y: f32::INFINITY,
            max_x: f32::NEG_INFINITY,
            max_y: f32::NEG_INFINITY,
        };
        // f32::min/max skip a NaN operand
        for v in ring {
            b.min_x = b.min_x.min(v.x);
            b.max_x = b.max_x.max(v.x);
            b.min_y = b.min_y.min(v.y);
            b.max_y = b.max_y.max(v.y);
        }
        if b.min_x > b.max_x || b.min_y > b.max_y {
            return None;
        }
        Some(b)
    }

    /// Closed-interval test. NaN coordinates are never inside.
    #[inline]
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}
