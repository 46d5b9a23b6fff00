use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable polygon identity. Allocated once by the store and never reused,
/// so it stays valid across deletions of other polygons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolygonId(pub u32);

impl fmt::Display for PolygonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub x: f32,
    pub y: f32,
}

impl Vertex {
    pub const fn new(x: f32, y: f32) -> Self {
        Vertex { x, y }
    }
}

impl From<(f32, f32)> for Vertex {
    fn from((x, y): (f32, f32)) -> Self {
        Vertex { x, y }
    }
}

/// Build a ring from `(x, y)` pairs.
pub fn ring_from_pairs(pairs: &[(f32, f32)]) -> Vec<Vertex> {
    pairs.iter().copied().map(Vertex::from).collect()
}

/// Build a ring from a flat `[x0, y0, x1, y1, ...]` buffer. Returns `None` on odd length.
pub fn ring_from_flat(flat: &[f32]) -> Option<Vec<Vertex>> {
    if flat.len() % 2 != 0 {
        return None;
    }
    Some(flat.chunks_exact(2).map(|c| Vertex::new(c[0], c[1])).collect())
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    /// Closed ring; encloses points by the even-odd rule.
    #[default]
    Polygon,
    /// Open path drawn by the line tool; never encloses anything.
    LineString,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub id: PolygonId,
    pub kind: ShapeKind,
    pub ring: Vec<Vertex>,
    pub enabled: bool,
    pub version: u64,
}

impl Polygon {
    /// Fewer than three vertices, or an open line string.
    pub fn is_degenerate(&self) -> bool {
        self.kind == ShapeKind::LineString || self.ring.len() < 3
    }

    pub fn summary(&self) -> PolygonSummary {
        PolygonSummary {
            id: self.id,
            kind: self.kind,
            enabled: self.enabled,
            version: self.version,
            vertex_count: self.ring.len() as u32,
        }
    }
}

/// Snapshot row returned by `PolygonStore::list`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolygonSummary {
    pub id: PolygonId,
    pub kind: ShapeKind,
    pub enabled: bool,
    pub version: u64,
    pub vertex_count: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditKind {
    Created,
    Updated,
    Deleted,
    VisibilityChanged,
}

/// One edit emitted by the drawing collaborator.
///
/// `id` is ignored for `Created`. `ring` is required for `Updated` and optional
/// for `Created` (an empty in-progress shape). `enabled` is required for
/// `VisibilityChanged`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolygonEditEvent {
    pub kind: EditKind,
    #[serde(default)]
    pub id: Option<PolygonId>,
    #[serde(default)]
    pub ring: Option<Vec<Vertex>>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub shape: ShapeKind,
}

impl PolygonEditEvent {
    pub fn created(ring: Vec<Vertex>) -> Self {
        PolygonEditEvent {
            kind: EditKind::Created,
            id: None,
            ring: Some(ring),
            enabled: None,
            shape: ShapeKind::Polygon,
        }
    }

    pub fn updated(id: PolygonId, ring: Vec<Vertex>) -> Self {
        PolygonEditEvent {
            kind: EditKind::Updated,
            id: Some(id),
            ring: Some(ring),
            enabled: None,
            shape: ShapeKind::Polygon,
        }
    }

    pub fn deleted(id: PolygonId) -> Self {
        PolygonEditEvent {
            kind: EditKind::Deleted,
            id: Some(id),
            ring: None,
            enabled: None,
            shape: ShapeKind::Polygon,
        }
    }

    pub fn visibility(id: PolygonId, enabled: bool) -> Self {
        PolygonEditEvent {
            kind: EditKind::VisibilityChanged,
            id: Some(id),
            ring: None,
            enabled: Some(enabled),
            shape: ShapeKind::Polygon,
        }
    }
}

/// Pointer interaction lifecycle reported by the editor: idle -> dragging -> idle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interaction {
    #[default]
    Idle,
    Dragging,
}
