use crate::error::{Result, SelectError};
use serde::{Deserialize, Serialize};

/// Borrowed, read-only view over the point columns.
///
/// The engine never mutates or copies the columns; the same view may be shared
/// by any number of concurrent scans.
#[derive(Clone, Copy, Debug)]
pub struct PointDataset<'a> {
    x: &'a [f32],
    y: &'a [f32],
    size: Option<&'a [f32]>,
}

impl<'a> PointDataset<'a> {
    pub fn new(x: &'a [f32], y: &'a [f32]) -> Result<Self> {
        if x.len() != y.len() {
            return Err(SelectError::length_mismatch("y", x.len(), y.len()));
        }
        Ok(PointDataset { x, y, size: None })
    }

    /// Attach the per-point size column. It is carried for rendering only.
    pub fn with_size(self, size: &'a [f32]) -> Result<Self> {
        if size.len() != self.x.len() {
            return Err(SelectError::length_mismatch("size", self.x.len(), size.len()));
        }
        Ok(PointDataset {
            size: Some(size),
            ..self
        })
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn xs(&self) -> &'a [f32] {
        self.x
    }

    pub fn ys(&self) -> &'a [f32] {
        self.y
    }

    pub fn sizes(&self) -> Option<&'a [f32]> {
        self.size
    }

    pub fn point(&self, index: u32) -> Option<(f32, f32)> {
        let i = index as usize;
        Some((*self.x.get(i)?, *self.y.get(i)?))
    }
}

/// Owned point columns, for hosts that must keep the data alive themselves
/// (the wasm binding, the background worker).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(try_from = "RawPointCloud")]
pub struct PointCloud {
    x: Vec<f32>,
    y: Vec<f32>,
    size: Option<Vec<f32>>,
}

impl PointCloud {
    pub fn new(x: Vec<f32>, y: Vec<f32>) -> Result<Self> {
        if x.len() != y.len() {
            return Err(SelectError::length_mismatch("y", x.len(), y.len()));
        }
        Ok(PointCloud { x, y, size: None })
    }

    pub fn with_size(mut self, size: Vec<f32>) -> Result<Self> {
        if size.len() != self.x.len() {
            return Err(SelectError::length_mismatch("size", self.x.len(), size.len()));
        }
        self.size = Some(size);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn view(&self) -> PointDataset<'_> {
        PointDataset {
            x: &self.x,
            y: &self.y,
            size: self.size.as_deref(),
        }
    }
}

// Deserialized columns, checked by the same constructors as hand-built clouds.
#[derive(Deserialize)]
struct RawPointCloud {
    x: Vec<f32>,
    y: Vec<f32>,
    #[serde(default)]
    size: Option<Vec<f32>>,
}

impl TryFrom<RawPointCloud> for PointCloud {
    type Error = SelectError;

    fn try_from(raw: RawPointCloud) -> Result<Self> {
        let cloud = PointCloud::new(raw.x, raw.y)?;
        match raw.size {
            Some(size) => cloud.with_size(size),
            None => Ok(cloud),
        }
    }
}
