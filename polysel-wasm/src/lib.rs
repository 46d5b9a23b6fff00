use polysel::{PointCloud, SelectionEngine};
use wasm_bindgen::prelude::*;
mod api;
mod error;
mod interop;

pub use api::{filter_points, filter_points_res, set_panic_hook};

/// Point selection over one dataset, driven by polygon edits from the host.
#[wasm_bindgen]
pub struct Selector {
    pub(crate) inner: SelectionEngine,
    pub(crate) points: PointCloud,
}

impl Selector {
    pub fn rs_new(points: PointCloud, inner: SelectionEngine) -> Selector {
        Selector { inner, points }
    }
    pub fn rs_state_version(&self) -> u64 {
        self.inner.state_version()
    }
}
