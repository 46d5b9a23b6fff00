use serde::{Deserialize, Serialize};

/// Below this many points a scan always runs on the calling thread.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 64 * 1024;

/// Runtime knobs for a [`crate::SelectionEngine`].
///
/// Deserializes from a partial object; missing fields take their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Minimum dataset length before a scan is split across the rayon pool.
    /// Has no effect unless the `threads` feature is enabled.
    pub parallel_threshold: usize,
    /// Keep serving the last settled selection while the editor reports a drag.
    pub defer_while_dragging: bool,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        SelectorConfig {
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            defer_while_dragging: true,
        }
    }
}
