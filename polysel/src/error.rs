//! Error types for selection engine operations.
//!
//! Both kinds are caller errors: the offending call leaves the store and
//! cache untouched and nothing is retried internally. Degenerate geometry
//! (short rings, NaN coordinates) is never reported here; it simply selects
//! nothing.

use crate::model::PolygonId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectError {
    /// Malformed arguments, e.g. coordinate columns of different lengths.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// The referenced polygon id is unknown (never created, or deleted).
    #[error("polygon {0} not found")]
    NotFound(PolygonId),
}

impl SelectError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        SelectError::InvalidInput {
            reason: reason.into(),
        }
    }

    pub(crate) fn length_mismatch(what: &str, expected: usize, got: usize) -> Self {
        SelectError::invalid(format!("{what} has length {got}, expected {expected}"))
    }

    /// Short machine-readable code, shared with the wasm error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            SelectError::InvalidInput { .. } => "invalid_input",
            SelectError::NotFound(_) => "not_found",
        }
    }
}

pub type Result<T> = std::result::Result<T, SelectError>;
