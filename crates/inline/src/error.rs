use thiserror::Error;

use crate::ops::Path;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InlineError {
    #[error("invalid inline path {path:?}: {reason}")]
    InvalidPath { path: Path, reason: String },

    #[error("index {index} out of bounds for length {len} at {path:?}")]
    OutOfBounds { path: Path, index: usize, len: usize },

    /// A removal carried data that differs from what the tree holds.
    #[error("operation does not match tree at {path:?}: {reason}")]
    Mismatch { path: Path, reason: String },
}

impl InlineError {
    pub(crate) fn invalid_path(path: &[usize], reason: impl Into<String>) -> Self {
        InlineError::InvalidPath {
            path: path.to_vec(),
            reason: reason.into(),
        }
    }

    pub(crate) fn out_of_bounds(path: &[usize], index: usize, len: usize) -> Self {
        InlineError::OutOfBounds {
            path: path.to_vec(),
            index,
            len,
        }
    }

    pub(crate) fn mismatch(path: &[usize], reason: impl Into<String>) -> Self {
        InlineError::Mismatch {
            path: path.to_vec(),
            reason: reason.into(),
        }
    }
}
