use manos_inline::InlineError;
use thiserror::Error;

use crate::block::BlockId;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BlockError {
    #[error("block not found: {0}")]
    NotFound(BlockId),

    /// The block exists but has no mounted inline editor.
    #[error("no inline editor mounted for block {0}")]
    InlineEditorNotFound(BlockId),

    #[error("block already exists: {0}")]
    DuplicateId(BlockId),

    #[error("path [{order}] out of range for {len} blocks")]
    InvalidPath { order: usize, len: usize },

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error(transparent)]
    Inline(#[from] InlineError),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl BlockError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        BlockError::InvalidOperation(message.into())
    }
}

impl From<serde_json::Error> for BlockError {
    fn from(value: serde_json::Error) -> Self {
        BlockError::Serialization(value.to_string())
    }
}
