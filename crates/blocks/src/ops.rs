use manos_inline::{InlineOp, Point, Selection};
use serde::{Deserialize, Serialize};

use crate::block::{Block, BlockId, BlockMeta, BlockPatch, BlockPath, double_option};

/// One structural or inline edit of the document.
///
/// Ops are resolved against live state when applied: removals capture the
/// removed block, updates capture the previous properties, merges capture
/// the boundary. A resolved op can be inverted without reading any state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    InsertBlock {
        path: BlockPath,
        block: Block,
    },
    DeleteBlock {
        path: BlockPath,
        block: Block,
    },
    UpdateBlock {
        id: BlockId,
        properties: BlockPatch,
        #[serde(default)]
        prev_properties: BlockPatch,
    },
    MoveBlock {
        id: BlockId,
        from: BlockPath,
        to: BlockPath,
    },
    /// Cuts block `id` at `at`. The head stays in `id` with `meta_after`
    /// applied; `block` is inserted right after it. Its content is kept when
    /// it holds the same leaves as the live tail and replaced by the live
    /// tail otherwise.
    SplitBlock {
        id: BlockId,
        at: Point,
        meta_before: BlockMeta,
        meta_after: BlockMeta,
        block: Block,
    },
    /// Appends `source` to `target` and removes `source`. `source` must
    /// directly follow `target`; `meta_after` becomes the target's meta.
    MergeBlock {
        target: BlockId,
        source: Block,
        boundary: Point,
        meta_before: BlockMeta,
        meta_after: BlockMeta,
    },
    SetInline {
        id: BlockId,
        ops: Vec<InlineOp>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        selection_before: Option<Selection>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        selection_after: Option<Selection>,
    },
}

impl Operation {
    pub fn insert_block(path: BlockPath, block: Block) -> Self {
        Operation::InsertBlock { path, block }
    }

    pub fn delete_block(block: Block) -> Self {
        Operation::DeleteBlock {
            path: block.path(),
            block,
        }
    }

    pub fn update_block(id: BlockId, properties: BlockPatch) -> Self {
        Operation::UpdateBlock {
            id,
            properties,
            prev_properties: BlockPatch::default(),
        }
    }

    pub fn move_block(id: BlockId, from: BlockPath, to: BlockPath) -> Self {
        Operation::MoveBlock { id, from, to }
    }

    pub fn set_inline(id: BlockId, ops: Vec<InlineOp>) -> Self {
        Operation::SetInline {
            id,
            ops,
            selection_before: None,
            selection_after: None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Operation::InsertBlock { .. } => "insert_block",
            Operation::DeleteBlock { .. } => "delete_block",
            Operation::UpdateBlock { .. } => "update_block",
            Operation::MoveBlock { .. } => "move_block",
            Operation::SplitBlock { .. } => "split_block",
            Operation::MergeBlock { .. } => "merge_block",
            Operation::SetInline { .. } => "set_inline",
        }
    }

    /// The block the op is addressed to.
    pub fn block_id(&self) -> &BlockId {
        match self {
            Operation::InsertBlock { block, .. } | Operation::DeleteBlock { block, .. } => &block.id,
            Operation::UpdateBlock { id, .. }
            | Operation::MoveBlock { id, .. }
            | Operation::SplitBlock { id, .. }
            | Operation::SetInline { id, .. } => id,
            Operation::MergeBlock { target, .. } => target,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeSource {
    #[default]
    User,
    History,
}

/// Per-batch overrides. `None` falls back to the editor's history mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransactionMeta {
    #[serde(default)]
    pub source: ChangeSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_history: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_history: Option<bool>,
}

/// An ordered batch of operations applied as one unit.
///
/// `path` is the block path to select once the batch is applied; `None`
/// keeps the current path, `Some(None)` clears it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Transaction {
    pub operations: Vec<Operation>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub path: Option<Option<BlockPath>>,
    #[serde(default)]
    pub meta: TransactionMeta,
}

impl Transaction {
    pub fn new(operations: Vec<Operation>) -> Self {
        Self {
            operations,
            path: None,
            meta: TransactionMeta::default(),
        }
    }

    pub fn path(mut self, path: Option<BlockPath>) -> Self {
        self.path = Some(path);
        self
    }

    pub fn source(mut self, source: ChangeSource) -> Self {
        self.meta.source = source;
        self
    }

    pub fn without_saving(mut self) -> Self {
        self.meta.save_history = Some(false);
        self
    }

    pub fn merging(mut self, merge: bool) -> Self {
        self.meta.merge_history = Some(merge);
        self
    }
}
