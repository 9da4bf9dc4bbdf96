use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::InlineError;
use crate::tree::{AttrPatch, InlineTree, Marks, Node};

pub type Path = Vec<usize>;

/// One edit of an inline tree.
///
/// Every variant carries the data its inverse needs: removals hold the removed
/// text or node, attribute and mark changes hold the previous value. Applying
/// an op resolves `prev` from the tree, so recorded ops can be inverted
/// without looking at any editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum InlineOp {
    InsertText {
        #[serde(default)]
        path: Path,
        offset: usize,
        text: String,
    },
    RemoveText {
        #[serde(default)]
        path: Path,
        offset: usize,
        text: String,
    },
    InsertNode {
        #[serde(default)]
        path: Path,
        node: Node,
    },
    RemoveNode {
        #[serde(default)]
        path: Path,
        node: Node,
    },
    SetNodeAttrs {
        #[serde(default)]
        path: Path,
        patch: AttrPatch,
        #[serde(default)]
        prev: AttrPatch,
    },
    SetTextMarks {
        #[serde(default)]
        path: Path,
        marks: Marks,
        #[serde(default)]
        prev: Marks,
    },
}

impl InlineOp {
    pub fn insert_text(path: Path, offset: usize, text: impl Into<String>) -> Self {
        InlineOp::InsertText {
            path,
            offset,
            text: text.into(),
        }
    }

    pub fn insert_node(path: Path, node: Node) -> Self {
        InlineOp::InsertNode { path, node }
    }

    pub fn set_node_attrs(path: Path, patch: AttrPatch) -> Self {
        InlineOp::SetNodeAttrs {
            path,
            patch,
            prev: AttrPatch::default(),
        }
    }

    pub fn set_text_marks(path: Path, marks: Marks) -> Self {
        InlineOp::SetTextMarks {
            path,
            marks,
            prev: Marks::default(),
        }
    }

    /// Builds a `RemoveText` for `range` of the text leaf at `path`.
    pub fn remove_text(
        tree: &InlineTree,
        path: Path,
        range: Range<usize>,
    ) -> Result<Self, InlineError> {
        let Node::Text(leaf) = tree.node(&path)? else {
            return Err(InlineError::invalid_path(&path, "expected text node"));
        };
        let Some(text) = leaf.text.get(range.clone()) else {
            return Err(InlineError::out_of_bounds(&path, range.end, leaf.text.len()));
        };
        Ok(InlineOp::RemoveText {
            offset: range.start,
            text: text.to_string(),
            path,
        })
    }

    /// Builds a `RemoveNode` for the node currently at `path`.
    pub fn remove_node(tree: &InlineTree, path: Path) -> Result<Self, InlineError> {
        let node = tree.node(&path)?.clone();
        Ok(InlineOp::RemoveNode { path, node })
    }

    pub fn path(&self) -> &[usize] {
        match self {
            InlineOp::InsertText { path, .. }
            | InlineOp::RemoveText { path, .. }
            | InlineOp::InsertNode { path, .. }
            | InlineOp::RemoveNode { path, .. }
            | InlineOp::SetNodeAttrs { path, .. }
            | InlineOp::SetTextMarks { path, .. } => path,
        }
    }

    pub fn inverse(&self) -> InlineOp {
        match self.clone() {
            InlineOp::InsertText { path, offset, text } => {
                InlineOp::RemoveText { path, offset, text }
            }
            InlineOp::RemoveText { path, offset, text } => {
                InlineOp::InsertText { path, offset, text }
            }
            InlineOp::InsertNode { path, node } => InlineOp::RemoveNode { path, node },
            InlineOp::RemoveNode { path, node } => InlineOp::InsertNode { path, node },
            InlineOp::SetNodeAttrs { path, patch, prev } => InlineOp::SetNodeAttrs {
                path,
                patch: prev,
                prev: patch,
            },
            InlineOp::SetTextMarks { path, marks, prev } => InlineOp::SetTextMarks {
                path,
                marks: prev,
                prev: marks,
            },
        }
    }
}

/// Inverts a sequence of ops: each op's inverse, last op first.
pub fn invert_ops(ops: &[InlineOp]) -> Vec<InlineOp> {
    ops.iter().rev().map(InlineOp::inverse).collect()
}
