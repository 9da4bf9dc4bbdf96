use manos_inline::invert_ops;

use crate::ops::Operation;

impl Operation {
    /// The op that undoes this one. Only meaningful for resolved ops, which
    /// is what the engine records.
    pub fn inverse(&self) -> Operation {
        match self.clone() {
            Operation::InsertBlock { path, block } => Operation::DeleteBlock { path, block },
            Operation::DeleteBlock { path, block } => Operation::InsertBlock { path, block },
            Operation::UpdateBlock {
                id,
                properties,
                prev_properties,
            } => Operation::UpdateBlock {
                id,
                properties: prev_properties,
                prev_properties: properties,
            },
            Operation::MoveBlock { id, from, to } => Operation::MoveBlock {
                id,
                from: to,
                to: from,
            },
            Operation::SplitBlock {
                id,
                at,
                meta_before,
                meta_after,
                block,
            } => Operation::MergeBlock {
                target: id,
                source: block,
                boundary: at,
                meta_before: meta_after,
                meta_after: meta_before,
            },
            Operation::MergeBlock {
                target,
                source,
                boundary,
                meta_before,
                meta_after,
            } => Operation::SplitBlock {
                id: target,
                at: boundary,
                meta_before: meta_after,
                meta_after: meta_before,
                block: source,
            },
            Operation::SetInline {
                id,
                ops,
                selection_before,
                selection_after,
            } => Operation::SetInline {
                id,
                ops: invert_ops(&ops),
                selection_before: selection_after,
                selection_after: selection_before,
            },
        }
    }
}

/// Inverts a batch: each op's inverse, last op first.
pub fn invert_batch(operations: &[Operation]) -> Vec<Operation> {
    operations.iter().rev().map(Operation::inverse).collect()
}
