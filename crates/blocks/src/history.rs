use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::block::BlockPath;
use crate::ops::Operation;

/// A recorded batch together with the block path before and after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryBatch {
    pub operations: Vec<Operation>,
    pub path_before: Option<BlockPath>,
    pub path_after: Option<BlockPath>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMode {
    pub saving: bool,
    pub merging: bool,
}

impl Default for HistoryMode {
    fn default() -> Self {
        Self {
            saving: true,
            merging: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct History {
    undos: VecDeque<HistoryBatch>,
    redos: Vec<HistoryBatch>,
    mode: HistoryMode,
    max_undo: usize,
}

impl History {
    pub fn new(max_undo: usize) -> Self {
        Self {
            undos: VecDeque::new(),
            redos: Vec::new(),
            mode: HistoryMode::default(),
            max_undo,
        }
    }

    pub fn mode(&self) -> HistoryMode {
        self.mode
    }

    pub(crate) fn mode_mut(&mut self) -> &mut HistoryMode {
        &mut self.mode
    }

    /// Oldest entry first.
    pub fn undos(&self) -> &VecDeque<HistoryBatch> {
        &self.undos
    }

    pub fn redos(&self) -> &[HistoryBatch] {
        &self.redos
    }

    pub fn can_undo(&self) -> bool {
        !self.undos.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redos.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undos.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redos.len()
    }

    /// Records a new local edit and clears the redo stack.
    ///
    /// With `merge` set the batch is folded into the newest undo entry,
    /// which keeps that entry's `path_before`.
    pub fn record(&mut self, batch: HistoryBatch, merge: bool) {
        self.redos.clear();

        if merge {
            if let Some(top) = self.undos.back_mut() {
                top.operations.extend(batch.operations);
                top.path_after = batch.path_after;
                debug!(ops = top.operations.len(), "merged batch into undo entry");
                return;
            }
        }

        self.push_undo(batch);
        debug!(undos = self.undos.len(), "pushed undo entry");
    }

    pub(crate) fn pop_undo(&mut self) -> Option<HistoryBatch> {
        self.undos.pop_back()
    }

    pub(crate) fn pop_redo(&mut self) -> Option<HistoryBatch> {
        self.redos.pop()
    }

    pub(crate) fn push_undo(&mut self, batch: HistoryBatch) {
        self.undos.push_back(batch);
        while self.undos.len() > self.max_undo {
            self.undos.pop_front();
        }
    }

    pub(crate) fn push_redo(&mut self, batch: HistoryBatch) {
        self.redos.push(batch);
    }

    pub fn clear(&mut self) {
        self.undos.clear();
        self.redos.clear();
    }
}
