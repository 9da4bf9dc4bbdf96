use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::block::BlockPath;
use crate::error::BlockError;
use crate::Result;

/// Where a focused block places its caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusAt {
    #[default]
    Start,
    End,
    Offset(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectedBlocks {
    All,
    Orders(BTreeSet<usize>),
}

impl SelectedBlocks {
    pub fn orders(orders: impl IntoIterator<Item = usize>) -> Self {
        SelectedBlocks::Orders(orders.into_iter().collect())
    }

    pub fn contains(&self, order: usize) -> bool {
        match self {
            SelectedBlocks::All => true,
            SelectedBlocks::Orders(orders) => orders.contains(&order),
        }
    }

    /// Selected orders for a document of `len` blocks.
    pub fn resolve(&self, len: usize) -> Vec<usize> {
        match self {
            SelectedBlocks::All => (0..len).collect(),
            SelectedBlocks::Orders(orders) => orders.iter().copied().filter(|&o| o < len).collect(),
        }
    }
}

/// Block-level selection: the focused block path and an optional
/// multi-block selection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockSelection {
    path: Option<BlockPath>,
    selected: Option<SelectedBlocks>,
}

impl BlockSelection {
    pub fn path(&self) -> Option<BlockPath> {
        self.path
    }

    pub fn selected_blocks(&self) -> Option<&SelectedBlocks> {
        self.selected.as_ref()
    }

    pub(crate) fn set_path(&mut self, path: Option<BlockPath>, len: usize) -> Result<()> {
        if let Some(path) = path {
            check_order(path.order(), len)?;
        }
        self.path = path;
        Ok(())
    }

    pub(crate) fn set_selected(&mut self, selected: Option<SelectedBlocks>, len: usize) -> Result<()> {
        if let Some(SelectedBlocks::Orders(orders)) = &selected {
            if let Some(&order) = orders.iter().find(|&&o| o >= len) {
                return Err(BlockError::InvalidPath { order, len });
            }
        }
        self.selected = selected.filter(|s| !matches!(s, SelectedBlocks::Orders(o) if o.is_empty()));
        Ok(())
    }

    /// Points the path at a block the engine just relocated.
    pub(crate) fn follow(&mut self, path: BlockPath) {
        self.path = Some(path);
    }

    pub(crate) fn clear_selected(&mut self) {
        self.selected = None;
    }

    /// Pulls the path and selected orders back into `0..len`.
    pub(crate) fn clamp(&mut self, len: usize) {
        if let Some(path) = self.path {
            if path.order() >= len {
                self.path = len.checked_sub(1).map(BlockPath);
            }
        }
        if let Some(SelectedBlocks::Orders(orders)) = &mut self.selected {
            orders.retain(|&o| o < len);
        }
        if matches!(&self.selected, Some(SelectedBlocks::Orders(o)) if o.is_empty()) {
            self.selected = None;
        }
    }
}

fn check_order(order: usize, len: usize) -> Result<()> {
    if order >= len {
        return Err(BlockError::InvalidPath { order, len });
    }
    Ok(())
}
