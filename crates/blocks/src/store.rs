use std::collections::HashMap;

use manos_inline::InlineTree;

use crate::block::{Block, BlockId, BlockMeta, BlockPatch, Document};
use crate::error::BlockError;
use crate::Result;

/// Ordered collection of blocks.
///
/// `order` holds block ids in document order and every block's
/// `meta.order` equals its index there, so orders stay dense and unique
/// after each mutation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockStore {
    blocks: HashMap<BlockId, Block>,
    order: Vec<BlockId>,
}

impl BlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from a document, rejecting mismatched keys, duplicate
    /// orders and gaps.
    pub fn from_document(document: Document) -> Result<Self> {
        let len = document.len();
        let mut slots: Vec<Option<Block>> = vec![None; len];

        for (key, block) in document.blocks {
            if key != block.id {
                return Err(BlockError::invalid(format!(
                    "document key {key} does not match block id {}",
                    block.id
                )));
            }
            let order = block.meta.order;
            let Some(slot) = slots.get_mut(order) else {
                return Err(BlockError::InvalidPath { order, len });
            };
            if slot.is_some() {
                return Err(BlockError::invalid(format!("duplicate order {order}")));
            }
            *slot = Some(block);
        }

        let mut store = Self::new();
        for block in slots.into_iter().flatten() {
            store.order.push(block.id.clone());
            store.blocks.insert(block.id.clone(), block);
        }
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &BlockId) -> bool {
        self.blocks.contains_key(id)
    }

    pub fn get(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.get(id)
    }

    pub fn id_at(&self, order: usize) -> Option<&BlockId> {
        self.order.get(order)
    }

    pub fn block_at(&self, order: usize) -> Option<&Block> {
        self.id_at(order).and_then(|id| self.blocks.get(id))
    }

    /// Blocks in document order. The iterator is lazy and can be cloned to
    /// restart from the same position.
    pub fn list(&self) -> impl Iterator<Item = &Block> + Clone + '_ {
        self.order.iter().filter_map(move |id| self.blocks.get(id))
    }

    pub fn to_document(&self) -> Document {
        Document {
            blocks: self
                .blocks
                .iter()
                .map(|(id, block)| (id.clone(), block.clone()))
                .collect(),
        }
    }

    /// Inserts `block` at `at`, shifting every block at or after `at` by one.
    pub fn insert(&mut self, mut block: Block, at: usize) -> Result<()> {
        if self.blocks.contains_key(&block.id) {
            return Err(BlockError::DuplicateId(block.id));
        }
        if at > self.order.len() {
            return Err(BlockError::InvalidPath {
                order: at,
                len: self.order.len(),
            });
        }
        block.meta.order = at;
        self.order.insert(at, block.id.clone());
        self.blocks.insert(block.id.clone(), block);
        self.reindex(at + 1, self.order.len());
        Ok(())
    }

    /// Removes the block and shifts every later block down by one.
    pub fn delete(&mut self, id: &BlockId) -> Result<Block> {
        let block = self
            .blocks
            .remove(id)
            .ok_or_else(|| BlockError::NotFound(id.clone()))?;
        let order = block.meta.order;
        self.order.remove(order);
        self.reindex(order, self.order.len());
        Ok(block)
    }

    /// Merges `patch` into the block and returns the patch that undoes it.
    pub fn update_meta(&mut self, id: &BlockId, patch: &BlockPatch) -> Result<BlockPatch> {
        let block = self
            .blocks
            .get_mut(id)
            .ok_or_else(|| BlockError::NotFound(id.clone()))?;
        Ok(patch.apply_to(block))
    }

    /// Moves the block to `new_order` and returns its previous order.
    ///
    /// Moving forward shifts the blocks in `(old, new]` back by one, moving
    /// backward shifts `[new, old)` forward by one.
    pub fn move_to(&mut self, id: &BlockId, new_order: usize) -> Result<usize> {
        let old_order = self
            .blocks
            .get(id)
            .map(|b| b.meta.order)
            .ok_or_else(|| BlockError::NotFound(id.clone()))?;
        if new_order >= self.order.len() {
            return Err(BlockError::InvalidPath {
                order: new_order,
                len: self.order.len(),
            });
        }
        if new_order == old_order {
            return Ok(old_order);
        }

        let moved = self.order.remove(old_order);
        self.order.insert(new_order, moved);
        let (lo, hi) = if old_order < new_order {
            (old_order, new_order)
        } else {
            (new_order, old_order)
        };
        self.reindex(lo, hi + 1);
        Ok(old_order)
    }

    pub(crate) fn set_content(&mut self, id: &BlockId, content: InlineTree) -> Result<()> {
        let block = self
            .blocks
            .get_mut(id)
            .ok_or_else(|| BlockError::NotFound(id.clone()))?;
        block.content = content;
        Ok(())
    }

    /// Copies every meta field except `order`.
    pub(crate) fn assign_meta(&mut self, id: &BlockId, meta: &BlockMeta) -> Result<()> {
        let block = self
            .blocks
            .get_mut(id)
            .ok_or_else(|| BlockError::NotFound(id.clone()))?;
        block.meta.assign_fields(meta);
        Ok(())
    }

    fn reindex(&mut self, start: usize, end: usize) {
        for (order, id) in self.order.iter().enumerate().take(end).skip(start) {
            if let Some(block) = self.blocks.get_mut(id) {
                block.meta.order = order;
            }
        }
    }
}
