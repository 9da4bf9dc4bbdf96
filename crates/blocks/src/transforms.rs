use manos_inline::{InlineOp, InlineTree, Point, Selection};
use tracing::debug;

use crate::block::{Align, Block, BlockId, BlockMeta, BlockPatch, BlockPath};
use crate::editor::{ApplyReport, Editor};
use crate::error::BlockError;
use crate::ops::{Operation, Transaction};
use crate::selection::{FocusAt, SelectedBlocks};
use crate::Result;

/// Caller-supplied parts of a new block. Missing parts come from the block
/// type's plugin and the editor config.
#[derive(Debug, Clone, Default)]
pub struct BlockData {
    pub id: Option<BlockId>,
    pub content: Option<InlineTree>,
    pub depth: Option<usize>,
    pub align: Option<Align>,
}

#[derive(Debug, Clone, Default)]
pub struct InsertBlockOptions {
    /// Defaults to right after the current path, else the end.
    pub at: Option<BlockPath>,
    pub focus: bool,
    pub block_data: BlockData,
}

impl InsertBlockOptions {
    pub fn at(order: usize) -> Self {
        Self {
            at: Some(BlockPath(order)),
            ..Self::default()
        }
    }

    pub fn focus(mut self) -> Self {
        self.focus = true;
        self
    }

    pub fn id(mut self, id: impl Into<BlockId>) -> Self {
        self.block_data.id = Some(id.into());
        self
    }

    pub fn content(mut self, content: InlineTree) -> Self {
        self.block_data.content = Some(content);
        self
    }
}

/// Addresses a block by `id`, else by `at`, else by the current path.
#[derive(Debug, Clone, Default)]
pub struct DeleteBlockOptions {
    pub id: Option<BlockId>,
    pub at: Option<BlockPath>,
    /// Moves the caret to the end of the previous block.
    pub focus: bool,
}

impl DeleteBlockOptions {
    pub fn at(order: usize) -> Self {
        Self {
            at: Some(BlockPath(order)),
            ..Self::default()
        }
    }

    pub fn id(id: impl Into<BlockId>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SplitBlockOptions {
    pub id: Option<BlockId>,
    pub at: Option<BlockPath>,
    /// Split point; defaults to the focus of the block's inline caret.
    pub point: Option<Point>,
    pub new_id: Option<BlockId>,
    /// Type of the new block; defaults to the source block's type.
    pub block_type: Option<String>,
    pub focus: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MergeBlockOptions {
    /// Defaults to the block before `source`.
    pub target: Option<BlockId>,
    /// Defaults to the block at the current path.
    pub source: Option<BlockId>,
    /// Meta of the absorbing block after the merge; defaults to its own.
    pub merged_meta: Option<BlockMeta>,
    pub focus: bool,
}

impl Editor {
    pub fn insert_block(&mut self, block_type: &str, options: InsertBlockOptions) -> Result<BlockId> {
        let plugin = self.plugin_for(block_type)?;
        let len = self.len();
        let at = options
            .at
            .or_else(|| self.path().map(BlockPath::next))
            .unwrap_or(BlockPath(len));
        if at.order() > len {
            return Err(BlockError::InvalidPath {
                order: at.order(),
                len,
            });
        }

        let data = options.block_data;
        let id = data.id.unwrap_or_else(BlockId::generate);
        if self.store().contains(&id) {
            return Err(BlockError::DuplicateId(id));
        }
        let content = match data.content {
            Some(content) => content,
            None => plugin
                .on_before_create(self)
                .unwrap_or_else(|| plugin.default_content()),
        };
        let meta = BlockMeta {
            order: at.order(),
            depth: data.depth.unwrap_or(0),
            max_depth: None,
            align: Some(data.align.unwrap_or(self.config().default_align)),
        };
        let block = Block {
            id: id.clone(),
            block_type: block_type.to_string(),
            content,
            meta,
        };

        let mut tx = Transaction::new(vec![Operation::insert_block(at, block)]);
        if options.focus {
            tx = tx.path(Some(at));
        }
        self.commit(tx)?;
        if options.focus {
            self.place_caret(&id, FocusAt::Start);
        }
        Ok(id)
    }

    pub fn delete_block(&mut self, options: DeleteBlockOptions) -> Result<()> {
        let block = self.target_block(options.id.as_ref(), options.at)?.clone();
        let order = block.meta.order;
        let previous = order
            .checked_sub(1)
            .and_then(|o| self.store().id_at(o))
            .cloned();

        let mut tx = Transaction::new(vec![Operation::delete_block(block)]);
        if options.focus {
            let path = match previous {
                Some(_) => order.checked_sub(1).map(BlockPath),
                None if self.len() > 1 => Some(BlockPath(0)),
                None => None,
            };
            tx = tx.path(path);
        }
        self.commit(tx)?;

        if options.focus {
            if let Some(previous) = previous {
                self.place_caret(&previous, FocusAt::End);
            }
        }
        Ok(())
    }

    /// Moves block `id` to `to`. The path follows the moved block.
    pub fn move_block(&mut self, id: &BlockId, to: BlockPath) -> Result<()> {
        let from = self
            .get_block(id)
            .map(Block::path)
            .ok_or_else(|| BlockError::NotFound(id.clone()))?;
        let len = self.len();
        if to.order() >= len {
            return Err(BlockError::InvalidPath {
                order: to.order(),
                len,
            });
        }
        if from == to {
            return Ok(());
        }

        let tx = Transaction::new(vec![Operation::move_block(id.clone(), from, to)]).path(Some(to));
        self.commit(tx).map(|_| ())
    }

    /// Moves block `id` into the gap before the block currently at `gap`
    /// (`gap == len` is the end), as a drag-and-drop list reports it.
    pub fn move_block_to_gap(&mut self, id: &BlockId, gap: usize) -> Result<()> {
        let from = self
            .get_block(id)
            .map(|block| block.meta.order)
            .ok_or_else(|| BlockError::NotFound(id.clone()))?;
        let len = self.len();
        if gap > len {
            return Err(BlockError::InvalidPath { order: gap, len });
        }

        let mut to = gap;
        if to > from {
            to -= 1;
        }
        to = to.min(len.saturating_sub(1));
        self.move_block(id, BlockPath(to))
    }

    /// Splits a block at a point, moving the tail into a new block right
    /// after it. Returns the new block's id.
    ///
    /// Without an explicit point the block's inline caret is used; a block
    /// with no mounted inline editor is left alone and `None` is returned.
    pub fn split_block(&mut self, options: SplitBlockOptions) -> Result<Option<BlockId>> {
        let block = self.target_block(options.id.as_ref(), options.at)?.clone();
        let point = match options.point {
            Some(point) => point,
            None => {
                let Ok(editor) = self.inline_editor(&block.id) else {
                    debug!(id = %block.id, "no inline editor mounted, split ignored");
                    return Ok(None);
                };
                editor
                    .selection()
                    .map(|selection| selection.focus.clone())
                    .ok_or_else(|| BlockError::invalid("split without a caret"))?
            }
        };
        let (_, tail) = block.content.split_at(&point)?;

        let new_id = options.new_id.unwrap_or_else(BlockId::generate);
        if self.store().contains(&new_id) {
            return Err(BlockError::DuplicateId(new_id));
        }
        let block_type = options
            .block_type
            .unwrap_or_else(|| block.block_type.clone());
        self.plugin_for(&block_type)?;

        let order = block.meta.order + 1;
        let mut meta = block.meta.clone();
        meta.order = order;
        let new_block = Block {
            id: new_id.clone(),
            block_type,
            content: tail,
            meta,
        };

        let mut tx = Transaction::new(vec![Operation::SplitBlock {
            id: block.id,
            at: point,
            meta_before: block.meta.clone(),
            meta_after: block.meta,
            block: new_block,
        }]);
        if options.focus {
            tx = tx.path(Some(BlockPath(order)));
        }
        self.commit(tx)?;
        if options.focus {
            self.place_caret(&new_id, FocusAt::Start);
        }
        Ok(Some(new_id))
    }

    /// Appends `source` to the block right before it and removes `source`.
    pub fn merge_block(&mut self, options: MergeBlockOptions) -> Result<()> {
        let source = self.target_block(options.source.as_ref(), None)?.clone();
        let target = match &options.target {
            Some(id) => self.get_block(id).ok_or_else(|| BlockError::NotFound(id.clone()))?,
            None => source
                .meta
                .order
                .checked_sub(1)
                .and_then(|order| self.store().block_at(order))
                .ok_or_else(|| BlockError::invalid("first block has nothing to merge into"))?,
        }
        .clone();
        if source.meta.order != target.meta.order + 1 {
            return Err(BlockError::invalid(format!(
                "merge source {} does not directly follow {}",
                source.id, target.id
            )));
        }

        let caret = target.content.text_len();
        let meta_after = options.merged_meta.unwrap_or_else(|| target.meta.clone());
        let mut tx = Transaction::new(vec![Operation::MergeBlock {
            target: target.id.clone(),
            boundary: target.content.end_point(),
            meta_before: target.meta.clone(),
            meta_after,
            source,
        }]);
        if options.focus {
            tx = tx.path(Some(target.path()));
        }
        self.commit(tx)?;
        if options.focus {
            self.place_caret(&target.id, FocusAt::Offset(caret));
        }
        Ok(())
    }

    pub fn update_block(&mut self, id: &BlockId, patch: BlockPatch) -> Result<()> {
        if !self.store().contains(id) {
            return Err(BlockError::NotFound(id.clone()));
        }
        if patch.is_empty() {
            return Ok(());
        }
        self.commit(Transaction::new(vec![Operation::update_block(id.clone(), patch)]))
            .map(|_| ())
    }

    /// Indents the block one level. Returns false at its max depth.
    pub fn increase_block_depth(&mut self, id: &BlockId) -> Result<bool> {
        let block = self
            .get_block(id)
            .ok_or_else(|| BlockError::NotFound(id.clone()))?;
        let plugin = self.plugin_for(&block.block_type)?;
        let depth = block.meta.depth;
        if depth >= self.max_depth_for(plugin.as_ref(), &block.meta) {
            return Ok(false);
        }
        self.update_block(id, BlockPatch::depth(depth + 1))?;
        Ok(true)
    }

    /// Outdents the block one level. Returns false at depth 0.
    pub fn decrease_block_depth(&mut self, id: &BlockId) -> Result<bool> {
        let depth = self
            .get_block(id)
            .map(|block| block.meta.depth)
            .ok_or_else(|| BlockError::NotFound(id.clone()))?;
        if depth == 0 {
            return Ok(false);
        }
        self.update_block(id, BlockPatch::depth(depth - 1))?;
        Ok(true)
    }

    /// Applies inline ops to one block and focuses it. With `merge` set the
    /// edit joins the newest undo entry, as consecutive keystrokes do.
    pub fn apply_inline(&mut self, id: &BlockId, ops: Vec<InlineOp>, merge: bool) -> Result<()> {
        let path = self
            .get_block(id)
            .map(Block::path)
            .ok_or_else(|| BlockError::NotFound(id.clone()))?;
        self.inline_editor(id)?;

        let mut tx = Transaction::new(vec![Operation::set_inline(id.clone(), ops)]).path(Some(path));
        if merge {
            tx = tx.merging(true);
        }
        self.commit(tx).map(|_| ())
    }

    /// Replaces a block's inline content as one invertible inline edit.
    pub fn replace_block_content(&mut self, id: &BlockId, content: InlineTree) -> Result<()> {
        let current = self.inline_editor(id)?.content().clone();

        let mut ops = Vec::new();
        for ix in (0..current.children.len()).rev() {
            ops.push(InlineOp::remove_node(&current, vec![ix])?);
        }
        for (ix, node) in content.children.into_iter().enumerate() {
            ops.push(InlineOp::insert_node(vec![ix], node));
        }
        if ops.is_empty() {
            return Ok(());
        }
        self.commit(Transaction::new(vec![Operation::set_inline(id.clone(), ops)]))
            .map(|_| ())
    }

    /// Inserts a copy of the block right after it and focuses the copy.
    pub fn duplicate_block(&mut self, id: &BlockId) -> Result<BlockId> {
        let source = self
            .get_block(id)
            .ok_or_else(|| BlockError::NotFound(id.clone()))?;
        let at = source.path().next();
        let copy = Block {
            id: BlockId::generate(),
            block_type: source.block_type.clone(),
            content: source.content.clone(),
            meta: BlockMeta {
                order: at.order(),
                ..source.meta.clone()
            },
        };
        let copy_id = copy.id.clone();

        self.commit(Transaction::new(vec![Operation::insert_block(at, copy)]).path(Some(at)))?;
        Ok(copy_id)
    }

    /// Selects a block path, or clears it with `None`.
    pub fn set_selection(&mut self, path: Option<BlockPath>) -> Result<()> {
        let len = self.len();
        self.selection_mut().set_path(path, len)
    }

    /// Sets the multi-block selection. Selecting blocks drops every inline
    /// caret.
    pub fn set_block_selected(&mut self, selected: Option<SelectedBlocks>) -> Result<()> {
        let len = self.len();
        let clears_carets = selected.is_some();
        self.selection_mut().set_selected(selected, len)?;
        if clears_carets {
            self.editors_mut().clear_selections(None);
        }
        Ok(())
    }

    /// Focuses a block and places its caret. Clears any block selection.
    pub fn focus_block(&mut self, id: &BlockId, at: FocusAt) -> Result<()> {
        let path = self
            .get_block(id)
            .map(Block::path)
            .ok_or_else(|| BlockError::NotFound(id.clone()))?;
        let len = self.len();
        let selection = self.selection_mut();
        selection.set_path(Some(path), len)?;
        selection.clear_selected();
        self.place_caret(id, at);
        Ok(())
    }

    /// Sets an explicit inline selection inside a block and focuses it.
    pub fn set_inline_selection(&mut self, id: &BlockId, selection: Selection) -> Result<()> {
        let path = self
            .get_block(id)
            .map(Block::path)
            .ok_or_else(|| BlockError::NotFound(id.clone()))?;
        self.inline_editor(id)?;

        let len = self.len();
        let block_selection = self.selection_mut();
        block_selection.set_path(Some(path), len)?;
        block_selection.clear_selected();

        let editors = self.editors_mut();
        editors.clear_selections(Some(id));
        editors.get_mut(id)?.set_selection(Some(selection));
        Ok(())
    }

    /// Drops the path, the block selection and every inline caret.
    pub fn blur(&mut self) {
        let selection = self.selection_mut();
        selection.clear_selected();
        selection.set_path(None, 0).ok();
        self.editors_mut().clear_selections(None);
    }

    /// Applies a batch built by this API, turning the first rejected op
    /// into an error.
    fn commit(&mut self, tx: Transaction) -> Result<ApplyReport> {
        let mut report = self.apply_transforms(tx);
        if report.skipped.is_empty() {
            return Ok(report);
        }
        Err(report.skipped.remove(0).error)
    }

    fn target_block(&self, id: Option<&BlockId>, at: Option<BlockPath>) -> Result<&Block> {
        if let Some(id) = id {
            return self
                .get_block(id)
                .ok_or_else(|| BlockError::NotFound(id.clone()));
        }
        let path = at
            .or_else(|| self.path())
            .ok_or_else(|| BlockError::invalid("no block addressed and no current path"))?;
        self.block_at(path).ok_or(BlockError::InvalidPath {
            order: path.order(),
            len: self.len(),
        })
    }

    pub(crate) fn place_caret(&mut self, id: &BlockId, at: FocusAt) {
        let editors = self.editors_mut();
        editors.clear_selections(Some(id));
        let Ok(editor) = editors.get_mut(id) else {
            return;
        };
        let content = editor.content();
        let point = match at {
            FocusAt::Start => content.first_text_point(),
            FocusAt::End => content.last_text_point(),
            FocusAt::Offset(offset) => content.point_at_offset(offset),
        };
        editor.set_selection(point.map(Selection::collapsed));
    }
}
