use manos_inline::Selection;

use crate::block::{Block, BlockPath};
use crate::editor::Editor;
use crate::selection::SelectedBlocks;
use crate::transforms::{DeleteBlockOptions, InsertBlockOptions, MergeBlockOptions, SplitBlockOptions};
use crate::Result;

/// Keyboard commands. Each returns whether it handled the key.
impl Editor {
    /// Splits the focused block at the caret. At the end of a block (or in
    /// an empty one) a default block is inserted after it instead; at the
    /// start of a non-empty block one is inserted before it.
    pub fn enter(&mut self) -> Result<bool> {
        let Some((path, block)) = self.focused_block() else {
            return Ok(false);
        };
        let default_type = self.config().default_block_type.clone();

        let Some(caret) = self.caret_in(&block) else {
            self.insert_block(&default_type, InsertBlockOptions::at(path.order() + 1).focus())?;
            return Ok(true);
        };
        if !caret.is_collapsed() {
            return Ok(false);
        }

        let content = &block.content;
        if content.is_empty() || content.is_end(&caret.focus) {
            self.insert_block(&default_type, InsertBlockOptions::at(path.order() + 1).focus())?;
        } else if content.is_start(&caret.focus) {
            self.insert_block(&default_type, InsertBlockOptions::at(path.order()))?;
        } else {
            self.split_block(SplitBlockOptions {
                id: Some(block.id.clone()),
                point: Some(caret.focus),
                focus: true,
                ..SplitBlockOptions::default()
            })?;
        }
        Ok(true)
    }

    /// With the caret at the start of a block: deletes it when empty,
    /// otherwise merges it into the previous block. An empty or void previous
    /// block is deleted instead and the caret stays put. The first block is
    /// left alone.
    pub fn backspace(&mut self) -> Result<bool> {
        let Some((path, block)) = self.focused_block() else {
            return Ok(false);
        };
        let Some(caret) = self.caret_in(&block) else {
            return Ok(false);
        };
        if !caret.is_collapsed() || !block.content.is_start(&caret.focus) {
            return Ok(false);
        }
        let Some(previous) = path
            .previous()
            .and_then(|previous| self.block_at(previous))
            .cloned()
        else {
            return Ok(false);
        };

        if block.content.is_empty() {
            self.delete_block(DeleteBlockOptions {
                id: Some(block.id),
                focus: true,
                ..DeleteBlockOptions::default()
            })?;
            return Ok(true);
        }

        if previous.content.is_empty() || self.plugin_for(&previous.block_type)?.is_void() {
            self.delete_block(DeleteBlockOptions::id(previous.id))?;
            return Ok(true);
        }

        self.merge_block(MergeBlockOptions {
            target: Some(previous.id),
            source: Some(block.id),
            focus: true,
            ..MergeBlockOptions::default()
        })?;
        Ok(true)
    }

    pub fn tab(&mut self) -> Result<bool> {
        match self.focused_block() {
            Some((_, block)) => self.increase_block_depth(&block.id),
            None => Ok(false),
        }
    }

    pub fn shift_tab(&mut self) -> Result<bool> {
        match self.focused_block() {
            Some((_, block)) => self.decrease_block_depth(&block.id),
            None => Ok(false),
        }
    }

    /// Selects the focused block's text; once that is fully selected (or
    /// there is no text to select) escalates to selecting every block.
    pub fn select_all(&mut self) -> Result<bool> {
        if self.is_empty() {
            return Ok(false);
        }
        if self.selected_blocks().is_some() {
            self.set_block_selected(Some(SelectedBlocks::All))?;
            return Ok(true);
        }
        let Some((_, block)) = self.focused_block() else {
            self.set_block_selected(Some(SelectedBlocks::All))?;
            return Ok(true);
        };

        let content = &block.content;
        let whole = content
            .first_text_point()
            .zip(content.last_text_point())
            .map(|(anchor, focus)| Selection { anchor, focus });
        let fully_selected = self.caret_in(&block).is_some_and(|caret| {
            let a = content.offset_of(&caret.anchor);
            let b = content.offset_of(&caret.focus);
            match (a, b) {
                (Ok(a), Ok(b)) => a.min(b) == 0 && a.max(b) == content.text_len(),
                _ => false,
            }
        });

        match whole {
            Some(whole) if !content.is_empty() && !fully_selected => {
                self.set_inline_selection(&block.id, whole)?;
            }
            _ => self.set_block_selected(Some(SelectedBlocks::All))?,
        }
        Ok(true)
    }

    fn focused_block(&self) -> Option<(BlockPath, Block)> {
        let path = self.path()?;
        self.block_at(path).cloned().map(|block| (path, block))
    }

    fn caret_in(&self, block: &Block) -> Option<Selection> {
        self.inline_editor(&block.id)
            .ok()
            .and_then(|editor| editor.selection().cloned())
    }
}
