use std::collections::HashMap;

use manos_inline::{InlineEditor, Selection};

use crate::block::BlockId;
use crate::error::BlockError;
use crate::Result;

/// Live inline editors keyed by the block they edit.
///
/// An editor is mounted when its block is created or loaded and destroyed
/// with the block. Void blocks never get one.
#[derive(Default)]
pub struct InlineEditorRegistry {
    editors: HashMap<BlockId, Box<dyn InlineEditor>>,
}

impl InlineEditorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mounts `editor` for `id`, replacing any previous instance.
    pub fn create(&mut self, id: BlockId, editor: Box<dyn InlineEditor>) {
        self.editors.insert(id, editor);
    }

    pub fn destroy(&mut self, id: &BlockId) -> Option<Box<dyn InlineEditor>> {
        self.editors.remove(id)
    }

    pub fn get(&self, id: &BlockId) -> Result<&dyn InlineEditor> {
        self.editors
            .get(id)
            .map(|editor| &**editor)
            .ok_or_else(|| BlockError::InlineEditorNotFound(id.clone()))
    }

    pub fn get_mut(&mut self, id: &BlockId) -> Result<&mut (dyn InlineEditor + 'static)> {
        self.editors
            .get_mut(id)
            .map(|editor| &mut **editor)
            .ok_or_else(|| BlockError::InlineEditorNotFound(id.clone()))
    }

    pub fn contains(&self, id: &BlockId) -> bool {
        self.editors.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.editors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.editors.is_empty()
    }

    /// The block holding a live inline caret, if any.
    pub fn caret(&self) -> Option<(&BlockId, &Selection)> {
        self.editors
            .iter()
            .find_map(|(id, editor)| editor.selection().map(|selection| (id, selection)))
    }

    /// Drops the inline selection of every editor except `keep`.
    pub fn clear_selections(&mut self, keep: Option<&BlockId>) {
        for (id, editor) in self.editors.iter_mut() {
            if Some(id) != keep && editor.selection().is_some() {
                editor.set_selection(None);
            }
        }
    }
}
