use std::sync::Arc;

use manos_inline::{InlineEditor, InlineOp, Selection, invert_ops};
use tracing::{debug, trace, warn};

use crate::block::{Block, BlockId, BlockMeta, BlockPath, Document};
use crate::config::EditorConfig;
use crate::error::BlockError;
use crate::history::{History, HistoryBatch, HistoryMode};
use crate::inverse::invert_batch;
use crate::ops::{ChangeSource, Operation, Transaction};
use crate::plugin::{BlockPlugin, PluginRegistry};
use crate::registry::InlineEditorRegistry;
use crate::selection::{BlockSelection, SelectedBlocks};
use crate::store::BlockStore;
use crate::value::{DEFAULT_VERSION, EditorValue};
use crate::Result;

/// Emitted after every batch that applied at least one operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub source: ChangeSource,
    pub document: Document,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type ChangeListener = Box<dyn FnMut(&ChangeEvent) + Send>;

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedOperation {
    pub index: usize,
    pub operation: Operation,
    pub error: BlockError,
}

/// Outcome of one batch: the resolved ops that were applied, in order, and
/// the ops that were rejected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyReport {
    pub applied: Vec<Operation>,
    pub skipped: Vec<SkippedOperation>,
}

impl ApplyReport {
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

pub struct Editor {
    store: BlockStore,
    editors: InlineEditorRegistry,
    plugins: PluginRegistry,
    selection: BlockSelection,
    history: History,
    config: EditorConfig,
    listeners: Vec<(ListenerId, ChangeListener)>,
    next_listener: u64,
}

impl Editor {
    /// An editor over an empty document.
    pub fn new(plugins: PluginRegistry, config: EditorConfig) -> Self {
        let config = config.with_defaults();
        Self {
            store: BlockStore::new(),
            editors: InlineEditorRegistry::new(),
            plugins,
            selection: BlockSelection::default(),
            history: History::new(config.max_undo),
            config,
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    /// Core plugins and one empty default block, focused.
    pub fn with_core_plugins() -> Self {
        let mut editor = Self::new(PluginRegistry::core(), EditorConfig::default());
        let block_type = editor.config.default_block_type.clone();
        let Some(plugin) = editor.plugins.get(&block_type).cloned() else {
            warn!(%block_type, "no plugin for default block type, starting empty");
            return editor;
        };
        let mut block = Block::new(BlockId::generate(), block_type, plugin.default_content());
        block.meta.align = Some(editor.config.default_align);
        if let Err(error) = editor.store.insert(block.clone(), 0) {
            warn!(%error, "could not seed default block");
            return editor;
        }
        editor.mount(plugin.as_ref(), &block);
        if let Err(error) = editor.selection.set_path(Some(BlockPath(0)), 1) {
            warn!(%error, "could not focus default block");
        }
        editor
    }

    /// Loads `blocks` in iteration order with core plugins and default config.
    pub fn from_blocks(blocks: impl IntoIterator<Item = Block>) -> Result<Self> {
        let blocks = blocks.into_iter().enumerate().map(|(order, mut block)| {
            block.meta.order = order;
            block
        });
        Self::from_document(
            Document::from_blocks(blocks),
            PluginRegistry::core(),
            EditorConfig::default(),
        )
    }

    /// Loads a document, rejecting mismatched keys, order gaps and unknown
    /// block types. Every non-void block gets a fresh inline editor.
    pub fn from_document(
        document: Document,
        plugins: PluginRegistry,
        config: EditorConfig,
    ) -> Result<Self> {
        let store = BlockStore::from_document(document).inspect_err(|error| {
            warn!(%error, "rejected document");
        })?;
        let mut editor = Self::new(plugins, config);
        for block in store.list() {
            let plugin = editor.plugin_for(&block.block_type).inspect_err(|error| {
                warn!(%error, id = %block.id, "rejected document");
            })?;
            editor.mount(plugin.as_ref(), block);
        }
        editor.store = store;
        Ok(editor)
    }

    pub fn from_value(
        value: EditorValue,
        plugins: PluginRegistry,
        config: EditorConfig,
    ) -> Result<Self> {
        if value.version > DEFAULT_VERSION {
            warn!(version = value.version, schema = %value.schema, "rejected value");
            return Err(BlockError::Serialization(format!(
                "unsupported value version {}",
                value.version
            )));
        }
        Self::from_document(value.into_document(), plugins, config)
    }

    pub fn to_value(&self) -> EditorValue {
        EditorValue::from_document(self.snapshot())
    }

    pub fn store(&self) -> &BlockStore {
        &self.store
    }

    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn selection(&self) -> &BlockSelection {
        &self.selection
    }

    pub fn path(&self) -> Option<BlockPath> {
        self.selection.path()
    }

    pub fn selected_blocks(&self) -> Option<&SelectedBlocks> {
        self.selection.selected_blocks()
    }

    pub fn inline_editor(&self, id: &BlockId) -> Result<&dyn InlineEditor> {
        self.editors.get(id)
    }

    /// The block holding the live inline caret, with the caret.
    pub fn caret(&self) -> Option<(&BlockId, &Selection)> {
        self.editors.caret()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn get_block(&self, id: &BlockId) -> Option<&Block> {
        self.store.get(id)
    }

    pub fn block_at(&self, path: BlockPath) -> Option<&Block> {
        self.store.block_at(path.order())
    }

    /// Blocks in document order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> + Clone + '_ {
        self.store.list()
    }

    /// Deep copy of the current document.
    pub fn snapshot(&self) -> Document {
        self.store.to_document()
    }

    /// Plain text of every block, one line per block.
    pub fn plain_text(&self) -> String {
        self.blocks()
            .map(|block| block.content.plain_text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn on_change(&mut self, listener: impl FnMut(&ChangeEvent) + Send + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn off_change(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener, _)| *listener != id);
        self.listeners.len() != before
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history_mode(&self) -> HistoryMode {
        self.history.mode()
    }

    /// Runs `f` with history recording off, then restores the prior mode.
    pub fn without_saving_history<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let prev = self.history.mode().saving;
        self.history.mode_mut().saving = false;
        let out = f(self);
        self.history.mode_mut().saving = prev;
        out
    }

    /// Runs `f` with every recorded batch folded into the newest undo entry.
    pub fn with_merging_history<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let prev = self.history.mode().merging;
        self.history.mode_mut().merging = true;
        let out = f(self);
        self.history.mode_mut().merging = prev;
        out
    }

    pub fn without_merging_history<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let prev = self.history.mode().merging;
        self.history.mode_mut().merging = false;
        let out = f(self);
        self.history.mode_mut().merging = prev;
        out
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn undo(&mut self) -> bool {
        let Some(batch) = self.history.pop_undo() else {
            return false;
        };

        let tx = Transaction::new(invert_batch(&batch.operations))
            .path(batch.path_before)
            .source(ChangeSource::History)
            .without_saving();
        let report = self.apply_transforms(tx);
        if !report.skipped.is_empty() {
            warn!(skipped = report.skipped.len(), "undo skipped inverse operations");
        }

        self.history.push_redo(batch);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(batch) = self.history.pop_redo() else {
            return false;
        };

        let tx = Transaction::new(batch.operations.clone())
            .path(batch.path_after)
            .source(ChangeSource::History)
            .without_saving();
        let report = self.apply_transforms(tx);
        if !report.skipped.is_empty() {
            warn!(skipped = report.skipped.len(), "redo skipped operations");
        }

        self.history.push_undo(batch);
        true
    }

    /// Applies a batch in order, each op against the state left by the ones
    /// before it. Invalid ops are skipped and reported; the batch never
    /// aborts.
    ///
    /// Block changes go to a draft store that replaces the live one once
    /// every op has run. Path, history, listeners and `on_create` hooks are
    /// handled after the swap. The path keeps pointing at the focused block
    /// unless the batch removed it or names a path of its own.
    pub fn apply_transforms(&mut self, tx: Transaction) -> ApplyReport {
        let Transaction {
            operations,
            path,
            meta,
        } = tx;
        let path_before = self.selection.path();
        let focused = path_before.and_then(|p| self.store.id_at(p.order()).cloned());
        let mut draft = self.store.clone();
        let mut report = ApplyReport::default();
        let mut created: Vec<BlockId> = Vec::new();
        let mut caret_moved = false;

        for (index, operation) in operations.into_iter().enumerate() {
            let kind = operation.kind();
            match self.apply_operation(&mut draft, operation.clone()) {
                Ok(resolved) => {
                    trace!(index, kind, id = %resolved.block_id(), "applied operation");
                    match &resolved {
                        Operation::InsertBlock { block, .. } => created.push(block.id.clone()),
                        Operation::SetInline {
                            selection_after: Some(_),
                            ..
                        } => caret_moved = true,
                        _ => {}
                    }
                    report.applied.push(resolved);
                }
                Err(error) => {
                    warn!(index, kind, %error, "skipping operation");
                    report.skipped.push(SkippedOperation {
                        index,
                        operation,
                        error,
                    });
                }
            }
        }

        self.store = draft;
        let len = self.store.len();
        self.selection.clamp(len);
        if let Some(block) = focused.and_then(|id| self.store.get(&id)) {
            self.selection.follow(block.path());
        }
        if let Some(target) = path {
            if let Err(error) = self.selection.set_path(target, len) {
                warn!(%error, "ignoring batch path");
            }
        }
        if caret_moved {
            self.selection.clear_selected();
        }
        let path_after = self.selection.path();

        if report.applied.is_empty() {
            debug!(skipped = report.skipped.len(), source = ?meta.source, "batch applied nothing");
            return report;
        }

        let mode = self.history.mode();
        if meta.save_history.unwrap_or(mode.saving) {
            let merge = meta.merge_history.unwrap_or(mode.merging);
            self.history.record(
                HistoryBatch {
                    operations: report.applied.clone(),
                    path_before,
                    path_after,
                },
                merge,
            );
        }
        debug!(
            applied = report.applied.len(),
            skipped = report.skipped.len(),
            source = ?meta.source,
            "applied batch"
        );

        self.emit(meta.source);

        if meta.source == ChangeSource::User {
            for id in created {
                let plugin = self
                    .store
                    .get(&id)
                    .and_then(|block| self.plugins.get(&block.block_type))
                    .cloned();
                if let Some(plugin) = plugin {
                    plugin.on_create(self, &id);
                }
            }
        }

        report
    }

    fn apply_operation(&mut self, draft: &mut BlockStore, operation: Operation) -> Result<Operation> {
        match operation {
            Operation::InsertBlock { path, mut block } => {
                let plugin = self.plugin_for(&block.block_type)?;
                self.check_depth(plugin.as_ref(), &block.meta)?;
                block.meta.order = path.order();
                draft.insert(block.clone(), path.order())?;
                self.mount(plugin.as_ref(), &block);
                Ok(Operation::InsertBlock { path, block })
            }
            Operation::DeleteBlock { block, .. } => {
                let removed = draft.delete(&block.id)?;
                self.editors.destroy(&removed.id);
                Ok(Operation::DeleteBlock {
                    path: removed.path(),
                    block: removed,
                })
            }
            Operation::UpdateBlock { id, properties, .. } => {
                if properties.is_empty() {
                    return Err(BlockError::invalid("empty block patch"));
                }
                let mut preview = draft
                    .get(&id)
                    .cloned()
                    .ok_or_else(|| BlockError::NotFound(id.clone()))?;
                properties.apply_to(&mut preview);
                let plugin = self.plugin_for(&preview.block_type)?;
                self.check_depth(plugin.as_ref(), &preview.meta)?;

                let prev_properties = draft.update_meta(&id, &properties)?;
                if plugin.is_void() {
                    self.editors.destroy(&id);
                } else if !self.editors.contains(&id) {
                    self.mount(plugin.as_ref(), &preview);
                }
                Ok(Operation::UpdateBlock {
                    id,
                    properties,
                    prev_properties,
                })
            }
            Operation::MoveBlock { id, to, .. } => {
                let from = draft.move_to(&id, to.order())?;
                Ok(Operation::MoveBlock {
                    id,
                    from: BlockPath(from),
                    to,
                })
            }
            Operation::SplitBlock {
                id,
                at,
                mut meta_after,
                mut block,
                ..
            } => {
                let source = draft
                    .get(&id)
                    .cloned()
                    .ok_or_else(|| BlockError::NotFound(id.clone()))?;
                if draft.contains(&block.id) {
                    return Err(BlockError::DuplicateId(block.id));
                }
                let plugin = self.plugin_for(&block.block_type)?;
                let (head, tail) = source.content.split_at(&at)?;
                if block.content.leaves() != tail.leaves() {
                    debug!(block = %block.id, "split block content is stale, using live tail");
                    block.content = tail;
                }

                let order = source.meta.order + 1;
                block.meta.order = order;
                meta_after.order = source.meta.order;
                draft.insert(block.clone(), order)?;
                draft.set_content(&id, head.clone())?;
                draft.assign_meta(&id, &meta_after)?;

                if let Ok(editor) = self.editors.get_mut(&id) {
                    editor.set_content(head);
                }
                self.mount(plugin.as_ref(), &block);
                Ok(Operation::SplitBlock {
                    id,
                    at,
                    meta_before: source.meta,
                    meta_after,
                    block,
                })
            }
            Operation::MergeBlock {
                target,
                source,
                mut meta_after,
                ..
            } => {
                let source = draft
                    .get(&source.id)
                    .cloned()
                    .ok_or(BlockError::NotFound(source.id))?;
                let absorbing = draft
                    .get(&target)
                    .cloned()
                    .ok_or_else(|| BlockError::NotFound(target.clone()))?;
                if source.meta.order != absorbing.meta.order + 1 {
                    return Err(BlockError::invalid(format!(
                        "merge source {} does not directly follow {}",
                        source.id, target
                    )));
                }

                let boundary = absorbing.content.end_point();
                let joined = absorbing.content.clone().join(source.content.clone());
                meta_after.order = absorbing.meta.order;
                draft.set_content(&target, joined.clone())?;
                draft.assign_meta(&target, &meta_after)?;
                draft.delete(&source.id)?;

                self.editors.destroy(&source.id);
                if let Ok(editor) = self.editors.get_mut(&target) {
                    editor.set_content(joined);
                }
                Ok(Operation::MergeBlock {
                    target,
                    source,
                    boundary,
                    meta_before: absorbing.meta,
                    meta_after,
                })
            }
            Operation::SetInline {
                id,
                ops,
                selection_after,
                ..
            } => {
                if !draft.contains(&id) {
                    return Err(BlockError::NotFound(id));
                }
                if ops.is_empty() {
                    return Err(BlockError::invalid("set_inline without inline ops"));
                }
                let editor = self.editors.get_mut(&id)?;
                let selection_before = editor.selection().cloned();

                let mut resolved = Vec::with_capacity(ops.len());
                for op in ops {
                    match editor.apply(op) {
                        Ok(applied) => resolved.push(applied),
                        Err(error) => {
                            rollback(editor, &resolved, selection_before);
                            return Err(error.into());
                        }
                    }
                }
                if selection_after.is_some() {
                    editor.set_selection(selection_after);
                }
                let selection_after = editor.selection().cloned();
                draft.set_content(&id, editor.content().clone())?;

                Ok(Operation::SetInline {
                    id,
                    ops: resolved,
                    selection_before,
                    selection_after,
                })
            }
        }
    }

    fn emit(&mut self, source: ChangeSource) {
        if self.listeners.is_empty() {
            return;
        }
        let event = ChangeEvent {
            source,
            document: self.store.to_document(),
        };
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event);
        }
    }

    pub(crate) fn plugin_for(&self, block_type: &str) -> Result<Arc<dyn BlockPlugin>> {
        self.plugins
            .get(block_type)
            .cloned()
            .ok_or_else(|| BlockError::invalid(format!("unknown block type: {block_type}")))
    }

    /// Depth cap for a block: its own `max_depth`, then the plugin's, then
    /// the config's.
    pub(crate) fn max_depth_for(&self, plugin: &dyn BlockPlugin, meta: &BlockMeta) -> usize {
        meta.max_depth
            .or_else(|| plugin.max_depth())
            .unwrap_or(self.config.max_depth)
    }

    fn check_depth(&self, plugin: &dyn BlockPlugin, meta: &BlockMeta) -> Result<()> {
        let max = self.max_depth_for(plugin, meta);
        if meta.depth > max {
            return Err(BlockError::invalid(format!(
                "depth {} exceeds max depth {max}",
                meta.depth
            )));
        }
        Ok(())
    }

    fn mount(&mut self, plugin: &dyn BlockPlugin, block: &Block) {
        if plugin.is_void() {
            return;
        }
        self.editors.create(
            block.id.clone(),
            plugin.create_inline_editor(block.content.clone()),
        );
    }

    pub(crate) fn selection_mut(&mut self) -> &mut BlockSelection {
        &mut self.selection
    }

    pub(crate) fn editors_mut(&mut self) -> &mut InlineEditorRegistry {
        &mut self.editors
    }
}

fn rollback(editor: &mut dyn InlineEditor, applied: &[InlineOp], selection: Option<Selection>) {
    for op in invert_ops(applied) {
        if let Err(error) = editor.apply(op) {
            warn!(%error, "inline rollback step failed");
        }
    }
    editor.set_selection(selection);
}
