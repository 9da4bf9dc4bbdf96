use std::collections::HashMap;
use std::sync::Arc;

use manos_inline::{InlineEditor, InlineTree, Node, RichTextEditor};

use crate::block::BlockId;
use crate::editor::Editor;
use crate::error::BlockError;
use crate::Result;

/// Behaviour a block type contributes to the engine.
///
/// `on_before_create` supplies initial content when a block is inserted
/// without any. `on_create` runs once the batch that created the block has
/// been fully applied, so it may issue further transforms.
pub trait BlockPlugin: Send + Sync {
    fn block_type(&self) -> &str;

    fn max_depth(&self) -> Option<usize> {
        None
    }

    /// Void blocks carry fixed content and never mount an inline editor.
    fn is_void(&self) -> bool {
        false
    }

    fn default_content(&self) -> InlineTree {
        InlineTree::empty_element(self.block_type())
    }

    fn on_before_create(&self, _editor: &Editor) -> Option<InlineTree> {
        None
    }

    fn on_create(&self, _editor: &mut Editor, _id: &BlockId) {}

    fn create_inline_editor(&self, content: InlineTree) -> Box<dyn InlineEditor> {
        Box::new(RichTextEditor::new(content))
    }
}

#[derive(Default, Clone)]
pub struct PluginRegistry {
    plugins: HashMap<String, Arc<dyn BlockPlugin>>,
}

impl PluginRegistry {
    pub fn new(plugins: impl IntoIterator<Item = Arc<dyn BlockPlugin>>) -> Result<Self> {
        let mut registry = Self::default();
        for plugin in plugins {
            registry.register(plugin)?;
        }
        Ok(registry)
    }

    /// Paragraph, headings, quote, lists, code and divider.
    pub fn core() -> Self {
        let plugins: Vec<Arc<dyn BlockPlugin>> = vec![
            Arc::new(ElementBlock::new("paragraph")),
            Arc::new(ElementBlock::new("heading-one")),
            Arc::new(ElementBlock::new("heading-two")),
            Arc::new(ElementBlock::new("heading-three")),
            Arc::new(ElementBlock::new("blockquote")),
            Arc::new(ElementBlock::new("bulleted-list")),
            Arc::new(ElementBlock::new("numbered-list")),
            Arc::new(ElementBlock::new("todo-list").with_max_depth(4)),
            Arc::new(ElementBlock::new("code")),
            Arc::new(DividerBlock),
        ];
        let plugins = plugins
            .into_iter()
            .map(|plugin| (plugin.block_type().to_string(), plugin))
            .collect();
        Self { plugins }
    }

    pub fn register(&mut self, plugin: Arc<dyn BlockPlugin>) -> Result<()> {
        let block_type = plugin.block_type().to_string();
        if self.plugins.contains_key(&block_type) {
            return Err(BlockError::invalid(format!(
                "duplicate block type: {block_type}"
            )));
        }
        self.plugins.insert(block_type, plugin);
        Ok(())
    }

    pub fn get(&self, block_type: &str) -> Option<&Arc<dyn BlockPlugin>> {
        self.plugins.get(block_type)
    }

    pub fn contains(&self, block_type: &str) -> bool {
        self.plugins.contains_key(block_type)
    }

    /// Registered block types, sorted.
    pub fn block_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.plugins.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}

/// Text block whose content root is an element named after the block type.
#[derive(Debug, Clone)]
pub struct ElementBlock {
    block_type: String,
    max_depth: Option<usize>,
}

impl ElementBlock {
    pub fn new(block_type: impl Into<String>) -> Self {
        Self {
            block_type: block_type.into(),
            max_depth: None,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }
}

impl BlockPlugin for ElementBlock {
    fn block_type(&self) -> &str {
        &self.block_type
    }

    fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DividerBlock;

impl BlockPlugin for DividerBlock {
    fn block_type(&self) -> &str {
        "divider"
    }

    fn max_depth(&self) -> Option<usize> {
        Some(0)
    }

    fn is_void(&self) -> bool {
        true
    }

    fn default_content(&self) -> InlineTree {
        InlineTree::new(vec![Node::divider()])
    }
}
