use std::collections::BTreeMap;
use std::fmt;

use manos_inline::InlineTree;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for BlockId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Position of a block in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockPath(pub usize);

impl BlockPath {
    pub fn new(order: usize) -> Self {
        Self(order)
    }

    pub fn order(self) -> usize {
        self.0
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn previous(self) -> Option<Self> {
        self.0.checked_sub(1).map(Self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockMeta {
    pub order: usize,
    #[serde(default)]
    pub depth: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<Align>,
}

impl BlockMeta {
    pub fn at(order: usize) -> Self {
        Self {
            order,
            ..Self::default()
        }
    }

    /// Copies every field except `order` from `other`.
    pub(crate) fn assign_fields(&mut self, other: &BlockMeta) {
        self.depth = other.depth;
        self.max_depth = other.max_depth;
        self.align = other.align;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default)]
    pub content: InlineTree,
    pub meta: BlockMeta,
}

impl Block {
    pub fn new(id: impl Into<BlockId>, block_type: impl Into<String>, content: InlineTree) -> Self {
        Self {
            id: id.into(),
            block_type: block_type.into(),
            content,
            meta: BlockMeta::default(),
        }
    }

    pub fn paragraph(id: impl Into<BlockId>, text: impl Into<String>) -> Self {
        Self::new(id, "paragraph", InlineTree::paragraph(text))
    }

    pub fn with_meta(mut self, meta: BlockMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn with_depth(mut self, depth: usize) -> Self {
        self.meta.depth = depth;
        self
    }

    pub fn path(&self) -> BlockPath {
        BlockPath(self.meta.order)
    }
}

/// Partial update of a block's type and meta. `order` is not patchable;
/// reordering goes through `move_block`.
///
/// For the nullable fields, `Some(None)` clears the value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockPatch {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub block_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<usize>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub max_depth: Option<Option<usize>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub align: Option<Option<Align>>,
}

impl BlockPatch {
    pub fn depth(depth: usize) -> Self {
        Self {
            depth: Some(depth),
            ..Self::default()
        }
    }

    pub fn align(align: Align) -> Self {
        Self {
            align: Some(Some(align)),
            ..Self::default()
        }
    }

    pub fn block_type(block_type: impl Into<String>) -> Self {
        Self {
            block_type: Some(block_type.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Applies the patch and returns one that restores the touched fields.
    pub(crate) fn apply_to(&self, block: &mut Block) -> BlockPatch {
        let mut prev = BlockPatch::default();
        if let Some(block_type) = &self.block_type {
            prev.block_type = Some(std::mem::replace(&mut block.block_type, block_type.clone()));
        }
        if let Some(depth) = self.depth {
            prev.depth = Some(std::mem::replace(&mut block.meta.depth, depth));
        }
        if let Some(max_depth) = self.max_depth {
            prev.max_depth = Some(std::mem::replace(&mut block.meta.max_depth, max_depth));
        }
        if let Some(align) = self.align {
            prev.align = Some(std::mem::replace(&mut block.meta.align, align));
        }
        prev
    }
}

pub(crate) fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

/// Deep, independent copy of every block keyed by id.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    pub blocks: BTreeMap<BlockId, Block>,
}

impl Document {
    pub fn from_blocks(blocks: impl IntoIterator<Item = Block>) -> Self {
        Self {
            blocks: blocks.into_iter().map(|b| (b.id.clone(), b)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.get(id)
    }

    /// Blocks sorted by `meta.order`.
    pub fn ordered(&self) -> Vec<&Block> {
        let mut blocks: Vec<&Block> = self.blocks.values().collect();
        blocks.sort_by_key(|b| b.meta.order);
        blocks
    }

    pub fn orders(&self) -> Vec<usize> {
        self.ordered().iter().map(|b| b.meta.order).collect()
    }
}
