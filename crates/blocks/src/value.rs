use serde::{Deserialize, Serialize};

use crate::block::Document;

pub const DEFAULT_SCHEMA: &str = "manos-blocks";
pub const DEFAULT_VERSION: u32 = 1;

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

fn default_version() -> u32 {
    DEFAULT_VERSION
}

/// At-rest form of a document: block id to block, with a schema tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorValue {
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default = "default_version")]
    pub version: u32,
    pub blocks: Document,
}

impl EditorValue {
    pub fn from_document(blocks: Document) -> Self {
        Self {
            schema: default_schema(),
            version: default_version(),
            blocks,
        }
    }

    pub fn into_document(self) -> Document {
        self.blocks
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
