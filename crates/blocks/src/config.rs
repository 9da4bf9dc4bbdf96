use serde::{Deserialize, Serialize};

use crate::block::Align;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Oldest undo entries are dropped past this many.
    pub max_undo: usize,
    /// Block type created by Enter and for an empty document.
    pub default_block_type: String,
    pub default_align: Align,
    /// Depth cap for block types that declare no max depth of their own.
    pub max_depth: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_undo: 200,
            default_block_type: "paragraph".to_string(),
            default_align: Align::Left,
            max_depth: 8,
        }
    }
}

impl EditorConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: EditorConfig = serde_json::from_str(s)?;
        Ok(config.with_defaults())
    }

    pub(crate) fn with_defaults(mut self) -> Self {
        if self.max_undo == 0 {
            self.max_undo = 200;
        }
        if self.default_block_type.is_empty() {
            self.default_block_type = "paragraph".to_string();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EditorConfig::from_json_str(r#"{"max_depth": 3, "max_undo": 0}"#).unwrap();
        assert_eq!(config.max_depth, 3);
        assert_eq!(config.max_undo, 200);
        assert_eq!(config.default_block_type, "paragraph");
        assert_eq!(config.default_align, Align::Left);
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        let err = EditorConfig::from_json_str("{").unwrap_err();
        assert!(matches!(err, crate::BlockError::Serialization(_)));
    }
}
