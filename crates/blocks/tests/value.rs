use manos_blocks::{
    Block, BlockError, BlockPath, DEFAULT_SCHEMA, Editor, EditorConfig, EditorValue, InlineTree,
    Marks, Node, PluginRegistry,
};
use serde_json::json;

fn load(value: serde_json::Value) -> Result<Editor, BlockError> {
    let value: EditorValue = serde_json::from_value(value)?;
    Editor::from_value(value, PluginRegistry::core(), EditorConfig::default())
}

#[test]
fn value_survives_json_round_trip() -> anyhow::Result<()> {
    let rich = Block::new(
        "B",
        "heading-one",
        InlineTree::new(vec![Node::element(
            "heading-one",
            vec![Node::text("big "), Node::marked("bold", Marks::bold())],
        )]),
    )
    .with_depth(1);
    let divider = Block::new("C", "divider", InlineTree::new(vec![Node::divider()]));
    let editor = Editor::from_blocks([Block::paragraph("A", "plain"), rich, divider])?;

    let json = editor.to_value().to_json_pretty()?;
    let value = EditorValue::from_json_str(&json)?;
    assert_eq!(value.schema, DEFAULT_SCHEMA);
    assert_eq!(value.version, 1);

    let loaded = Editor::from_value(value, PluginRegistry::core(), EditorConfig::default())?;
    assert_eq!(loaded.snapshot(), editor.snapshot());
    assert_eq!(loaded.plain_text(), "plain\nbig bold\n");
    assert!(loaded.inline_editor(&"B".into()).is_ok());
    assert!(loaded.inline_editor(&"C".into()).is_err());
    Ok(())
}

#[test]
fn blocks_are_keyed_by_id_with_type_field() -> anyhow::Result<()> {
    let editor = Editor::from_blocks([Block::paragraph("A", "x")])?;
    let json = serde_json::to_value(editor.to_value())?;

    assert_eq!(json["schema"], DEFAULT_SCHEMA);
    assert_eq!(json["blocks"]["A"]["id"], "A");
    assert_eq!(json["blocks"]["A"]["type"], "paragraph");
    assert_eq!(json["blocks"]["A"]["meta"]["order"], 0);
    Ok(())
}

#[test]
fn schema_and_version_default_when_absent() -> anyhow::Result<()> {
    let editor = load(json!({
        "blocks": {
            "A": { "id": "A", "type": "paragraph", "meta": { "order": 0 } }
        }
    }))?;
    assert_eq!(editor.len(), 1);
    assert_eq!(editor.block_at(BlockPath(0)).unwrap().content, InlineTree::default());
    Ok(())
}

#[test]
fn order_gap_is_rejected() {
    let result = load(json!({
        "blocks": {
            "A": { "id": "A", "type": "paragraph", "meta": { "order": 0 } },
            "B": { "id": "B", "type": "paragraph", "meta": { "order": 2 } }
        }
    }));
    assert_eq!(result.err(), Some(BlockError::InvalidPath { order: 2, len: 2 }));
}

#[test]
fn duplicate_order_is_rejected() {
    let result = load(json!({
        "blocks": {
            "A": { "id": "A", "type": "paragraph", "meta": { "order": 0 } },
            "B": { "id": "B", "type": "paragraph", "meta": { "order": 0 } }
        }
    }));
    assert!(matches!(result, Err(BlockError::InvalidOperation(_))));
}

#[test]
fn key_must_match_block_id() {
    let result = load(json!({
        "blocks": {
            "A": { "id": "Z", "type": "paragraph", "meta": { "order": 0 } }
        }
    }));
    assert!(matches!(result, Err(BlockError::InvalidOperation(_))));
}

#[test]
fn unknown_block_type_is_rejected() {
    let result = load(json!({
        "blocks": {
            "A": { "id": "A", "type": "widget", "meta": { "order": 0 } }
        }
    }));
    assert!(matches!(result, Err(BlockError::InvalidOperation(_))));
}

#[test]
fn newer_version_is_rejected() {
    let result = load(json!({
        "schema": DEFAULT_SCHEMA,
        "version": 2,
        "blocks": {}
    }));
    assert!(matches!(result, Err(BlockError::Serialization(_))));
}

#[test]
fn malformed_json_maps_to_serialization_error() {
    let err = EditorValue::from_json_str("{\"blocks\": [").unwrap_err();
    assert!(matches!(BlockError::from(err), BlockError::Serialization(_)));
}
