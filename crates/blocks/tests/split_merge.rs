use manos_blocks::{
    Block, BlockError, BlockId, BlockMeta, BlockPath, Editor, InlineOp, InlineTree, Marks,
    MergeBlockOptions, Node, Operation, Point, Selection, SplitBlockOptions, Transaction,
};

fn editor_with(blocks: &[(&str, &str)]) -> Editor {
    Editor::from_blocks(blocks.iter().map(|(id, text)| Block::paragraph(*id, *text))).unwrap()
}

fn text_of(editor: &Editor, id: &str) -> String {
    editor.get_block(&BlockId::from(id)).unwrap().content.plain_text()
}

fn split_at(id: &str, offset: usize, new_id: &str) -> SplitBlockOptions {
    SplitBlockOptions {
        id: Some(id.into()),
        point: Some(Point::new(vec![0, 0], offset)),
        new_id: Some(new_id.into()),
        ..SplitBlockOptions::default()
    }
}

#[test]
fn split_then_merge_restores_document() {
    let mut editor = editor_with(&[("A", "hello"), ("B", "x")]);
    let original = editor.snapshot();

    let new_id = editor.split_block(split_at("A", 2, "N")).unwrap();
    assert_eq!(new_id, Some(BlockId::from("N")));
    assert_eq!(text_of(&editor, "A"), "he");
    assert_eq!(text_of(&editor, "N"), "llo");
    assert_eq!(editor.get_block(&"N".into()).unwrap().meta.order, 1);
    assert_eq!(editor.get_block(&"B".into()).unwrap().meta.order, 2);

    editor
        .merge_block(MergeBlockOptions {
            source: Some("N".into()),
            ..MergeBlockOptions::default()
        })
        .unwrap();
    assert_eq!(editor.snapshot(), original);
    assert!(editor.inline_editor(&"N".into()).is_err());

    assert!(editor.undo());
    assert_eq!(text_of(&editor, "N"), "llo");
    assert!(editor.undo());
    assert_eq!(editor.snapshot(), original);
    assert_eq!(
        editor.inline_editor(&"A".into()).unwrap().content(),
        &InlineTree::paragraph("hello")
    );
}

#[test]
fn split_after_inline_edit_in_same_batch_keeps_new_text() {
    let mut editor = editor_with(&[("A", "hello world")]);
    let original = editor.snapshot();
    let source = editor.get_block(&"A".into()).unwrap().clone();
    let (_, tail) = source.content.split_at(&Point::new(vec![0, 0], 5)).unwrap();
    let mut block = Block::new("N", "paragraph", tail);
    block.meta = source.meta.clone();

    let report = editor.apply_transforms(Transaction::new(vec![
        Operation::set_inline("A".into(), vec![InlineOp::insert_text(vec![0, 0], 11, "X")]),
        Operation::SplitBlock {
            id: "A".into(),
            at: Point::new(vec![0, 0], 5),
            meta_before: source.meta.clone(),
            meta_after: source.meta.clone(),
            block,
        },
    ]));
    assert!(report.skipped.is_empty());
    assert_eq!(text_of(&editor, "A"), "hello");
    assert_eq!(text_of(&editor, "N"), " worldX");
    assert_eq!(
        editor.inline_editor(&"N".into()).unwrap().content(),
        &InlineTree::paragraph(" worldX")
    );

    assert!(editor.undo());
    assert_eq!(editor.snapshot(), original);
    assert!(editor.redo());
    assert_eq!(editor.plain_text(), "hello\n worldX");
}

#[test]
fn split_at_caret_focuses_new_block() {
    let mut editor = editor_with(&[("A", "hello")]);
    editor
        .set_inline_selection(
            &"A".into(),
            Selection::collapsed(Point::new(vec![0, 0], 3)),
        )
        .unwrap();

    let new_id = editor
        .split_block(SplitBlockOptions {
            focus: true,
            ..SplitBlockOptions::default()
        })
        .unwrap()
        .unwrap();

    assert_eq!(text_of(&editor, "A"), "hel");
    assert_eq!(
        editor.get_block(&new_id).unwrap().content.plain_text(),
        "lo"
    );
    assert_eq!(editor.path(), Some(BlockPath(1)));
    let (caret_block, caret) = editor.caret().unwrap();
    assert_eq!(caret_block, &new_id);
    assert_eq!(caret.focus, Point::new(vec![0, 0], 0));
}

#[test]
fn split_can_change_new_block_type() {
    let mut editor = editor_with(&[("A", "title body")]);
    let options = SplitBlockOptions {
        block_type: Some("heading-one".to_string()),
        ..split_at("A", 5, "H")
    };
    editor.split_block(options).unwrap();
    assert_eq!(
        editor.get_block(&"H".into()).unwrap().block_type,
        "heading-one"
    );
    assert_eq!(text_of(&editor, "H"), " body");
}

#[test]
fn undo_merge_restores_marks_exactly() {
    let bold = Block::new(
        "B",
        "paragraph",
        InlineTree::new(vec![Node::element(
            "paragraph",
            vec![Node::marked("b", Marks::bold())],
        )]),
    );
    let mut editor = Editor::from_blocks([Block::paragraph("A", "a"), bold]).unwrap();
    let original = editor.snapshot();

    editor
        .merge_block(MergeBlockOptions {
            target: Some("A".into()),
            source: Some("B".into()),
            focus: true,
            ..MergeBlockOptions::default()
        })
        .unwrap();
    assert_eq!(editor.len(), 1);
    assert_eq!(text_of(&editor, "A"), "ab");
    let (_, caret) = editor.caret().unwrap();
    assert_eq!(caret.focus, Point::new(vec![0, 0], 1));

    assert!(editor.undo());
    assert_eq!(editor.snapshot(), original);
    assert!(editor.inline_editor(&"B".into()).is_ok());

    assert!(editor.redo());
    assert_eq!(editor.len(), 1);
    assert_eq!(text_of(&editor, "A"), "ab");
}

#[test]
fn undo_merge_restores_target_meta() {
    let mut editor = editor_with(&[("A", "a"), ("B", "b")]);
    let merged_meta = BlockMeta {
        depth: 2,
        ..BlockMeta::at(0)
    };

    editor
        .merge_block(MergeBlockOptions {
            source: Some("B".into()),
            merged_meta: Some(merged_meta),
            ..MergeBlockOptions::default()
        })
        .unwrap();
    assert_eq!(editor.get_block(&"A".into()).unwrap().meta.depth, 2);

    assert!(editor.undo());
    assert_eq!(editor.get_block(&"A".into()).unwrap().meta.depth, 0);
    assert_eq!(editor.get_block(&"B".into()).unwrap().meta.order, 1);
}

#[test]
fn merge_requires_adjacent_blocks() {
    let mut editor = editor_with(&[("A", "a"), ("B", "b"), ("C", "c")]);
    let err = editor
        .merge_block(MergeBlockOptions {
            target: Some("A".into()),
            source: Some("C".into()),
            ..MergeBlockOptions::default()
        })
        .unwrap_err();
    assert!(matches!(err, BlockError::InvalidOperation(_)));

    let err = editor
        .merge_block(MergeBlockOptions {
            source: Some("A".into()),
            ..MergeBlockOptions::default()
        })
        .unwrap_err();
    assert!(matches!(err, BlockError::InvalidOperation(_)));
    assert_eq!(editor.len(), 3);
    assert!(!editor.can_undo());
}

#[test]
fn split_without_mounted_editor_is_ignored() {
    let divider = Block::new("D", "divider", InlineTree::new(vec![Node::divider()]));
    let mut editor = Editor::from_blocks([divider]).unwrap();

    let result = editor.split_block(SplitBlockOptions {
        id: Some("D".into()),
        ..SplitBlockOptions::default()
    });
    assert_eq!(result, Ok(None));
    assert_eq!(editor.len(), 1);
}

#[test]
fn split_rejects_missing_caret_and_taken_id() {
    let mut editor = editor_with(&[("A", "ab"), ("B", "")]);

    let result = editor.split_block(SplitBlockOptions {
        id: Some("A".into()),
        ..SplitBlockOptions::default()
    });
    assert!(matches!(result, Err(BlockError::InvalidOperation(_))));

    assert_eq!(
        editor.split_block(split_at("A", 1, "B")),
        Err(BlockError::DuplicateId("B".into()))
    );
    assert!(matches!(
        editor.split_block(split_at("A", 9, "N")),
        Err(BlockError::Inline(_))
    ));
    assert_eq!(editor.len(), 2);
}
