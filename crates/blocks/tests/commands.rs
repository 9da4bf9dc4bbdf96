use manos_blocks::{
    Block, BlockId, BlockPath, Editor, EditorConfig, InlineTree, Node, PluginRegistry, Point,
    SelectedBlocks, Selection,
};

fn editor_with(blocks: &[(&str, &str)]) -> Editor {
    Editor::from_blocks(blocks.iter().map(|(id, text)| Block::paragraph(*id, *text))).unwrap()
}

fn put_caret(editor: &mut Editor, id: &str, offset: usize) {
    editor
        .set_inline_selection(
            &BlockId::from(id),
            Selection::collapsed(Point::new(vec![0, 0], offset)),
        )
        .unwrap();
}

fn texts(editor: &Editor) -> Vec<String> {
    editor.blocks().map(|b| b.content.plain_text()).collect()
}

#[test]
fn enter_mid_text_splits_block() {
    let mut editor = editor_with(&[("A", "hello")]);
    put_caret(&mut editor, "A", 2);

    assert!(editor.enter().unwrap());
    assert_eq!(texts(&editor), vec!["he", "llo"]);
    assert_eq!(editor.path(), Some(BlockPath(1)));
    let (caret_block, caret) = editor.caret().unwrap();
    assert_eq!(editor.get_block(caret_block).unwrap().meta.order, 1);
    assert_eq!(caret.focus.offset, 0);

    assert!(editor.undo());
    assert_eq!(texts(&editor), vec!["hello"]);
}

#[test]
fn enter_at_end_inserts_empty_block_after() {
    let mut editor = editor_with(&[("A", "hello"), ("B", "b")]);
    put_caret(&mut editor, "A", 5);

    assert!(editor.enter().unwrap());
    assert_eq!(texts(&editor), vec!["hello", "", "b"]);
    assert_eq!(editor.path(), Some(BlockPath(1)));
    let inserted = editor.block_at(BlockPath(1)).unwrap();
    assert_eq!(inserted.block_type, "paragraph");
    let (caret_block, _) = editor.caret().unwrap();
    assert_eq!(caret_block, &inserted.id);
}

#[test]
fn enter_at_start_inserts_block_before_and_keeps_caret() {
    let mut editor = editor_with(&[("A", "hello")]);
    put_caret(&mut editor, "A", 0);

    assert!(editor.enter().unwrap());
    assert_eq!(texts(&editor), vec!["", "hello"]);
    assert_eq!(editor.path(), Some(BlockPath(1)));
    let (caret_block, caret) = editor.caret().unwrap();
    assert_eq!(caret_block, &BlockId::from("A"));
    assert_eq!(caret.focus.offset, 0);
}

#[test]
fn enter_without_focus_is_unhandled() {
    let mut editor = editor_with(&[("A", "hello")]);
    assert!(!editor.enter().unwrap());
    assert_eq!(editor.len(), 1);
}

#[test]
fn backspace_at_start_merges_into_previous() {
    let mut editor = editor_with(&[("A", "a"), ("B", "b")]);
    put_caret(&mut editor, "B", 0);

    assert!(editor.backspace().unwrap());
    assert_eq!(texts(&editor), vec!["ab"]);
    assert_eq!(editor.path(), Some(BlockPath(0)));
    let (caret_block, caret) = editor.caret().unwrap();
    assert_eq!(caret_block, &BlockId::from("A"));
    assert_eq!(caret.focus, Point::new(vec![0, 0], 1));
}

#[test]
fn backspace_in_empty_block_deletes_it() {
    let mut editor = editor_with(&[("A", "a"), ("B", "")]);
    put_caret(&mut editor, "B", 0);

    assert!(editor.backspace().unwrap());
    assert_eq!(texts(&editor), vec!["a"]);
    assert_eq!(editor.path(), Some(BlockPath(0)));
    let (caret_block, caret) = editor.caret().unwrap();
    assert_eq!(caret_block, &BlockId::from("A"));
    assert_eq!(caret.focus.offset, 1);
}

#[test]
fn backspace_after_void_removes_the_void() {
    let divider = Block::new("D", "divider", InlineTree::new(vec![Node::divider()]));
    let mut editor =
        Editor::from_blocks([Block::paragraph("A", "a"), divider, Block::paragraph("B", "b")])
            .unwrap();
    put_caret(&mut editor, "B", 0);

    assert!(editor.backspace().unwrap());
    let ids: Vec<&str> = editor.blocks().map(|b| b.id.as_str()).collect();
    assert_eq!(ids, vec!["A", "B"]);
    assert_eq!(editor.path(), Some(BlockPath(1)));
}

#[test]
fn backspace_after_empty_block_removes_it_without_merging() {
    let heading = Block::new("H", "heading-one", InlineTree::empty_element("heading-one"));
    let mut editor = Editor::from_blocks([heading, Block::paragraph("P", "abc")]).unwrap();
    put_caret(&mut editor, "P", 0);

    assert!(editor.backspace().unwrap());
    let remaining: Vec<(&str, &str)> = editor
        .blocks()
        .map(|b| (b.id.as_str(), b.block_type.as_str()))
        .collect();
    assert_eq!(remaining, vec![("P", "paragraph")]);
    assert_eq!(texts(&editor), vec!["abc"]);
    assert_eq!(editor.path(), Some(BlockPath(0)));
    let (caret_block, caret) = editor.caret().unwrap();
    assert_eq!(caret_block, &BlockId::from("P"));
    assert_eq!(caret.focus, Point::new(vec![0, 0], 0));

    assert!(editor.undo());
    assert_eq!(editor.len(), 2);
    assert_eq!(editor.block_at(BlockPath(0)).unwrap().block_type, "heading-one");
}

#[test]
fn default_editor_starts_with_focused_paragraph() {
    let editor = Editor::with_core_plugins();
    assert_eq!(editor.len(), 1);
    assert_eq!(editor.path(), Some(BlockPath(0)));
    let block = editor.block_at(BlockPath(0)).unwrap();
    assert_eq!(block.block_type, "paragraph");
    assert!(editor.inline_editor(&block.id).is_ok());
    assert!(!editor.can_undo());
}

#[test]
fn backspace_is_unhandled_mid_text_and_in_first_block() {
    let mut editor = editor_with(&[("A", "a"), ("B", "bc")]);

    put_caret(&mut editor, "B", 1);
    assert!(!editor.backspace().unwrap());

    put_caret(&mut editor, "A", 0);
    assert!(!editor.backspace().unwrap());
    assert_eq!(texts(&editor), vec!["a", "bc"]);
    assert!(!editor.can_undo());
}

#[test]
fn tab_and_shift_tab_change_depth() {
    let mut editor = editor_with(&[("A", "a")]);
    assert!(!editor.tab().unwrap());

    put_caret(&mut editor, "A", 0);
    assert!(editor.tab().unwrap());
    assert!(editor.tab().unwrap());
    assert_eq!(editor.get_block(&"A".into()).unwrap().meta.depth, 2);

    assert!(editor.shift_tab().unwrap());
    assert!(editor.shift_tab().unwrap());
    assert!(!editor.shift_tab().unwrap());
    assert_eq!(editor.get_block(&"A".into()).unwrap().meta.depth, 0);
}

#[test]
fn tab_stops_at_configured_depth() {
    let config = EditorConfig {
        max_depth: 1,
        ..EditorConfig::default()
    };
    let mut editor = Editor::from_document(
        editor_with(&[("A", "a")]).snapshot(),
        PluginRegistry::core(),
        config,
    )
    .unwrap();
    put_caret(&mut editor, "A", 0);

    assert!(editor.tab().unwrap());
    assert!(!editor.tab().unwrap());
}

#[test]
fn select_all_escalates_from_text_to_blocks() {
    let mut editor = editor_with(&[("A", "hello"), ("B", "b")]);
    put_caret(&mut editor, "A", 1);

    assert!(editor.select_all().unwrap());
    let (_, selection) = editor.caret().unwrap();
    assert_eq!(
        selection,
        &Selection {
            anchor: Point::new(vec![0, 0], 0),
            focus: Point::new(vec![0, 0], 5),
        }
    );
    assert_eq!(editor.selected_blocks(), None);

    assert!(editor.select_all().unwrap());
    assert_eq!(editor.selected_blocks(), Some(&SelectedBlocks::All));
    assert!(editor.caret().is_none());

    assert!(editor.select_all().unwrap());
    assert_eq!(editor.selected_blocks(), Some(&SelectedBlocks::All));
}

#[test]
fn select_all_in_empty_block_selects_every_block() {
    let mut editor = editor_with(&[("A", ""), ("B", "b")]);
    put_caret(&mut editor, "A", 0);

    assert!(editor.select_all().unwrap());
    assert_eq!(editor.selected_blocks(), Some(&SelectedBlocks::All));

    let mut empty = Editor::new(PluginRegistry::core(), EditorConfig::default());
    assert!(!empty.select_all().unwrap());
}
