use crate::error::InlineError;
use crate::ops::InlineOp;
use crate::tree::{
    InlineTree, Node, Point, Selection, node_mut, patch_apply, siblings_mut, text_mut,
};

/// Capability a block type supplies for its inline content.
///
/// An instance owns one block's tree and caret. `apply` returns the op as it
/// was actually applied, with any `prev` data resolved from the tree.
pub trait InlineEditor: Send {
    fn content(&self) -> &InlineTree;

    /// Replaces the whole tree. The selection is dropped if it no longer
    /// points at a text leaf.
    fn set_content(&mut self, content: InlineTree);

    fn apply(&mut self, op: InlineOp) -> Result<InlineOp, InlineError>;

    fn inverse(&self, op: &InlineOp) -> InlineOp {
        op.inverse()
    }

    fn selection(&self) -> Option<&Selection>;

    fn set_selection(&mut self, selection: Option<Selection>);

    fn string_at(&self, path: &[usize]) -> Result<String, InlineError> {
        self.content().string_at(path)
    }

    fn plain_text(&self) -> String {
        self.content().plain_text()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RichTextEditor {
    content: InlineTree,
    selection: Option<Selection>,
}

impl RichTextEditor {
    pub fn new(content: InlineTree) -> Self {
        Self {
            content,
            selection: None,
        }
    }
}

impl InlineEditor for RichTextEditor {
    fn content(&self) -> &InlineTree {
        &self.content
    }

    fn set_content(&mut self, content: InlineTree) {
        self.content = content;
        let still_valid = self.selection.as_ref().is_none_or(|s| {
            self.content.is_valid_point(&s.anchor) && self.content.is_valid_point(&s.focus)
        });
        if !still_valid {
            self.selection = None;
        }
    }

    fn apply(&mut self, op: InlineOp) -> Result<InlineOp, InlineError> {
        apply_op_to(&mut self.content, &mut self.selection, op)
    }

    fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    fn set_selection(&mut self, selection: Option<Selection>) {
        self.selection = selection.filter(|s| {
            self.content.is_valid_point(&s.anchor) && self.content.is_valid_point(&s.focus)
        });
    }
}

fn apply_op_to(
    tree: &mut InlineTree,
    selection: &mut Option<Selection>,
    op: InlineOp,
) -> Result<InlineOp, InlineError> {
    match op {
        InlineOp::InsertText { path, offset, text } => {
            let leaf = text_mut(&mut tree.children, &path)?;
            if offset > leaf.text.len() {
                return Err(InlineError::out_of_bounds(&path, offset, leaf.text.len()));
            }
            if !leaf.text.is_char_boundary(offset) {
                return Err(InlineError::invalid_path(&path, "offset is not a char boundary"));
            }
            leaf.text.insert_str(offset, &text);
            if let Some(selection) = selection {
                transform_selection_insert_text(selection, &path, offset, text.len());
            }
            Ok(InlineOp::InsertText { path, offset, text })
        }
        InlineOp::RemoveText { path, offset, text } => {
            let leaf = text_mut(&mut tree.children, &path)?;
            let end = offset
                .checked_add(text.len())
                .ok_or_else(|| InlineError::out_of_bounds(&path, offset, leaf.text.len()))?;
            if leaf.text.get(offset..end) != Some(text.as_str()) {
                return Err(InlineError::mismatch(
                    &path,
                    format!("expected {text:?} at {offset}"),
                ));
            }
            leaf.text.replace_range(offset..end, "");
            if let Some(selection) = selection {
                transform_selection_remove_text(selection, &path, offset..end);
            }
            Ok(InlineOp::RemoveText { path, offset, text })
        }
        InlineOp::InsertNode { path, node } => {
            let (children, index) = siblings_mut(tree, &path)?;
            if index > children.len() {
                return Err(InlineError::out_of_bounds(&path, index, children.len()));
            }
            children.insert(index, node.clone());
            if let Some(selection) = selection {
                transform_selection_insert_node(selection, &path);
            }
            Ok(InlineOp::InsertNode { path, node })
        }
        InlineOp::RemoveNode { path, node } => {
            let (children, index) = siblings_mut(tree, &path)?;
            if index >= children.len() {
                return Err(InlineError::out_of_bounds(&path, index, children.len()));
            }
            if children[index] != node {
                return Err(InlineError::mismatch(&path, "node differs from tree"));
            }
            children.remove(index);
            let keep = match selection.as_mut() {
                Some(current) => transform_selection_remove_node(current, &path, tree),
                None => true,
            };
            if !keep {
                *selection = None;
            }
            Ok(InlineOp::RemoveNode { path, node })
        }
        InlineOp::SetNodeAttrs { path, patch, .. } => {
            let prev = match node_mut(&mut tree.children, &path)? {
                Node::Element(el) => patch_apply(&mut el.attrs, &patch),
                Node::Void(v) => patch_apply(&mut v.attrs, &patch),
                Node::Text(_) => return Err(InlineError::invalid_path(&path, "text has no attrs")),
            };
            Ok(InlineOp::SetNodeAttrs { path, patch, prev })
        }
        InlineOp::SetTextMarks { path, marks, .. } => {
            let leaf = text_mut(&mut tree.children, &path)?;
            let prev = std::mem::replace(&mut leaf.marks, marks.clone());
            Ok(InlineOp::SetTextMarks { path, marks, prev })
        }
    }
}

fn transform_selection_insert_text(
    selection: &mut Selection,
    path: &[usize],
    offset: usize,
    len: usize,
) {
    for point in [&mut selection.anchor, &mut selection.focus] {
        if point.path == path && point.offset >= offset {
            point.offset = point.offset.saturating_add(len);
        }
    }
}

fn transform_selection_remove_text(
    selection: &mut Selection,
    path: &[usize],
    range: std::ops::Range<usize>,
) {
    let removed_len = range.end.saturating_sub(range.start);
    for point in [&mut selection.anchor, &mut selection.focus] {
        if point.path != path || point.offset <= range.start {
            continue;
        }
        if point.offset >= range.end {
            point.offset = point.offset.saturating_sub(removed_len);
        } else {
            point.offset = range.start;
        }
    }
}

fn transform_selection_insert_node(selection: &mut Selection, path: &[usize]) {
    let Some((&index, parent_path)) = path.split_last() else {
        return;
    };
    let depth = parent_path.len();

    for point in [&mut selection.anchor, &mut selection.focus] {
        if point.path.len() <= depth || !point.path.starts_with(parent_path) {
            continue;
        }
        if point.path[depth] >= index {
            point.path[depth] += 1;
        }
    }
}

/// Returns false when a point fell inside the removed subtree and no text
/// leaf remains to move it to.
fn transform_selection_remove_node(
    selection: &mut Selection,
    path: &[usize],
    tree_after_remove: &InlineTree,
) -> bool {
    let Some((&index, parent_path)) = path.split_last() else {
        return true;
    };
    let depth = parent_path.len();

    for point in [&mut selection.anchor, &mut selection.focus] {
        if point.path.len() <= depth || !point.path.starts_with(parent_path) {
            continue;
        }
        let ix = point.path[depth];
        if ix > index {
            point.path[depth] = ix - 1;
            continue;
        }
        if ix < index {
            continue;
        }

        // Inside the removed subtree: land on the nearest text leaf before it.
        let Some(relocated) = nearest_point_before(tree_after_remove, parent_path, index) else {
            return false;
        };
        *point = relocated;
    }
    true
}

fn nearest_point_before(tree: &InlineTree, parent_path: &[usize], index: usize) -> Option<Point> {
    let mut prefix = tree.clone();
    let at = Point::new(parent_path.to_vec(), index);
    if let Ok((head, _)) = prefix.split_at(&at) {
        prefix = head;
    }
    prefix
        .last_text_point()
        .filter(|p| tree.is_valid_point(p))
        .or_else(|| tree.first_text_point())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor(text: &str) -> RichTextEditor {
        let mut editor = RichTextEditor::new(InlineTree::paragraph(text));
        editor.set_selection(Some(Selection::collapsed(Point::new(vec![0, 0], 0))));
        editor
    }

    #[test]
    fn insert_text_moves_caret_after_insertion() {
        let mut editor = editor("");
        editor
            .apply(InlineOp::insert_text(vec![0, 0], 0, "ab"))
            .unwrap();
        assert_eq!(editor.plain_text(), "ab");
        assert_eq!(editor.selection().unwrap().focus.offset, 2);
    }

    #[test]
    fn remove_text_rejects_mismatched_payload() {
        let mut editor = editor("hello");
        let err = editor
            .apply(InlineOp::RemoveText {
                path: vec![0, 0],
                offset: 1,
                text: "xx".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, InlineError::Mismatch { .. }));
        assert_eq!(editor.plain_text(), "hello");
    }

    #[test]
    fn remove_text_rejects_offset_past_usize() {
        let mut editor = editor("hello");
        let err = editor
            .apply(InlineOp::RemoveText {
                path: vec![0, 0],
                offset: usize::MAX,
                text: "a".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, InlineError::OutOfBounds { len: 5, .. }));
        assert_eq!(editor.plain_text(), "hello");
        assert_eq!(editor.selection().unwrap().focus.offset, 0);
    }

    #[test]
    fn set_marks_resolves_previous_marks() {
        let mut editor = editor("a");
        let applied = editor
            .apply(InlineOp::set_text_marks(vec![0, 0], crate::Marks::bold()))
            .unwrap();
        let InlineOp::SetTextMarks { prev, .. } = &applied else {
            panic!("unexpected op {applied:?}");
        };
        assert_eq!(prev, &crate::Marks::default());

        editor.apply(applied.inverse()).unwrap();
        assert_eq!(editor.content(), &InlineTree::paragraph("a"));
    }
}
