use crate::error::InlineError;
use crate::tree::{ElementNode, InlineTree, Node, Point, TextNode};

impl InlineTree {
    /// Splits the tree at `at` into a head and a tail.
    ///
    /// A point on a text leaf splits the leaf at its byte offset. A point on
    /// an element (or the empty path for the root) splits its children at
    /// `offset`. A void goes to the tail at offset 0 and to the head
    /// otherwise. Every element on the path is duplicated into both halves.
    pub fn split_at(&self, at: &Point) -> Result<(InlineTree, InlineTree), InlineError> {
        let (head, tail) = split_children(&self.children, &at.path, at.offset, &at.path)?;
        Ok((InlineTree::new(head), InlineTree::new(tail)))
    }

    /// Appends `tail` to the end of this tree, fusing the trailing element
    /// chain of `self` with the leading element chain of `tail`.
    ///
    /// `split_at(&a.end_point())` on `a.join(b)` yields `a` as the head.
    pub fn join(self, tail: InlineTree) -> InlineTree {
        InlineTree::new(join_children(self.children, tail.children))
    }

    pub fn start_point(&self) -> Point {
        let mut path = Vec::new();
        let offset = walk_start(&self.children, &mut path);
        Point::new(path, offset)
    }

    pub fn end_point(&self) -> Point {
        let mut path = Vec::new();
        let offset = walk_end(&self.children, &mut path);
        Point::new(path, offset)
    }

    /// Text offset of `point` from the start of the tree.
    pub fn offset_of(&self, point: &Point) -> Result<usize, InlineError> {
        let (head, _) = self.split_at(point)?;
        Ok(head.text_len())
    }

    pub fn is_start(&self, point: &Point) -> bool {
        self.offset_of(point).is_ok_and(|offset| offset == 0)
    }

    pub fn is_end(&self, point: &Point) -> bool {
        self.offset_of(point)
            .is_ok_and(|offset| offset == self.text_len())
    }

    /// Point on a text leaf at text offset `offset`, clamped to the end.
    ///
    /// Returns `None` when the tree holds no text leaf.
    pub fn point_at_offset(&self, offset: usize) -> Option<Point> {
        let mut remaining = offset;
        let mut last = None;
        let mut path = Vec::new();
        if let Some(point) = walk_offset(&self.children, &mut path, &mut remaining, &mut last) {
            return Some(point);
        }
        last
    }

    /// First text point, if the tree has any text leaf.
    pub fn first_text_point(&self) -> Option<Point> {
        self.point_at_offset(0)
    }

    /// Last text point, if the tree has any text leaf.
    pub fn last_text_point(&self) -> Option<Point> {
        self.point_at_offset(usize::MAX)
    }

    /// Text and void leaves in document order, with empty text dropped and
    /// neighbouring leaves of equal marks fused.
    ///
    /// Two trees with the same leaves differ only in element structure.
    pub fn leaves(&self) -> Vec<Node> {
        let mut out = Vec::new();
        collect_leaves(&self.children, &mut out);
        out
    }
}

fn collect_leaves(children: &[Node], out: &mut Vec<Node>) {
    for node in children {
        match node {
            Node::Element(el) => collect_leaves(&el.children, out),
            Node::Text(t) if t.text.is_empty() => {}
            Node::Text(t) => match out.last_mut() {
                Some(Node::Text(last)) if last.marks == t.marks => last.text.push_str(&t.text),
                _ => out.push(node.clone()),
            },
            Node::Void(_) => out.push(node.clone()),
        }
    }
}

fn split_children(
    children: &[Node],
    path: &[usize],
    offset: usize,
    full_path: &[usize],
) -> Result<(Vec<Node>, Vec<Node>), InlineError> {
    let Some((&ix, rest)) = path.split_first() else {
        if offset > children.len() {
            return Err(InlineError::out_of_bounds(full_path, offset, children.len()));
        }
        return Ok((children[..offset].to_vec(), children[offset..].to_vec()));
    };

    let node = children
        .get(ix)
        .ok_or_else(|| InlineError::out_of_bounds(full_path, ix, children.len()))?;

    let mut head = children[..ix].to_vec();
    let mut tail = Vec::new();

    match node {
        Node::Element(el) => {
            let (left, right) = split_children(&el.children, rest, offset, full_path)?;
            head.push(Node::Element(ElementNode {
                kind: el.kind.clone(),
                attrs: el.attrs.clone(),
                children: left,
            }));
            tail.push(Node::Element(ElementNode {
                kind: el.kind.clone(),
                attrs: el.attrs.clone(),
                children: right,
            }));
        }
        Node::Text(t) => {
            if !rest.is_empty() {
                return Err(InlineError::invalid_path(full_path, "path descends into text"));
            }
            if offset > t.text.len() {
                return Err(InlineError::out_of_bounds(full_path, offset, t.text.len()));
            }
            if !t.text.is_char_boundary(offset) {
                return Err(InlineError::invalid_path(full_path, "offset is not a char boundary"));
            }
            head.push(Node::Text(TextNode {
                text: t.text[..offset].to_string(),
                marks: t.marks.clone(),
            }));
            tail.push(Node::Text(TextNode {
                text: t.text[offset..].to_string(),
                marks: t.marks.clone(),
            }));
        }
        Node::Void(_) => {
            if !rest.is_empty() {
                return Err(InlineError::invalid_path(full_path, "path descends into void"));
            }
            if offset == 0 {
                tail.push(node.clone());
            } else {
                head.push(node.clone());
            }
        }
    }

    tail.extend_from_slice(&children[ix + 1..]);
    Ok((head, tail))
}

fn join_children(mut left: Vec<Node>, right: Vec<Node>) -> Vec<Node> {
    let mut right = right.into_iter();
    let Some(first) = right.next() else {
        return left;
    };

    match (left.pop(), first) {
        (Some(Node::Element(mut l)), Node::Element(r)) => {
            l.children = join_children(l.children, r.children);
            left.push(Node::Element(l));
        }
        (Some(Node::Text(mut l)), Node::Text(r)) if l.marks == r.marks => {
            l.text.push_str(&r.text);
            left.push(Node::Text(l));
        }
        (Some(last), first) => {
            left.push(last);
            left.push(first);
        }
        (None, first) => left.push(first),
    }

    left.extend(right);
    left
}

fn walk_start(children: &[Node], path: &mut Vec<usize>) -> usize {
    match children.first() {
        Some(Node::Text(_)) => {
            path.push(0);
            0
        }
        Some(Node::Element(el)) => {
            path.push(0);
            walk_start(&el.children, path)
        }
        Some(Node::Void(_)) | None => 0,
    }
}

fn walk_end(children: &[Node], path: &mut Vec<usize>) -> usize {
    match children.last() {
        Some(Node::Text(t)) => {
            path.push(children.len() - 1);
            t.text.len()
        }
        Some(Node::Element(el)) => {
            path.push(children.len() - 1);
            walk_end(&el.children, path)
        }
        Some(Node::Void(_)) => children.len(),
        None => 0,
    }
}

fn walk_offset(
    children: &[Node],
    path: &mut Vec<usize>,
    remaining: &mut usize,
    last: &mut Option<Point>,
) -> Option<Point> {
    for (ix, node) in children.iter().enumerate() {
        path.push(ix);
        match node {
            Node::Text(t) => {
                if *remaining <= t.text.len() {
                    let mut offset = *remaining;
                    while offset > 0 && !t.text.is_char_boundary(offset) {
                        offset -= 1;
                    }
                    return Some(Point::new(path.clone(), offset));
                }
                *remaining -= t.text.len();
                *last = Some(Point::new(path.clone(), t.text.len()));
            }
            Node::Element(el) => {
                if let Some(point) = walk_offset(&el.children, path, remaining, last) {
                    return Some(point);
                }
            }
            Node::Void(v) => {
                *remaining = remaining.saturating_sub(v.inline_text_len());
            }
        }
        path.pop();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Marks;

    #[test]
    fn split_paragraph_mid_text() {
        let tree = InlineTree::paragraph("hello");
        let (head, tail) = tree.split_at(&Point::new(vec![0, 0], 2)).unwrap();
        assert_eq!(head, InlineTree::paragraph("he"));
        assert_eq!(tail, InlineTree::paragraph("llo"));
        assert_eq!(head.join(tail), tree);
    }

    #[test]
    fn join_keeps_head_recoverable_at_end_point() {
        let head = InlineTree::new(vec![Node::element(
            "paragraph",
            vec![Node::text("a"), Node::divider()],
        )]);
        let tail = InlineTree::new(vec![Node::element(
            "paragraph",
            vec![Node::marked("b", Marks::bold())],
        )]);

        let boundary = head.end_point();
        let joined = head.clone().join(tail);
        let (recovered, _) = joined.split_at(&boundary).unwrap();
        assert_eq!(recovered, head);
    }

    #[test]
    fn leaves_ignore_empty_text_and_element_kind() {
        let joined = InlineTree::paragraph("a").join(InlineTree::new(vec![Node::element(
            "heading-one",
            vec![Node::marked("b", Marks::bold())],
        )]));
        let (_, tail) = joined.split_at(&Point::new(vec![0, 0], 1)).unwrap();
        let source = InlineTree::new(vec![Node::element(
            "heading-one",
            vec![Node::marked("b", Marks::bold())],
        )]);
        assert_ne!(tail, source);
        assert_eq!(tail.leaves(), source.leaves());

        let split_text = InlineTree::new(vec![Node::element(
            "paragraph",
            vec![Node::text("ab"), Node::text(""), Node::text("c")],
        )]);
        assert_eq!(split_text.leaves(), vec![Node::text("abc")]);
        assert_ne!(split_text.leaves(), InlineTree::paragraph("ab").leaves());
    }

    #[test]
    fn point_at_offset_clamps_to_last_leaf() {
        let tree = InlineTree::new(vec![Node::element(
            "paragraph",
            vec![Node::text("ab"), Node::marked("cd", Marks::bold())],
        )]);
        assert_eq!(tree.point_at_offset(3), Some(Point::new(vec![0, 1], 1)));
        assert_eq!(tree.point_at_offset(99), Some(Point::new(vec![0, 1], 2)));
        assert_eq!(tree.start_point(), Point::new(vec![0, 0], 0));
        assert_eq!(tree.end_point(), Point::new(vec![0, 1], 2));
    }

    #[test]
    fn boundaries_use_text_offsets() {
        let tree = InlineTree::paragraph("xyz");
        assert!(tree.is_start(&Point::new(vec![0, 0], 0)));
        assert!(tree.is_end(&Point::new(vec![0, 0], 3)));
        assert!(!tree.is_end(&Point::new(vec![0, 0], 1)));
    }
}
