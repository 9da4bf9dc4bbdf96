use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::InlineError;
use crate::ops::Path;

pub type Attrs = BTreeMap<String, serde_json::Value>;
pub type ElementKind = String;

/// The rich-text content owned by a single block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct InlineTree {
    #[serde(default)]
    pub children: Vec<Node>,
}

impl InlineTree {
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }

    /// A single element of `kind` holding one empty text leaf.
    pub fn empty_element(kind: impl Into<String>) -> Self {
        Self {
            children: vec![Node::element(kind, vec![Node::text("")])],
        }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self {
            children: vec![Node::paragraph(text)],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.plain_text().is_empty()
    }

    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    pub fn text_len(&self) -> usize {
        text_len(&self.children)
    }

    /// Text of the node at `path`; the empty path addresses the whole tree.
    pub fn string_at(&self, path: &[usize]) -> Result<String, InlineError> {
        if path.is_empty() {
            return Ok(self.plain_text());
        }
        let node = node_ref(&self.children, path)?;
        let mut out = String::new();
        collect_text(std::slice::from_ref(node), &mut out);
        Ok(out)
    }

    pub fn node(&self, path: &[usize]) -> Result<&Node, InlineError> {
        node_ref(&self.children, path)
    }

    /// Whether `point` addresses an existing text leaf at a valid char boundary.
    pub fn is_valid_point(&self, point: &Point) -> bool {
        match node_ref(&self.children, &point.path) {
            Ok(Node::Text(t)) => point.offset <= t.text.len() && t.text.is_char_boundary(point.offset),
            _ => false,
        }
    }
}

fn collect_text(children: &[Node], out: &mut String) {
    for node in children {
        match node {
            Node::Text(t) => out.push_str(&t.text),
            Node::Element(el) => collect_text(&el.children, out),
            Node::Void(v) => out.push_str(&v.inline_text()),
        }
    }
}

fn text_len(children: &[Node]) -> usize {
    children
        .iter()
        .map(|node| match node {
            Node::Text(t) => t.text.len(),
            Node::Element(el) => text_len(&el.children),
            Node::Void(v) => v.inline_text_len(),
        })
        .sum()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Node {
    Element(ElementNode),
    Text(TextNode),
    Void(VoidNode),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(TextNode {
            text: text.into(),
            marks: Marks::default(),
        })
    }

    pub fn marked(text: impl Into<String>, marks: Marks) -> Self {
        Node::Text(TextNode {
            text: text.into(),
            marks,
        })
    }

    pub fn element(kind: impl Into<String>, children: Vec<Node>) -> Self {
        Node::Element(ElementNode {
            kind: kind.into(),
            attrs: Attrs::default(),
            children,
        })
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Node::element("paragraph", vec![Node::text(text)])
    }

    pub fn void(kind: impl Into<String>) -> Self {
        Node::Void(VoidNode {
            kind: kind.into(),
            attrs: Attrs::default(),
        })
    }

    pub fn divider() -> Self {
        Node::void("divider")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementNode {
    pub kind: ElementKind,
    #[serde(default)]
    pub attrs: Attrs,
    #[serde(default)]
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoidNode {
    pub kind: ElementKind,
    #[serde(default)]
    pub attrs: Attrs,
}

impl VoidNode {
    pub fn inline_text(&self) -> String {
        match self.kind.as_str() {
            "mention" => {
                let label = self.mention_label();
                if label.starts_with('@') {
                    label.to_string()
                } else {
                    format!("@{label}")
                }
            }
            _ => String::new(),
        }
    }

    pub fn inline_text_len(&self) -> usize {
        match self.kind.as_str() {
            "mention" => {
                let label = self.mention_label();
                label.len() + (!label.starts_with('@') as usize)
            }
            _ => 0,
        }
    }

    fn mention_label(&self) -> &str {
        self.attrs
            .get("label")
            .and_then(|v| v.as_str())
            .unwrap_or("mention")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextNode {
    pub text: String,
    #[serde(default)]
    pub marks: Marks,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Marks {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub strikethrough: bool,
    #[serde(default)]
    pub code: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl Marks {
    pub fn bold() -> Self {
        Self {
            bold: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    #[serde(default)]
    pub path: Path,
    pub offset: usize,
}

impl Point {
    pub fn new(path: Path, offset: usize) -> Self {
        Self { path, offset }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: Point,
    pub focus: Point,
}

impl Selection {
    pub fn collapsed(point: Point) -> Self {
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttrPatch {
    #[serde(default)]
    pub set: Attrs,
    #[serde(default)]
    pub remove: Vec<String>,
}

impl AttrPatch {
    pub fn set(key: impl Into<String>, value: serde_json::Value) -> Self {
        let mut set = Attrs::new();
        set.insert(key.into(), value);
        Self {
            set,
            remove: Vec::new(),
        }
    }
}

/// Applies `patch` and returns the patch that restores the previous attrs.
pub(crate) fn patch_apply(attrs: &mut Attrs, patch: &AttrPatch) -> AttrPatch {
    let mut old_set: Attrs = Attrs::new();
    let mut old_remove: Vec<String> = Vec::new();

    for (k, v) in &patch.set {
        if let Some(prev) = attrs.insert(k.clone(), v.clone()) {
            old_set.insert(k.clone(), prev);
        } else {
            old_remove.push(k.clone());
        }
    }

    for key in &patch.remove {
        if let Some(prev) = attrs.remove(key) {
            old_set.insert(key.clone(), prev);
        }
    }

    AttrPatch {
        set: old_set,
        remove: old_remove,
    }
}

pub(crate) fn node_ref<'a>(children: &'a [Node], path: &[usize]) -> Result<&'a Node, InlineError> {
    let Some((&first, rest)) = path.split_first() else {
        return Err(InlineError::invalid_path(path, "empty path"));
    };
    let node = children
        .get(first)
        .ok_or_else(|| InlineError::out_of_bounds(path, first, children.len()))?;
    if rest.is_empty() {
        return Ok(node);
    }
    match node {
        Node::Element(el) => node_ref(&el.children, rest),
        Node::Void(_) | Node::Text(_) => Err(InlineError::invalid_path(path, "non-container node")),
    }
}

pub(crate) fn node_mut<'a>(
    children: &'a mut [Node],
    path: &[usize],
) -> Result<&'a mut Node, InlineError> {
    let Some((&first, rest)) = path.split_first() else {
        return Err(InlineError::invalid_path(path, "empty path"));
    };
    let len = children.len();
    let node = children
        .get_mut(first)
        .ok_or_else(|| InlineError::out_of_bounds(path, first, len))?;
    if rest.is_empty() {
        return Ok(node);
    }
    match node {
        Node::Element(el) => node_mut(&mut el.children, rest),
        Node::Void(_) | Node::Text(_) => Err(InlineError::invalid_path(path, "non-container node")),
    }
}

pub(crate) fn text_mut<'a>(
    children: &'a mut [Node],
    path: &[usize],
) -> Result<&'a mut TextNode, InlineError> {
    match node_mut(children, path)? {
        Node::Text(t) => Ok(t),
        _ => Err(InlineError::invalid_path(path, "expected text node")),
    }
}

/// Children of the parent of `path`, plus the last index of `path`.
pub(crate) fn siblings_mut<'a>(
    tree: &'a mut InlineTree,
    path: &[usize],
) -> Result<(&'a mut Vec<Node>, usize), InlineError> {
    let Some((&index, parent_path)) = path.split_last() else {
        return Err(InlineError::invalid_path(path, "empty path"));
    };
    if parent_path.is_empty() {
        return Ok((&mut tree.children, index));
    }
    match node_mut(&mut tree.children, parent_path)? {
        Node::Element(el) => Ok((&mut el.children, index)),
        Node::Void(_) | Node::Text(_) => Err(InlineError::invalid_path(path, "parent is not a container")),
    }
}
