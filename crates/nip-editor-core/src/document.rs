//! Rich-text document tree.
//!
//! The document is an owned arena of nodes linked by parent/child handles.
//! It is the single source of truth for a field's content; markup is only a
//! projection of it (see [`crate::markup`]).

use std::collections::HashMap;

use slotmap::{SlotMap, new_key_type};

use crate::types::{StyleKind, TextRange};

new_key_type! {
    /// Handle to a node inside a [`Document`].
    pub struct NodeId;
}

/// What a node is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// The document root. Exactly one per document.
    Root,
    /// A run of text.
    Text(String),
    /// An inline formatting span.
    Span(StyleKind),
    /// A hard line break (`<br>`). Contributes no text.
    LineBreak,
}

impl NodeKind {
    pub fn is_container(&self) -> bool {
        matches!(self, NodeKind::Root | NodeKind::Span(_))
    }
}

#[derive(Clone, Debug)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
        }
    }
}

/// A tree mutation that could not be carried out.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StructureError {
    #[error("node does not exist in this document")]
    UnknownNode,
    #[error("node cannot hold children")]
    NotAContainer,
    #[error("node is not a text run")]
    NotText,
    #[error("node is not attached to a parent")]
    Detached,
    #[error("the document root cannot be moved or removed")]
    RootImmutable,
    #[error("inserting the node would make it its own ancestor")]
    WouldCycle,
    #[error("index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// A span of the same kind that a new span swallowed when it was created.
///
/// `range` is relative to the start of the swallowing span's text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Absorbed {
    pub range: TextRange,
    pub span: NodeId,
}

/// An ordered tree of text runs, formatting spans and line breaks.
#[derive(Clone, Debug)]
pub struct Document {
    nodes: SlotMap<NodeId, Node>,
    root: NodeId,
    /// Right half of a split -> the node it was split from.
    split_from: HashMap<NodeId, NodeId>,
    absorbed: HashMap<NodeId, Vec<Absorbed>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document (a root with no children).
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::new(NodeKind::Root));
        Self {
            nodes,
            root,
            split_from: HashMap::new(),
            absorbed: HashMap::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// True when the root has no children at all.
    pub fn is_empty(&self) -> bool {
        self.children(self.root).is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id).map(|n| &n.kind)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    /// Children of a node. Empty for leaves and unknown handles.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            Some(NodeKind::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Text(_)))
    }

    pub fn is_container(&self, id: NodeId) -> bool {
        self.kind(id).is_some_and(NodeKind::is_container)
    }

    /// The style of a span node, if `id` is one.
    pub fn span_kind(&self, id: NodeId) -> Option<StyleKind> {
        match self.kind(id) {
            Some(NodeKind::Span(kind)) => Some(*kind),
            _ => None,
        }
    }

    /// Length of a text node in chars. Zero for everything else.
    pub fn char_len(&self, id: NodeId) -> usize {
        self.text(id).map(|s| s.chars().count()).unwrap_or(0)
    }

    /// Largest valid offset for a position inside `id`.
    pub fn max_offset(&self, id: NodeId) -> Option<usize> {
        match self.kind(id)? {
            NodeKind::Text(s) => Some(s.chars().count()),
            NodeKind::Root | NodeKind::Span(_) => Some(self.children(id).len()),
            NodeKind::LineBreak => Some(0),
        }
    }

    /// True when `id` exists and its ancestor chain reaches the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.nodes.get(current) {
                Some(node) => match node.parent {
                    Some(parent) => current = parent,
                    None => return false,
                },
                None => return false,
            }
        }
    }

    /// Ancestors of `id`, nearest first, ending with the root.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.parent(id),
        }
    }

    /// True when `ancestor` is `node` or one of its ancestors.
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        node == ancestor || self.ancestors(node).any(|a| a == ancestor)
    }

    /// Lowest common ancestor of two attached nodes (inclusive).
    pub fn common_ancestor(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        if !self.is_attached(a) || !self.is_attached(b) {
            return None;
        }
        std::iter::once(a)
            .chain(self.ancestors(a))
            .find(|candidate| self.is_inclusive_ancestor(*candidate, b))
    }

    pub fn index_in_parent(&self, id: NodeId) -> Result<usize, StructureError> {
        let parent = self
            .nodes
            .get(id)
            .ok_or(StructureError::UnknownNode)?
            .parent
            .ok_or(StructureError::Detached)?;
        self.children(parent)
            .iter()
            .position(|c| *c == id)
            .ok_or(StructureError::Detached)
    }

    /// Pre-order walk of `id` and everything below it.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !self.contains(current) {
                continue;
            }
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Text nodes of the whole document in document order.
    pub fn text_nodes(&self) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|id| self.is_text(*id))
            .collect()
    }

    /// Concatenated text of `id` and its descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id)
            .into_iter()
            .filter_map(|n| self.text(n))
            .collect()
    }

    /// Total text length of `id`'s subtree in chars.
    pub fn subtree_len(&self, id: NodeId) -> usize {
        self.descendants(id)
            .into_iter()
            .map(|n| self.char_len(n))
            .sum()
    }

    // === Construction ===

    /// Create a detached text node.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.nodes.insert(Node::new(NodeKind::Text(text.into())))
    }

    /// Create a detached, empty formatting span.
    pub fn create_span(&mut self, kind: StyleKind) -> NodeId {
        self.nodes.insert(Node::new(NodeKind::Span(kind)))
    }

    pub fn create_line_break(&mut self) -> NodeId {
        self.nodes.insert(Node::new(NodeKind::LineBreak))
    }

    /// Create a detached node of the same kind as `id`, without children.
    pub fn shallow_clone(&mut self, id: NodeId) -> Result<NodeId, StructureError> {
        let kind = self.kind(id).ok_or(StructureError::UnknownNode)?.clone();
        if kind == NodeKind::Root {
            return Err(StructureError::RootImmutable);
        }
        Ok(self.nodes.insert(Node::new(kind)))
    }

    // === Mutation ===

    /// Insert `child` into `parent` at `index`, moving it if already attached.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), StructureError> {
        if !self.contains(child) {
            return Err(StructureError::UnknownNode);
        }
        if child == self.root {
            return Err(StructureError::RootImmutable);
        }
        if !self.is_container(parent) {
            return Err(if self.contains(parent) {
                StructureError::NotAContainer
            } else {
                StructureError::UnknownNode
            });
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(StructureError::WouldCycle);
        }

        let mut index = index;
        if self.parent(child) == Some(parent) {
            let current = self.index_in_parent(child)?;
            if current < index {
                index -= 1;
            }
        }
        self.detach(child)?;

        let len = self.children(parent).len();
        if index > len {
            return Err(StructureError::IndexOutOfRange { index, len });
        }
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.insert(index, child);
        }
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(parent);
        }
        Ok(())
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), StructureError> {
        let len = self.children(parent).len();
        self.insert_child(parent, len, child)
    }

    /// Remove `id` from its parent, keeping the node (and subtree) alive.
    ///
    /// Detaching an already detached node is a no-op.
    pub fn detach(&mut self, id: NodeId) -> Result<(), StructureError> {
        if id == self.root {
            return Err(StructureError::RootImmutable);
        }
        let parent = match self.nodes.get(id) {
            Some(node) => node.parent,
            None => return Err(StructureError::UnknownNode),
        };
        if let Some(parent) = parent {
            if let Some(node) = self.nodes.get_mut(parent) {
                node.children.retain(|c| *c != id);
            }
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = None;
        }
        Ok(())
    }

    /// Detach `id` and free it together with its subtree.
    pub fn remove(&mut self, id: NodeId) -> Result<(), StructureError> {
        self.detach(id)?;
        for node in self.descendants(id) {
            self.nodes.remove(node);
            self.split_from.remove(&node);
            self.absorbed.remove(&node);
        }
        Ok(())
    }

    /// Replace the content of a text node.
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> Result<(), StructureError> {
        match self.nodes.get_mut(id).map(|n| &mut n.kind) {
            Some(NodeKind::Text(s)) => {
                *s = text.into();
                Ok(())
            }
            Some(_) => Err(StructureError::NotText),
            None => Err(StructureError::UnknownNode),
        }
    }

    /// Split a text node at a char offset.
    ///
    /// The original node keeps the text before `offset`; a new node holding
    /// the rest is returned and, if the original is attached, inserted right
    /// after it.
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> Result<NodeId, StructureError> {
        let text = self.text(id).ok_or(StructureError::NotText)?;
        let len = text.chars().count();
        if offset > len {
            return Err(StructureError::IndexOutOfRange { index: offset, len });
        }
        let byte = char_to_byte(text, offset);
        let (left, right) = text.split_at(byte);
        let (left, right) = (left.to_owned(), right.to_owned());

        self.set_text(id, left)?;
        let right = self.create_text(right);
        self.split_from.insert(right, id);
        if let Some(parent) = self.parent(id) {
            let index = self.index_in_parent(id)?;
            self.insert_child(parent, index + 1, right)?;
        }
        Ok(right)
    }

    /// Split a container at a child index.
    ///
    /// Children from `index` on move into a shallow clone inserted right
    /// after `id`, which is returned.
    pub fn split_children(&mut self, id: NodeId, index: usize) -> Result<NodeId, StructureError> {
        let parent = self.parent(id).ok_or(StructureError::Detached)?;
        let at = self.index_in_parent(id)?;
        let len = self.children(id).len();
        if index > len {
            return Err(StructureError::IndexOutOfRange { index, len });
        }
        let clone = self.shallow_clone(id)?;
        self.insert_child(parent, at + 1, clone)?;
        let moved = self.children(id)[index..].to_vec();
        for child in moved {
            self.append_child(clone, child)?;
        }
        self.split_from.insert(clone, id);
        Ok(clone)
    }

    /// The node `id` was split off from, if that split has not been undone.
    pub fn split_origin(&self, id: NodeId) -> Option<NodeId> {
        self.split_from.get(&id).copied()
    }

    /// Treat `to` as the node that was split wherever `from` was.
    pub fn redirect_splits(&mut self, from: NodeId, to: NodeId) {
        for origin in self.split_from.values_mut() {
            if *origin == from {
                *origin = to;
            }
        }
    }

    /// Merge adjacent siblings that were split from one another, throughout
    /// the subtree of `id`.
    ///
    /// Only halves of an earlier split are joined, so content that arrived
    /// as separate runs keeps its shape.
    pub fn rejoin(&mut self, id: NodeId) -> Result<(), StructureError> {
        let mut i = 1;
        while i < self.children(id).len() {
            let left = self.children(id)[i - 1];
            let right = self.children(id)[i];
            let same_kind = self.kind(left) == self.kind(right)
                || (self.is_text(left) && self.is_text(right));
            if self.split_origin(right) == Some(left) && same_kind {
                self.merge_into(left, right)?;
            } else {
                i += 1;
            }
        }
        for child in self.children(id).to_vec() {
            if self.is_container(child) {
                self.rejoin(child)?;
            }
        }
        Ok(())
    }

    fn merge_into(&mut self, left: NodeId, right: NodeId) -> Result<(), StructureError> {
        if let Some(tail) = self.text(right).map(str::to_owned) {
            let mut text = self.text(left).ok_or(StructureError::NotText)?.to_owned();
            text.push_str(&tail);
            self.set_text(left, text)?;
        } else {
            for child in self.children(right).to_vec() {
                self.append_child(left, child)?;
            }
        }
        self.redirect_splits(right, left);
        self.remove(right)
    }

    /// Record spans of the same kind that `span` swallowed.
    pub fn set_absorbed(&mut self, span: NodeId, absorbed: Vec<Absorbed>) {
        if absorbed.is_empty() {
            self.absorbed.remove(&span);
        } else {
            self.absorbed.insert(span, absorbed);
        }
    }

    pub fn take_absorbed(&mut self, span: NodeId) -> Vec<Absorbed> {
        self.absorbed.remove(&span).unwrap_or_default()
    }

    /// Forget every absorbed record. Text edits make their ranges stale.
    pub fn clear_absorbed(&mut self) {
        self.absorbed.clear();
    }

    /// Replace a span with its children, in place.
    ///
    /// Returns the parent and the index range the children now occupy.
    pub fn unwrap(&mut self, id: NodeId) -> Result<(NodeId, std::ops::Range<usize>), StructureError> {
        if !self.contains(id) {
            return Err(StructureError::UnknownNode);
        }
        if id == self.root {
            return Err(StructureError::RootImmutable);
        }
        let parent = self.parent(id).ok_or(StructureError::Detached)?;
        let index = self.index_in_parent(id)?;
        let children = self.children(id).to_vec();
        for (i, child) in children.iter().enumerate() {
            self.insert_child(parent, index + i, *child)?;
        }
        self.remove(id)?;
        Ok((parent, index..index + children.len()))
    }

    /// Move `parent`'s children in `range` into a new span inserted in their place.
    pub fn wrap_children(
        &mut self,
        parent: NodeId,
        range: std::ops::Range<usize>,
        kind: StyleKind,
    ) -> Result<NodeId, StructureError> {
        let len = self.children(parent).len();
        if range.start > range.end || range.end > len {
            return Err(StructureError::IndexOutOfRange {
                index: range.end,
                len,
            });
        }
        let moved = self.children(parent)[range.clone()].to_vec();
        let span = self.create_span(kind);
        self.insert_child(parent, range.start, span)?;
        for child in moved {
            self.append_child(span, child)?;
        }
        Ok(span)
    }
}

/// Iterator over a node's ancestors, nearest first.
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.parent(current);
        Some(current)
    }
}

/// Convert a char offset into a byte offset, clamping to the end.
pub(crate) fn char_to_byte(s: &str, char_offset: usize) -> usize {
    s.char_indices()
        .nth(char_offset)
        .map(|(byte, _)| byte)
        .unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hello_world() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let hello = doc.create_text("Hello ");
        let em = doc.create_span(StyleKind::Italic);
        let world = doc.create_text("World");
        let root = doc.root();
        doc.append_child(root, hello).unwrap();
        doc.append_child(root, em).unwrap();
        doc.append_child(em, world).unwrap();
        (doc, hello, em, world)
    }

    #[test]
    fn test_tree_links() {
        let (doc, hello, em, world) = hello_world();
        assert_eq!(doc.children(doc.root()), &[hello, em]);
        assert_eq!(doc.parent(world), Some(em));
        assert_eq!(doc.ancestors(world).collect::<Vec<_>>(), vec![em, doc.root()]);
        assert_eq!(doc.text_content(doc.root()), "Hello World");
        assert_eq!(doc.subtree_len(em), 5);
        assert_eq!(doc.text_nodes(), vec![hello, world]);
    }

    #[test]
    fn test_split_text_multibyte() {
        let mut doc = Document::new();
        let t = doc.create_text("héllo");
        let root = doc.root();
        doc.append_child(root, t).unwrap();
        let right = doc.split_text(t, 2).unwrap();
        assert_eq!(doc.text(t), Some("hé"));
        assert_eq!(doc.text(right), Some("llo"));
        assert_eq!(doc.children(root), &[t, right]);
        assert!(matches!(
            doc.split_text(t, 9),
            Err(StructureError::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_unwrap_and_wrap() {
        let (mut doc, hello, em, world) = hello_world();
        let (parent, range) = doc.unwrap(em).unwrap();
        assert_eq!(parent, doc.root());
        assert_eq!(range, 1..2);
        assert!(!doc.contains(em));
        assert_eq!(doc.children(doc.root()), &[hello, world]);

        let root = doc.root();
        let bold = doc.wrap_children(root, 0..2, StyleKind::Bold).unwrap();
        assert_eq!(doc.children(root), &[bold]);
        assert_eq!(doc.children(bold), &[hello, world]);
    }

    #[test]
    fn test_insert_rejects_cycles_and_leaves() {
        let (mut doc, hello, em, _world) = hello_world();
        let root = doc.root();
        assert_eq!(doc.insert_child(em, 0, em), Err(StructureError::WouldCycle));
        assert_eq!(
            doc.insert_child(hello, 0, em),
            Err(StructureError::NotAContainer)
        );
        assert_eq!(
            doc.insert_child(em, 0, root),
            Err(StructureError::RootImmutable)
        );
    }

    #[test]
    fn test_move_within_same_parent() {
        let (mut doc, hello, em, _) = hello_world();
        let root = doc.root();
        doc.insert_child(root, 2, hello).unwrap();
        assert_eq!(doc.children(root), &[em, hello]);
    }

    #[test]
    fn test_common_ancestor() {
        let (doc, hello, em, world) = hello_world();
        assert_eq!(doc.common_ancestor(hello, world), Some(doc.root()));
        assert_eq!(doc.common_ancestor(world, em), Some(em));
        assert_eq!(doc.common_ancestor(world, world), Some(world));
    }
}
