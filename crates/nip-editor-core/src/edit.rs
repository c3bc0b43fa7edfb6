//! Low-level edits on a document: inserting nodes and text at a position,
//! deleting a flat text range, and splitting the tree at a boundary.

use crate::document::{Document, NodeId, NodeKind, StructureError, char_to_byte};
use crate::offsets::{Bias, offset_to_position};
use crate::types::{Position, TextRange};

/// Insert a detached node at a position.
///
/// Inside a text node the text is split and the node lands between the two
/// halves; at either end of the text no split happens.
pub fn insert_node_at(doc: &mut Document, at: Position, node: NodeId) -> Result<(), StructureError> {
    match doc.kind(at.node) {
        Some(NodeKind::Text(_)) => {
            let parent = doc.parent(at.node).ok_or(StructureError::Detached)?;
            let index = doc.index_in_parent(at.node)?;
            let len = doc.char_len(at.node);
            if at.offset == 0 {
                doc.insert_child(parent, index, node)
            } else if at.offset >= len {
                doc.insert_child(parent, index + 1, node)
            } else {
                doc.split_text(at.node, at.offset)?;
                doc.insert_child(parent, index + 1, node)
            }
        }
        Some(NodeKind::LineBreak) => {
            let parent = doc.parent(at.node).ok_or(StructureError::Detached)?;
            let index = doc.index_in_parent(at.node)?;
            doc.insert_child(parent, index, node)
        }
        Some(_) => doc.insert_child(at.node, at.offset, node),
        None => Err(StructureError::UnknownNode),
    }
}

/// Insert text at a position, returning the caret after the inserted text.
pub fn insert_text(doc: &mut Document, at: Position, text: &str) -> Result<Position, StructureError> {
    doc.clear_absorbed();
    let inserted = text.chars().count();

    if let Some(existing) = doc.text(at.node) {
        let byte = char_to_byte(existing, at.offset);
        let mut updated = existing.to_owned();
        updated.insert_str(byte, text);
        doc.set_text(at.node, updated)?;
        return Ok(Position::new(at.node, at.offset + inserted));
    }

    if doc.is_container(at.node) {
        let children = doc.children(at.node);
        let before = at.offset.checked_sub(1).and_then(|i| children.get(i)).copied();
        let after = children.get(at.offset).copied();

        if let Some(prev) = before.filter(|n| doc.is_text(*n)) {
            let len = doc.char_len(prev);
            return insert_text(doc, Position::new(prev, len), text);
        }
        if let Some(next) = after.filter(|n| doc.is_text(*n)) {
            return insert_text(doc, Position::new(next, 0), text);
        }
    }

    let node = doc.create_text(text);
    insert_node_at(doc, at, node)?;
    Ok(Position::new(node, inserted))
}

/// Delete the text covered by a flat range.
///
/// Text nodes emptied by the deletion are removed, along with spans that are
/// left without children. Returns the caret where the range started.
pub fn delete_range(doc: &mut Document, range: TextRange) -> Result<Position, StructureError> {
    let range = range.normalize();
    doc.clear_absorbed();
    let mut emptied = Vec::new();
    let mut acc = 0;

    for node in doc.text_nodes() {
        let len = doc.char_len(node);
        let (node_start, node_end) = (acc, acc + len);
        acc = node_end;
        if node_end <= range.start || node_start >= range.end || len == 0 {
            continue;
        }

        let cut_start = range.start.saturating_sub(node_start);
        let cut_end = range.end.min(node_end) - node_start;
        let text = doc.text(node).ok_or(StructureError::NotText)?;
        let kept: String = text
            .chars()
            .enumerate()
            .filter(|(i, _)| *i < cut_start || *i >= cut_end)
            .map(|(_, c)| c)
            .collect();
        if kept.is_empty() {
            emptied.push(node);
        }
        doc.set_text(node, kept)?;
    }

    for node in emptied {
        remove_with_empty_ancestors(doc, node)?;
    }

    offset_to_position(doc, range.start, Bias::Before).ok_or(StructureError::IndexOutOfRange {
        index: range.start,
        len: acc,
    })
}

fn remove_with_empty_ancestors(doc: &mut Document, node: NodeId) -> Result<(), StructureError> {
    let mut current = node;
    loop {
        let parent = doc.parent(current);
        doc.remove(current)?;
        match parent {
            Some(p) if p != doc.root() && doc.children(p).is_empty() => current = p,
            _ => return Ok(()),
        }
    }
}

/// Turn a boundary inside `pos.node` into a child index of `container`.
///
/// Every node between the boundary and `container` is split so the boundary
/// falls between two siblings. Splits that would leave an empty half are
/// skipped. `container` must be an inclusive ancestor of `pos.node`.
pub fn lift_boundary(
    doc: &mut Document,
    pos: Position,
    container: NodeId,
) -> Result<usize, StructureError> {
    let (mut node, mut index) = match doc.kind(pos.node) {
        Some(NodeKind::Text(_)) => {
            let parent = doc.parent(pos.node).ok_or(StructureError::Detached)?;
            let at = doc.index_in_parent(pos.node)?;
            let len = doc.char_len(pos.node);
            if pos.offset == 0 {
                (parent, at)
            } else if pos.offset >= len {
                (parent, at + 1)
            } else {
                doc.split_text(pos.node, pos.offset)?;
                (parent, at + 1)
            }
        }
        Some(NodeKind::LineBreak) => {
            let parent = doc.parent(pos.node).ok_or(StructureError::Detached)?;
            (parent, doc.index_in_parent(pos.node)?)
        }
        Some(_) => (pos.node, pos.offset),
        None => return Err(StructureError::UnknownNode),
    };

    while node != container {
        let parent = doc.parent(node).ok_or(StructureError::Detached)?;
        let at = doc.index_in_parent(node)?;
        let len = doc.children(node).len();
        index = if index == 0 {
            at
        } else if index >= len {
            at + 1
        } else {
            doc.split_children(node, index)?;
            at + 1
        };
        node = parent;
    }

    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::{parse, serialize};
    use crate::types::StyleKind;

    #[test]
    fn test_insert_node_splits_text() {
        let mut doc = parse("Hello");
        let t = doc.text_nodes()[0];
        let span = doc.create_span(StyleKind::Bold);
        insert_node_at(&mut doc, Position::new(t, 2), span).unwrap();
        assert_eq!(serialize(&doc), "He<strong></strong>llo");
    }

    #[test]
    fn test_insert_text_merges_into_neighbours() {
        let mut doc = parse("ab<em>cd</em>");
        let root = doc.root();
        let caret = insert_text(&mut doc, Position::new(root, 1), "X").unwrap();
        assert_eq!(serialize(&doc), "abX<em>cd</em>");
        assert_eq!(caret.offset, 3);

        let em = doc.children(root)[1];
        insert_text(&mut doc, Position::new(em, 0), "Y").unwrap();
        assert_eq!(serialize(&doc), "abX<em>Ycd</em>");
    }

    #[test]
    fn test_delete_range_removes_emptied_spans() {
        let mut doc = parse("ab<strong>cd</strong>ef");
        let caret = delete_range(&mut doc, TextRange::new(1, 5)).unwrap();
        assert_eq!(serialize(&doc), "af");
        assert_eq!(crate::offsets::position_to_offset(&doc, caret), Some(1));
    }

    #[test]
    fn test_lift_boundary_splits_ancestors() {
        let mut doc = parse("<em>ab<u>cd</u></em>");
        let root = doc.root();
        let cd = doc.text_nodes()[1];
        let index = lift_boundary(&mut doc, Position::new(cd, 1), root).unwrap();
        assert_eq!(index, 1);
        assert_eq!(serialize(&doc), "<em>ab<u>c</u></em><em><u>d</u></em>");
    }

    #[test]
    fn test_lift_boundary_at_edges_does_not_split() {
        let mut doc = parse("<em>ab</em>");
        let root = doc.root();
        let ab = doc.text_nodes()[0];
        assert_eq!(lift_boundary(&mut doc, Position::new(ab, 0), root).unwrap(), 0);
        assert_eq!(lift_boundary(&mut doc, Position::new(ab, 2), root).unwrap(), 1);
        assert_eq!(serialize(&doc), "<em>ab</em>");
    }

    #[test]
    fn test_rejoin_undoes_lift() {
        let mut doc = parse("<em>ab<u>cd</u></em>");
        let root = doc.root();
        let cd = doc.text_nodes()[1];
        lift_boundary(&mut doc, Position::new(cd, 1), root).unwrap();
        doc.rejoin(root).unwrap();
        assert_eq!(serialize(&doc), "<em>ab<u>cd</u></em>");
        assert_eq!(doc.text_nodes().len(), 2);
    }

    #[test]
    fn test_rejoin_keeps_separate_runs() {
        let mut doc = parse("<em>a</em><em>b</em>");
        let root = doc.root();
        doc.rejoin(root).unwrap();
        assert_eq!(serialize(&doc), "<em>a</em><em>b</em>");
    }
}
