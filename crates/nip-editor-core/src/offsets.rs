//! Mapping between tree positions and flat text offsets.
//!
//! A flat offset counts chars over the document's text nodes in document
//! order. Line breaks and spans contribute nothing. Commands that reshape the
//! tree go through flat offsets so the user's character boundaries survive.

use crate::document::{Document, NodeKind};
use crate::types::{Position, Selection, TextRange};

/// Which text node wins when an offset sits on a boundary between two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
    /// Prefer the end of the earlier node.
    Before,
    /// Prefer the start of the later node.
    After,
}

/// True when `pos` names an attached node and an offset inside it.
pub fn is_valid_position(doc: &Document, pos: Position) -> bool {
    doc.is_attached(pos.node)
        && doc
            .max_offset(pos.node)
            .is_some_and(|max| pos.offset <= max)
}

/// Flat text offset of a tree position, or `None` if the position is invalid.
pub fn position_to_offset(doc: &Document, pos: Position) -> Option<usize> {
    if !is_valid_position(doc, pos) {
        return None;
    }

    let mut base = 0;
    for node in doc.descendants(doc.root()) {
        if node == pos.node {
            break;
        }
        base += doc.char_len(node);
    }

    let offset = match doc.kind(pos.node)? {
        NodeKind::Text(_) => base + pos.offset,
        NodeKind::Root | NodeKind::Span(_) => {
            base + doc.children(pos.node)[..pos.offset]
                .iter()
                .map(|child| doc.subtree_len(*child))
                .sum::<usize>()
        }
        NodeKind::LineBreak => base,
    };
    Some(offset)
}

/// Resolve a flat offset to a position inside a text node.
///
/// Falls back to the root start for a document without text. Returns `None`
/// when the offset lies past the end of the text.
pub fn offset_to_position(doc: &Document, offset: usize, bias: Bias) -> Option<Position> {
    let texts = doc.text_nodes();
    let mut acc = 0;
    for node in &texts {
        let len = doc.char_len(*node);
        let hit = match bias {
            Bias::Before => offset <= acc + len,
            Bias::After => offset < acc + len,
        };
        if hit {
            return Some(Position::new(*node, offset - acc));
        }
        acc += len;
    }

    if offset != acc {
        return None;
    }
    match texts.last() {
        Some(last) => Some(Position::new(*last, doc.char_len(*last))),
        None => Some(Position::new(doc.root(), 0)),
    }
}

/// Ordered flat range covered by a selection.
pub fn selection_to_range(doc: &Document, selection: &Selection) -> Option<TextRange> {
    let anchor = position_to_offset(doc, selection.anchor)?;
    let focus = position_to_offset(doc, selection.focus)?;
    Some(TextRange::new(anchor, focus).normalize())
}

/// Build a selection over a flat range using an in-order text walk.
///
/// A non-empty range starts at the beginning of the node holding its first
/// char and ends at the end of the node holding its last char.
pub fn range_to_selection(doc: &Document, range: TextRange) -> Option<Selection> {
    let range = range.normalize();
    if range.is_caret() {
        return offset_to_position(doc, range.start, Bias::Before).map(Selection::caret);
    }
    let start = offset_to_position(doc, range.start, Bias::After)?;
    let end = offset_to_position(doc, range.end, Bias::Before)?;
    Some(Selection::new(start, end))
}

/// Total text length of the document in chars.
pub fn text_len(doc: &Document) -> usize {
    doc.subtree_len(doc.root())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::parse;

    #[test]
    fn test_position_to_offset_text_and_container() {
        let doc = parse("Hello <em>World</em>");
        let root = doc.root();
        let texts = doc.text_nodes();
        let em = doc.children(root)[1];

        assert_eq!(position_to_offset(&doc, Position::new(texts[0], 3)), Some(3));
        assert_eq!(position_to_offset(&doc, Position::new(texts[1], 2)), Some(8));
        assert_eq!(position_to_offset(&doc, Position::new(root, 1)), Some(6));
        assert_eq!(position_to_offset(&doc, Position::new(root, 2)), Some(11));
        assert_eq!(position_to_offset(&doc, Position::new(em, 0)), Some(6));
        assert_eq!(position_to_offset(&doc, Position::new(texts[1], 6)), None);
    }

    #[test]
    fn test_offset_to_position_bias() {
        let doc = parse("Hello <em>World</em>");
        let texts = doc.text_nodes();

        assert_eq!(
            offset_to_position(&doc, 6, Bias::Before),
            Some(Position::new(texts[0], 6))
        );
        assert_eq!(
            offset_to_position(&doc, 6, Bias::After),
            Some(Position::new(texts[1], 0))
        );
        assert_eq!(
            offset_to_position(&doc, 11, Bias::After),
            Some(Position::new(texts[1], 5))
        );
        assert_eq!(offset_to_position(&doc, 12, Bias::Before), None);
    }

    #[test]
    fn test_empty_document_resolves_to_root() {
        let doc = parse("");
        assert_eq!(
            offset_to_position(&doc, 0, Bias::After),
            Some(Position::new(doc.root(), 0))
        );
        assert_eq!(offset_to_position(&doc, 1, Bias::After), None);
    }

    #[test]
    fn test_range_selection_round_trip() {
        let doc = parse("<strong>ab</strong>cd<u>ef</u>");
        let sel = range_to_selection(&doc, TextRange::new(1, 5)).unwrap();
        assert_eq!(selection_to_range(&doc, &sel), Some(TextRange::new(1, 5)));
        assert_eq!(text_len(&doc), 6);
    }
}
