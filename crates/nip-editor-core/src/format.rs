//! Formatting commands: toggle bold, italic or underline over a selection.
//!
//! [`apply`] takes the document and selection explicitly and returns the
//! selection the user should continue with. Three shapes are handled:
//!
//! - a caret inserts an empty span holding a placeholder and moves the caret
//!   into it, so the next typed text carries the style;
//! - a range that is not inside a span of the requested kind gets wrapped in a
//!   new span, and the new selection covers the whole span;
//! - a range whose start sits inside such a span unwraps that span, keeping
//!   the selected characters selected.
//!
//! If the tree refuses a mutation halfway through, the document is restored
//! and the selected text is replaced by a single span holding its plain text.

use tracing::{debug, warn};

use crate::document::{Absorbed, Document, NodeId, StructureError};
use crate::edit::{delete_range, insert_node_at, lift_boundary};
use crate::offsets::{
    Bias, is_valid_position, offset_to_position, position_to_offset, range_to_selection,
    selection_to_range, text_len,
};
use crate::types::{PLACEHOLDER, Position, Selection, StyleKind, TextRange};

/// Why a formatting command was refused.
#[derive(thiserror::Error, miette::Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("selection out of bounds")]
    #[diagnostic(
        code(nip::editor::selection_out_of_bounds),
        help("the selection must reference nodes and offsets inside the current document")
    )]
    SelectionOutOfBounds,
}

/// Which branch a formatting command took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatPath {
    /// Caret: an empty span with a placeholder was inserted.
    InsertedPlaceholder,
    /// Caret inside a span of the same kind: the pending style was switched off.
    ExitedSpan,
    /// Range: selected content was wrapped in a new span.
    Wrapped,
    /// Range inside a span of the same kind: that span was removed.
    Unwrapped,
    /// Structural failure: the range was replaced with a plain-text span.
    Fallback,
    /// Structural failure with no way to recover: nothing changed.
    Unchanged,
}

/// Result of a formatting command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOutcome {
    pub selection: Selection,
    pub path: FormatPath,
}

/// Toggle `kind` over `selection`.
///
/// Returns [`FormatError::SelectionOutOfBounds`] without touching the document
/// when either end of the selection does not resolve inside it. Structural
/// failures never surface as errors.
pub fn apply(
    doc: &mut Document,
    kind: StyleKind,
    selection: Selection,
) -> Result<FormatOutcome, FormatError> {
    if !is_valid_position(doc, selection.anchor) || !is_valid_position(doc, selection.focus) {
        return Err(FormatError::SelectionOutOfBounds);
    }
    let range = selection_to_range(doc, &selection).ok_or(FormatError::SelectionOutOfBounds)?;
    let start = start_position(doc, &selection);

    let snapshot = doc.clone();
    let attempt = if range.is_caret() {
        toggle_at_caret(doc, kind, start)
    } else if let Some(span) = enclosing_span(doc, kind, start.node) {
        unwrap_span(doc, span, range).map(|sel| (sel, FormatPath::Unwrapped))
    } else {
        wrap_selection(doc, kind, range).map(|sel| (sel, FormatPath::Wrapped))
    };

    let (selection, path) = match attempt {
        Ok(done) => done,
        Err(error) => {
            warn!(%kind, %error, "formatting failed, replacing selection with plain text span");
            *doc = snapshot.clone();
            match fallback_wrap(doc, kind, range) {
                Ok(sel) => (sel, FormatPath::Fallback),
                Err(error) => {
                    warn!(%kind, %error, "fallback formatting failed, leaving document unchanged");
                    *doc = snapshot;
                    (selection, FormatPath::Unchanged)
                }
            }
        }
    };

    debug!(%kind, ?path, start = range.start, end = range.end, "applied formatting command");
    Ok(FormatOutcome { selection, path })
}

/// The selection end that comes first in the text.
fn start_position(doc: &Document, selection: &Selection) -> Position {
    let anchor = position_to_offset(doc, selection.anchor);
    let focus = position_to_offset(doc, selection.focus);
    match (anchor, focus) {
        (Some(a), Some(f)) if f < a => selection.focus,
        _ => selection.anchor,
    }
}

/// Nearest span of `kind` at or above `node`, stopping at the root.
///
/// A text node starts the search at its parent.
pub fn enclosing_span(doc: &Document, kind: StyleKind, node: NodeId) -> Option<NodeId> {
    let start = if doc.is_text(node) {
        doc.parent(node)?
    } else {
        node
    };
    std::iter::once(start)
        .chain(doc.ancestors(start))
        .take_while(|n| *n != doc.root())
        .find(|n| doc.span_kind(*n) == Some(kind))
}

fn toggle_at_caret(
    doc: &mut Document,
    kind: StyleKind,
    caret: Position,
) -> Result<(Selection, FormatPath), StructureError> {
    match enclosing_span(doc, kind, caret.node) {
        Some(span) => exit_span(doc, span, caret).map(|sel| (sel, FormatPath::ExitedSpan)),
        None => insert_placeholder_span(doc, kind, caret)
            .map(|sel| (sel, FormatPath::InsertedPlaceholder)),
    }
}

fn insert_placeholder_span(
    doc: &mut Document,
    kind: StyleKind,
    caret: Position,
) -> Result<Selection, StructureError> {
    let span = doc.create_span(kind);
    let placeholder = doc.create_text(PLACEHOLDER.to_string());
    doc.append_child(span, placeholder)?;
    insert_node_at(doc, caret, span)?;
    Ok(Selection::caret(Position::new(placeholder, 1)))
}

/// Switch the style off at a caret that already carries it.
///
/// A span holding nothing but placeholders is dropped outright. Otherwise the
/// span is split at the caret and a placeholder goes between the halves.
fn exit_span(doc: &mut Document, span: NodeId, caret: Position) -> Result<Selection, StructureError> {
    let parent = doc.parent(span).ok_or(StructureError::Detached)?;
    doc.take_absorbed(span);

    let only_placeholders = doc
        .text_content(span)
        .chars()
        .all(|c| c == PLACEHOLDER);
    if only_placeholders {
        let index = doc.index_in_parent(span)?;
        doc.remove(span)?;
        return Ok(Selection::caret(Position::new(parent, index)));
    }

    let index = lift_boundary(doc, caret, parent)?;
    let placeholder = doc.create_text(PLACEHOLDER.to_string());
    doc.insert_child(parent, index, placeholder)?;
    Ok(Selection::caret(Position::new(placeholder, 1)))
}

/// Remove `span`, bring back the same-kind spans it swallowed, and join the
/// halves its creation split apart.
fn unwrap_span(doc: &mut Document, span: NodeId, range: TextRange) -> Result<Selection, StructureError> {
    let kind = doc.span_kind(span).ok_or(StructureError::NotAContainer)?;
    let offset = position_to_offset(doc, Position::new(span, 0)).ok_or(StructureError::Detached)?;
    let span_len = doc.subtree_len(span);
    let absorbed = doc.take_absorbed(span);

    let (parent, _) = doc.unwrap(span)?;
    for item in absorbed.into_iter().filter(|a| a.range.end <= span_len) {
        let target = TextRange::new(offset + item.range.start, offset + item.range.end);
        let restored = wrap_range(doc, kind, target)?;
        doc.redirect_splits(item.span, restored);
    }
    doc.rejoin(parent)?;

    range_to_selection(doc, range).ok_or(StructureError::IndexOutOfRange {
        index: range.end,
        len: text_len(doc),
    })
}

fn wrap_selection(doc: &mut Document, kind: StyleKind, range: TextRange) -> Result<Selection, StructureError> {
    let span = wrap_range(doc, kind, range)?;
    let parent = doc.parent(span).ok_or(StructureError::Detached)?;
    doc.rejoin(parent)?;
    Ok(Selection::contents_of(span, doc.children(span).len()))
}

/// Wrap the content of `range` in one new span of `kind`, returning it.
fn wrap_range(doc: &mut Document, kind: StyleKind, range: TextRange) -> Result<NodeId, StructureError> {
    let len = text_len(doc);
    let out_of_range = || StructureError::IndexOutOfRange {
        index: range.end,
        len,
    };

    // Split text so the range covers whole text nodes: `first` starts it and
    // `last` ends it.
    let start = offset_to_position(doc, range.start, Bias::After).ok_or_else(out_of_range)?;
    let first = if start.offset == 0 {
        start.node
    } else {
        doc.split_text(start.node, start.offset)?
    };
    let end = offset_to_position(doc, range.end, Bias::Before).ok_or_else(out_of_range)?;
    let last = end.node;
    if end.offset < doc.char_len(last) {
        doc.split_text(last, end.offset)?;
    }

    let common = doc.common_ancestor(first, last).ok_or(StructureError::Detached)?;
    let container = if doc.is_container(common) {
        common
    } else {
        doc.parent(common).ok_or(StructureError::Detached)?
    };

    // Lift the end first; remember the child it lands after, since lifting the
    // start may insert siblings in front of it.
    let end_len = doc.char_len(last);
    let end_index = lift_boundary(doc, Position::new(last, end_len), container)?;
    let end_marker = end_index
        .checked_sub(1)
        .and_then(|i| doc.children(container).get(i).copied())
        .ok_or_else(out_of_range)?;
    let start_index = lift_boundary(doc, Position::new(first, 0), container)?;
    let end_index = doc.index_in_parent(end_marker)? + 1;
    if start_index >= end_index {
        return Err(out_of_range());
    }

    let span = doc.wrap_children(container, start_index..end_index, kind)?;
    flatten_same_kind(doc, span, kind)?;
    Ok(span)
}

/// Unwrap spans of `kind` nested anywhere below `span`, recording where the
/// outermost of them sat so unwrapping `span` can restore them.
fn flatten_same_kind(doc: &mut Document, span: NodeId, kind: StyleKind) -> Result<(), StructureError> {
    let base = position_to_offset(doc, Position::new(span, 0)).ok_or(StructureError::Detached)?;
    let nested: Vec<NodeId> = doc
        .descendants(span)
        .into_iter()
        .skip(1)
        .filter(|n| doc.span_kind(*n) == Some(kind))
        .collect();

    let mut absorbed: Vec<Absorbed> = Vec::new();
    for node in &nested {
        let start = position_to_offset(doc, Position::new(*node, 0))
            .ok_or(StructureError::Detached)?
            - base;
        let range = TextRange::new(start, start + doc.subtree_len(*node));
        let inside_earlier = absorbed
            .iter()
            .any(|a| a.range.start <= range.start && range.end <= a.range.end);
        if !range.is_empty() && !inside_earlier {
            absorbed.push(Absorbed { range, span: *node });
        }
    }
    for node in nested {
        doc.unwrap(node)?;
    }
    doc.set_absorbed(span, absorbed);
    Ok(())
}

/// Replace the range with one span holding the range's plain text.
///
/// Any formatting inside the range is lost.
pub(crate) fn fallback_wrap(
    doc: &mut Document,
    kind: StyleKind,
    range: TextRange,
) -> Result<Selection, StructureError> {
    let text: String = doc
        .text_content(doc.root())
        .chars()
        .skip(range.start)
        .take(range.len())
        .collect();

    let at = delete_range(doc, range)?;
    let span = doc.create_span(kind);
    let content = doc.create_text(text);
    doc.append_child(span, content)?;
    insert_node_at(doc, at, span)?;
    Ok(Selection::contents_of(span, 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::{parse, serialize};

    fn select(doc: &Document, start: usize, end: usize) -> Selection {
        range_to_selection(doc, TextRange::new(start, end)).unwrap()
    }

    #[test]
    fn test_caret_inserts_placeholder_span() {
        let mut doc = parse("Hello");
        let caret = Selection::caret(Position::new(doc.text_nodes()[0], 5));
        let out = apply(&mut doc, StyleKind::Bold, caret).unwrap();

        assert_eq!(out.path, FormatPath::InsertedPlaceholder);
        assert_eq!(serialize(&doc), "Hello<strong>\u{200B}</strong>");
        let span = doc.children(doc.root())[1];
        assert_eq!(doc.parent(out.selection.focus.node), Some(span));
        assert_eq!(out.selection.focus.offset, 1);
        assert!(out.selection.is_collapsed());
    }

    #[test]
    fn test_caret_in_middle_splits_text() {
        let mut doc = parse("Hello");
        let caret = Selection::caret(Position::new(doc.text_nodes()[0], 2));
        apply(&mut doc, StyleKind::Underline, caret).unwrap();
        assert_eq!(serialize(&doc), "He<u>\u{200B}</u>llo");
    }

    #[test]
    fn test_caret_in_empty_document() {
        let mut doc = parse("");
        let caret = Selection::caret(Position::new(doc.root(), 0));
        apply(&mut doc, StyleKind::Italic, caret).unwrap();
        assert_eq!(serialize(&doc), "<em>\u{200B}</em>");
    }

    #[test]
    fn test_caret_toggle_twice_removes_placeholder_span() {
        let mut doc = parse("Hello");
        let caret = Selection::caret(Position::new(doc.text_nodes()[0], 5));
        let first = apply(&mut doc, StyleKind::Bold, caret).unwrap();
        let second = apply(&mut doc, StyleKind::Bold, first.selection).unwrap();

        assert_eq!(second.path, FormatPath::ExitedSpan);
        assert_eq!(serialize(&doc), "Hello");
        assert!(is_valid_position(&doc, second.selection.focus));
    }

    #[test]
    fn test_caret_inside_formatted_text_exits_span() {
        let mut doc = parse("<strong>abcd</strong>");
        let caret = Selection::caret(Position::new(doc.text_nodes()[0], 2));
        let out = apply(&mut doc, StyleKind::Bold, caret).unwrap();

        assert_eq!(out.path, FormatPath::ExitedSpan);
        assert_eq!(
            serialize(&doc),
            "<strong>ab</strong>\u{200B}<strong>cd</strong>"
        );
    }

    #[test]
    fn test_wrap_then_unwrap_round_trips() {
        let mut doc = parse("Hello World");
        let sel = select(&doc, 6, 11);

        let on = apply(&mut doc, StyleKind::Bold, sel).unwrap();
        assert_eq!(on.path, FormatPath::Wrapped);
        assert_eq!(serialize(&doc), "Hello <strong>World</strong>");
        assert_eq!(selection_to_range(&doc, &on.selection), Some(TextRange::new(6, 11)));

        let off = apply(&mut doc, StyleKind::Bold, on.selection).unwrap();
        assert_eq!(off.path, FormatPath::Unwrapped);
        assert_eq!(serialize(&doc), "Hello World");
        assert_eq!(selection_to_range(&doc, &off.selection), Some(TextRange::new(6, 11)));
    }

    #[test]
    fn test_wrap_nests_inside_other_kind() {
        let mut doc = parse("Hello <em>World</em>");
        let sel = select(&doc, 6, 11);
        apply(&mut doc, StyleKind::Bold, sel).unwrap();
        assert_eq!(serialize(&doc), "Hello <em><strong>World</strong></em>");
    }

    #[test]
    fn test_wrap_across_partial_span_splits_it() {
        let mut doc = parse("Hello <em>World</em>");
        let sel = select(&doc, 3, 8);
        apply(&mut doc, StyleKind::Bold, sel).unwrap();
        assert_eq!(
            serialize(&doc),
            "Hel<strong>lo <em>Wo</em></strong><em>rld</em>"
        );
    }

    #[test]
    fn test_wrap_flattens_nested_same_kind() {
        let mut doc = parse("ab<strong>cd</strong>ef");
        let sel = select(&doc, 0, 6);
        let out = apply(&mut doc, StyleKind::Bold, sel).unwrap();
        assert_eq!(out.path, FormatPath::Wrapped);
        assert_eq!(serialize(&doc), "<strong>abcdef</strong>");
        let span = doc.children(doc.root())[0];
        assert_eq!(out.selection, Selection::contents_of(span, 3));

        apply(&mut doc, StyleKind::Bold, out.selection).unwrap();
        assert_eq!(serialize(&doc), "ab<strong>cd</strong>ef");
    }

    #[test]
    fn test_toggle_off_restores_partly_covered_span() {
        let mut doc = parse("ab<strong>cd</strong>");
        let sel = select(&doc, 0, 3);
        let on = apply(&mut doc, StyleKind::Bold, sel).unwrap();
        assert_eq!(serialize(&doc), "<strong>abc</strong><strong>d</strong>");

        let off = apply(&mut doc, StyleKind::Bold, on.selection).unwrap();
        assert_eq!(off.path, FormatPath::Unwrapped);
        assert_eq!(serialize(&doc), "ab<strong>cd</strong>");
        assert_eq!(doc.text_nodes().len(), 2);
        assert_eq!(selection_to_range(&doc, &off.selection), Some(TextRange::new(0, 3)));
    }

    #[test]
    fn test_toggle_off_rejoins_split_span() {
        let mut doc = parse("a <em>mixed</em> line");
        let sel = select(&doc, 0, 5);
        let on = apply(&mut doc, StyleKind::Bold, sel).unwrap();
        assert_eq!(
            serialize(&doc),
            "<strong>a <em>mix</em></strong><em>ed</em> line"
        );

        apply(&mut doc, StyleKind::Bold, on.selection).unwrap();
        assert_eq!(serialize(&doc), "a <em>mixed</em> line");
    }

    #[test]
    fn test_typing_forgets_swallowed_spans() {
        let mut doc = parse("ab<strong>cd</strong>");
        let sel = select(&doc, 0, 3);
        let on = apply(&mut doc, StyleKind::Bold, sel).unwrap();
        let span = on.selection.anchor.node;
        crate::edit::insert_text(&mut doc, Position::new(span, 0), "X").unwrap();
        assert!(doc.take_absorbed(span).is_empty());
    }

    #[test]
    fn test_backwards_selection() {
        let mut doc = parse("Hello World");
        let forward = select(&doc, 0, 5);
        let backwards = Selection::new(forward.focus, forward.anchor);
        apply(&mut doc, StyleKind::Italic, backwards).unwrap();
        assert_eq!(serialize(&doc), "<em>Hello</em> World");
    }

    #[test]
    fn test_unwrap_uses_start_container_only() {
        let mut doc = parse("<u>Hello</u> World");
        let sel = select(&doc, 2, 8);
        let out = apply(&mut doc, StyleKind::Underline, sel).unwrap();
        assert_eq!(out.path, FormatPath::Unwrapped);
        assert_eq!(serialize(&doc), "Hello World");
        assert_eq!(selection_to_range(&doc, &out.selection), Some(TextRange::new(2, 8)));
    }

    #[test]
    fn test_out_of_bounds_is_a_no_op() {
        let mut doc = parse("Hello");
        let detached = doc.create_text("loose");
        let text = doc.text_nodes()[0];

        let too_far = Selection::caret(Position::new(text, 6));
        assert_eq!(
            apply(&mut doc, StyleKind::Bold, too_far),
            Err(FormatError::SelectionOutOfBounds)
        );
        let half_detached = Selection::new(Position::new(text, 0), Position::new(detached, 2));
        assert_eq!(
            apply(&mut doc, StyleKind::Italic, half_detached),
            Err(FormatError::SelectionOutOfBounds)
        );
        assert_eq!(serialize(&doc), "Hello");
    }

    #[test]
    fn test_fallback_replaces_with_plain_text() {
        let mut doc = parse("a<em>bc</em>d");
        let sel = fallback_wrap(&mut doc, StyleKind::Bold, TextRange::new(1, 4)).unwrap();
        assert_eq!(serialize(&doc), "a<strong>bcd</strong>");
        assert_eq!(selection_to_range(&doc, &sel), Some(TextRange::new(1, 4)));
    }
}
