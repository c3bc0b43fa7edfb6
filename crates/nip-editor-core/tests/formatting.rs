//! Behaviour of the formatting commands through the public API.

use nip_editor_core::markup::{normalize, parse, plain_text, serialize};
use nip_editor_core::{
    Document, FormatError, FormatPath, Position, RichTextEditor, Selection, StyleKind, TextRange,
    apply, range_to_selection, selection_to_range,
};

fn select(doc: &Document, start: usize, end: usize) -> Selection {
    range_to_selection(doc, TextRange::new(start, end)).expect("range inside document")
}

fn toggle_range(markup: &str, kind: StyleKind, start: usize, end: usize) -> String {
    let mut doc = parse(markup);
    let sel = select(&doc, start, end);
    apply(&mut doc, kind, sel).expect("selection in bounds");
    serialize(&doc)
}

#[test]
fn caret_at_end_of_hello() {
    let mut doc = parse("Hello");
    let caret = Selection::caret(Position::new(doc.text_nodes()[0], 5));
    let out = apply(&mut doc, StyleKind::Bold, caret).unwrap();

    assert_eq!(serialize(&doc), "Hello<strong>\u{200B}</strong>");
    let placeholder = out.selection.focus.node;
    assert_eq!(doc.text(placeholder), Some("\u{200B}"));
    assert_eq!(out.selection.focus.offset, 1);
}

#[test]
fn world_toggled_on_and_off() {
    let mut doc = parse("Hello World");
    let sel = select(&doc, 6, 11);
    let on = apply(&mut doc, StyleKind::Bold, sel).unwrap();
    assert_eq!(serialize(&doc), "Hello <strong>World</strong>");

    let off = apply(&mut doc, StyleKind::Bold, on.selection).unwrap();
    assert_eq!(off.path, FormatPath::Unwrapped);
    assert_eq!(serialize(&doc), "Hello World");
    assert_eq!(
        selection_to_range(&doc, &off.selection),
        Some(TextRange::new(6, 11))
    );
}

#[test]
fn bold_nests_inside_existing_italic() {
    assert_eq!(
        toggle_range("Hello <em>World</em>", StyleKind::Bold, 6, 11),
        "Hello <em><strong>World</strong></em>"
    );
}

#[test]
fn toggling_twice_restores_markup_and_selection() {
    let cases = [
        ("plain text here", 6, 10),
        ("a <em>mixed</em> line", 0, 5),
        ("a <em>mixed</em> line", 0, 7),
        ("ab<strong>cd</strong>", 0, 3),
        ("x<strong>yy</strong>z and more", 0, 9),
        ("<u>under</u> and over", 2, 4),
        ("one<br>two", 1, 5),
    ];
    for kind in StyleKind::ALL {
        for (markup, start, end) in cases {
            let mut doc = parse(markup);
            let before = serialize(&doc);
            let before_text = plain_text(&doc);
            let sel = select(&doc, start, end);
            let first = apply(&mut doc, kind, sel).unwrap();
            let second = apply(&mut doc, kind, first.selection).unwrap();

            // Switching a style on and off again restores the markup. Starting
            // inside a span of the kind removes the whole span, so only the
            // text comes back then.
            if first.path == FormatPath::Wrapped {
                assert_eq!(serialize(&doc), before, "{kind} on {markup:?}");
            } else {
                assert_eq!(first.path, FormatPath::Unwrapped, "{kind} on {markup:?}");
                assert_eq!(plain_text(&doc), before_text, "{kind} on {markup:?}");
            }
            assert_eq!(
                selection_to_range(&doc, &second.selection),
                Some(TextRange::new(start, end)),
                "{kind} on {markup:?}"
            );
        }
    }
}

#[test]
fn wrapping_never_nests_same_kind() {
    let out = toggle_range("x<strong>yy</strong>z and more", StyleKind::Bold, 0, 9);
    assert_eq!(out.matches("<strong>").count(), 1, "{out}");
    assert_eq!(plain_text(&parse(&out)), "xyyz and more");
}

#[test]
fn selection_stays_inside_document() {
    let inputs = ["Hello World", "<em>a</em>b<u>c</u>", "x<br>y"];
    for input in inputs {
        let mut doc = parse(input);
        let len = plain_text(&doc).chars().count();
        for kind in StyleKind::ALL {
            let sel = select(&doc, 0, len.min(2));
            let out = apply(&mut doc, kind, sel).unwrap();
            let range = selection_to_range(&doc, &out.selection);
            assert!(range.is_some(), "{kind} on {input:?}");
        }
    }
}

#[test]
fn out_of_bounds_leaves_document_unchanged() {
    let mut doc = parse("Hello <strong>World</strong>");
    let before = serialize(&doc);
    let root = doc.root();
    let bad = Selection::new(Position::new(root, 0), Position::new(root, 7));

    assert_eq!(
        apply(&mut doc, StyleKind::Italic, bad),
        Err(FormatError::SelectionOutOfBounds)
    );
    assert_eq!(serialize(&doc), before);
}

#[test]
fn serialized_output_round_trips() {
    let mut doc = parse("Fish &amp; <b>chips</b>&nbsp;today");
    let sel = select(&doc, 0, 4);
    apply(&mut doc, StyleKind::Underline, sel).unwrap();
    let once = serialize(&doc);
    assert_eq!(normalize(&once), once);
    insta::assert_snapshot!(once, @"<u>Fish</u> &amp; <strong>chips</strong>&nbsp;today");
}

#[test]
fn placeholder_survives_blur() {
    let mut values = Vec::new();
    let mut editor = RichTextEditor::new("Hello");
    editor
        .toggle(StyleKind::Bold, &mut |v: String| values.push(v))
        .unwrap();
    editor.blur(&mut |v: String| values.push(v));

    assert_eq!(values.last().map(String::as_str), Some("Hello<strong>\u{200B}</strong>"));
}
