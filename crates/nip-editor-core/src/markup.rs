//! Markup codec for rich-text field values.
//!
//! Field values travel through the draft store as small HTML fragments. Only
//! inline formatting and line breaks are meaningful; anything else is kept as
//! plain content so a value pasted from elsewhere never loses text.

use std::borrow::Cow;
use std::fmt;

use markdown_weaver_escape::{FmtWriter, escape_html_body_text};
use smol_str::SmolStr;

use crate::document::{Document, NodeId, NodeKind};
use crate::types::{PLACEHOLDER, StyleKind};

const NBSP: char = '\u{00A0}';

/// Parse a markup fragment into a document.
///
/// Parsing never fails: unknown tags are dropped (keeping their content),
/// stray closing tags are ignored and unclosed spans end with the input.
pub fn parse(markup: &str) -> Document {
    let mut doc = Document::new();
    let mut stack: Vec<(NodeId, StyleKind)> = Vec::new();
    let mut has_content = false;
    let mut text_start = 0;
    let mut i = 0;

    while i < markup.len() {
        let rest = &markup[i..];
        if rest.starts_with("<!--") {
            flush_text(&mut doc, &stack, &markup[text_start..i], &mut has_content);
            i = match rest.find("-->") {
                Some(end) => i + end + 3,
                None => markup.len(),
            };
            text_start = i;
            continue;
        }
        if rest.starts_with('<') && looks_like_tag(rest) {
            if let Some(close) = rest.find('>') {
                flush_text(&mut doc, &stack, &markup[text_start..i], &mut has_content);
                let tag = Tag::parse(&rest[1..close]);
                apply_tag(&mut doc, &mut stack, tag, &mut has_content);
                i += close + 1;
                text_start = i;
                continue;
            }
        }
        i += rest.chars().next().map(char::len_utf8).unwrap_or(1);
    }
    flush_text(&mut doc, &stack, &markup[text_start..], &mut has_content);

    doc
}

/// Serialize a document back into markup.
pub fn serialize(doc: &Document) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_children(doc, doc.root(), &mut out);
    out
}

/// Visible text of a document: line breaks become newlines and placeholders
/// are dropped.
pub fn plain_text(doc: &Document) -> String {
    let mut out = String::new();
    for node in doc.descendants(doc.root()) {
        match doc.kind(node) {
            Some(NodeKind::Text(s)) => out.extend(s.chars().filter(|c| *c != PLACEHOLDER)),
            Some(NodeKind::LineBreak) => out.push('\n'),
            _ => {}
        }
    }
    out
}

/// Convert a markup fragment to plain text.
pub fn to_plain_text(markup: &str) -> String {
    plain_text(&parse(markup))
}

/// Convert plain text to markup, turning newlines into `<br>`.
pub fn from_plain_text(text: &str) -> String {
    let mut doc = Document::new();
    let root = doc.root();
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            let br = doc.create_line_break();
            let _ = doc.append_child(root, br);
        }
        if !line.is_empty() {
            let t = doc.create_text(line);
            let _ = doc.append_child(root, t);
        }
    }
    serialize(&doc)
}

/// Parse then serialize, normalizing tag spellings and entity usage.
pub fn normalize(markup: &str) -> String {
    serialize(&parse(markup))
}

fn write_children(doc: &Document, id: NodeId, out: &mut String) -> fmt::Result {
    for child in doc.children(id) {
        write_node(doc, *child, out)?;
    }
    Ok(())
}

fn write_node(doc: &Document, id: NodeId, out: &mut String) -> fmt::Result {
    match doc.kind(id) {
        Some(NodeKind::Text(text)) => write_text(text, out),
        Some(NodeKind::Span(kind)) => {
            let tag = kind.tag_name();
            out.push('<');
            out.push_str(tag);
            out.push('>');
            write_children(doc, id, out)?;
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
            Ok(())
        }
        Some(NodeKind::LineBreak) => {
            out.push_str("<br>");
            Ok(())
        }
        Some(NodeKind::Root) => write_children(doc, id, out),
        None => Ok(()),
    }
}

fn write_text(text: &str, out: &mut String) -> fmt::Result {
    for (i, piece) in text.split(NBSP).enumerate() {
        if i > 0 {
            out.push_str("&nbsp;");
        }
        escape_html_body_text(FmtWriter(&mut *out), piece)?;
    }
    Ok(())
}

fn looks_like_tag(rest: &str) -> bool {
    rest[1..]
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '/' || c == '!')
}

/// A parsed start or end tag. Attributes are not kept.
struct Tag {
    name: SmolStr,
    closing: bool,
    self_closing: bool,
}

impl Tag {
    fn parse(inner: &str) -> Self {
        let inner = inner.trim();
        let (closing, inner) = match inner.strip_prefix('/') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, inner),
        };
        let self_closing = inner.ends_with('/');
        let name: String = inner
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Self {
            name: SmolStr::from(name),
            closing,
            self_closing,
        }
    }
}

fn current_parent(doc: &Document, stack: &[(NodeId, StyleKind)]) -> NodeId {
    stack.last().map(|(id, _)| *id).unwrap_or_else(|| doc.root())
}

fn apply_tag(
    doc: &mut Document,
    stack: &mut Vec<(NodeId, StyleKind)>,
    tag: Tag,
    has_content: &mut bool,
) {
    let parent = current_parent(doc, stack);

    if tag.closing {
        if let Some(kind) = StyleKind::from_tag(&tag.name) {
            if let Some(pos) = stack.iter().rposition(|(_, k)| *k == kind) {
                stack.truncate(pos);
            }
        }
        return;
    }

    if let Some(kind) = StyleKind::from_tag(&tag.name) {
        let span = doc.create_span(kind);
        if doc.append_child(parent, span).is_ok() && !tag.self_closing {
            stack.push((span, kind));
        }
        return;
    }

    match tag.name.as_str() {
        "br" => {
            let br = doc.create_line_break();
            if doc.append_child(parent, br).is_ok() {
                *has_content = true;
            }
        }
        "div" | "p" if *has_content => {
            let br = doc.create_line_break();
            let _ = doc.append_child(parent, br);
        }
        other => {
            tracing::trace!(tag = other, "dropping unsupported tag");
        }
    }
}

fn flush_text(
    doc: &mut Document,
    stack: &[(NodeId, StyleKind)],
    raw: &str,
    has_content: &mut bool,
) {
    if raw.is_empty() {
        return;
    }
    let text = decode_entities(raw);
    let parent = current_parent(doc, stack);

    // Merge with a directly preceding text run so parsing is canonical.
    if let Some(last) = doc.children(parent).last().copied() {
        if let Some(existing) = doc.text(last) {
            let merged = format!("{existing}{text}");
            let _ = doc.set_text(last, merged);
            *has_content = true;
            return;
        }
    }
    let node = doc.create_text(text.into_owned());
    if doc.append_child(parent, node).is_ok() {
        *has_content = true;
    }
}

/// Decode the character references a contenteditable surface produces.
fn decode_entities(raw: &str) -> Cow<'_, str> {
    if !raw.contains('&') {
        return Cow::Borrowed(raw);
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .find(';')
            .filter(|semi| *semi <= 10)
            .and_then(|semi| decode_entity(&tail[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(NBSP),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}
