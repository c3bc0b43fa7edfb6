//! Core editor types: style kinds, tree positions and selections.
//!
//! These types are independent of any rendering surface. A selection is always
//! passed to and returned from commands explicitly.

use std::fmt;

use crate::document::NodeId;

/// Zero-width space used to keep an empty formatting span focusable.
pub const PLACEHOLDER: char = '\u{200B}';

/// Inline style carried by a formatting span.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StyleKind {
    Bold,
    Italic,
    Underline,
}

impl StyleKind {
    pub const ALL: [StyleKind; 3] = [StyleKind::Bold, StyleKind::Italic, StyleKind::Underline];

    /// Tag name used when serializing a span of this kind.
    pub fn tag_name(self) -> &'static str {
        match self {
            StyleKind::Bold => "strong",
            StyleKind::Italic => "em",
            StyleKind::Underline => "u",
        }
    }

    /// Map a (lowercase) markup tag to a style kind.
    ///
    /// Legacy presentational tags are accepted and normalize to the semantic
    /// form on serialization.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "strong" | "b" => Some(StyleKind::Bold),
            "em" | "i" => Some(StyleKind::Italic),
            "u" => Some(StyleKind::Underline),
            _ => None,
        }
    }

    /// Shortcut key bound to this style (with the platform modifier).
    pub fn shortcut_key(self) -> &'static str {
        match self {
            StyleKind::Bold => "b",
            StyleKind::Italic => "i",
            StyleKind::Underline => "u",
        }
    }
}

impl fmt::Display for StyleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StyleKind::Bold => "bold",
            StyleKind::Italic => "italic",
            StyleKind::Underline => "underline",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for StyleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bold" | "b" => Ok(StyleKind::Bold),
            "italic" | "i" => Ok(StyleKind::Italic),
            "underline" | "u" => Ok(StyleKind::Underline),
            other => Err(format!("unknown style kind: {other}")),
        }
    }
}

/// A point in the document tree.
///
/// For text nodes `offset` counts chars into the text. For the root and for
/// spans it is a child index, the way DOM boundary points work.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Position {
    pub node: NodeId,
    pub offset: usize,
}

impl Position {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// Selection with anchor and focus positions.
///
/// The anchor is where the selection started, the focus is where it ends now.
/// They may be in either document order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Position,
    pub focus: Position,
}

impl Selection {
    pub fn new(anchor: Position, focus: Position) -> Self {
        Self { anchor, focus }
    }

    /// Create a collapsed selection (caret).
    pub fn caret(at: Position) -> Self {
        Self {
            anchor: at,
            focus: at,
        }
    }

    /// Select all children of a container node.
    pub fn contents_of(node: NodeId, child_count: usize) -> Self {
        Self {
            anchor: Position::new(node, 0),
            focus: Position::new(node, child_count),
        }
    }

    /// True when anchor and focus are the same tree position.
    ///
    /// Two distinct positions that map to the same text offset still count as
    /// a range here; commands resolve that through [`TextRange`].
    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

/// A range in the flattened text of a document, measured in chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn caret(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    pub fn is_caret(&self) -> bool {
        self.start == self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Normalize range so start <= end.
    pub fn normalize(self) -> Self {
        if self.start <= self.end {
            self
        } else {
            Self {
                start: self.end,
                end: self.start,
            }
        }
    }
}

impl From<std::ops::Range<usize>> for TextRange {
    fn from(r: std::ops::Range<usize>) -> Self {
        Self::new(r.start, r.end)
    }
}

impl From<TextRange> for std::ops::Range<usize> {
    fn from(r: TextRange) -> Self {
        r.start..r.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_kind_tags() {
        assert_eq!(StyleKind::from_tag("b"), Some(StyleKind::Bold));
        assert_eq!(StyleKind::from_tag("strong"), Some(StyleKind::Bold));
        assert_eq!(StyleKind::from_tag("i"), Some(StyleKind::Italic));
        assert_eq!(StyleKind::from_tag("span"), None);
        for kind in StyleKind::ALL {
            assert_eq!(StyleKind::from_tag(kind.tag_name()), Some(kind));
        }
    }

    #[test]
    fn test_style_kind_parse() {
        assert_eq!("Bold".parse::<StyleKind>(), Ok(StyleKind::Bold));
        assert_eq!("u".parse::<StyleKind>(), Ok(StyleKind::Underline));
        assert!("strike".parse::<StyleKind>().is_err());
    }

    #[test]
    fn test_text_range_normalize() {
        let r = TextRange::new(10, 5).normalize();
        assert_eq!(r, TextRange::new(5, 10));
        assert_eq!(r.len(), 5);
        assert!(TextRange::caret(3).is_caret());
    }
}
