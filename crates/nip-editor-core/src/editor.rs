//! Per-field rich-text editor state.
//!
//! A [`RichTextEditor`] owns one document and its selection. The surface
//! feeds it focus changes, selection changes, typed text and key presses;
//! every edit is reported once to a [`DraftSink`].

use std::time::Duration;

use tracing::{debug, trace};
use web_time::Instant;

use crate::actions::{KeyCombo, KeydownResult, Keybindings};
use crate::document::{Document, NodeKind};
use crate::echo::{DEFAULT_ECHO_WINDOW, EchoGuard};
use crate::edit::{delete_range, insert_text};
use crate::format::{FormatError, FormatOutcome, apply};
use crate::markup::{normalize, parse, serialize};
use crate::offsets::{is_valid_position, range_to_selection, selection_to_range};
use crate::types::{Position, Selection, StyleKind, TextRange};

/// Receives the serialized value after each discrete edit.
pub trait DraftSink {
    fn on_change(&mut self, value: String);
}

impl<F: FnMut(String)> DraftSink for F {
    fn on_change(&mut self, value: String) {
        self(value)
    }
}

/// What happened to a value pushed in from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The value matches what the editor already shows.
    Unchanged,
    /// Arrived inside the echo window of the editor's own edit.
    Suppressed,
    /// The document was re-parsed from the new value.
    Reparsed,
}

#[derive(Debug, Clone)]
pub struct RichTextEditor {
    doc: Document,
    selection: Option<Selection>,
    saved_selection: Option<Selection>,
    focused: bool,
    last_value: String,
    echo: EchoGuard,
    keybindings: Keybindings,
}

impl RichTextEditor {
    pub fn new(value: &str) -> Self {
        Self::with_echo_window(value, DEFAULT_ECHO_WINDOW)
    }

    pub fn with_echo_window(value: &str, window: Duration) -> Self {
        Self {
            doc: parse(value),
            selection: None,
            saved_selection: None,
            focused: false,
            last_value: value.to_owned(),
            echo: EchoGuard::new(window),
            keybindings: Keybindings::default(),
        }
    }

    pub fn with_keybindings(mut self, keybindings: Keybindings) -> Self {
        self.keybindings = keybindings;
        self
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Current serialized value.
    pub fn value(&self) -> String {
        serialize(&self.doc)
    }

    /// Live selection while focused.
    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    /// Selection captured by the last blur, if no command has used it yet.
    pub fn saved_selection(&self) -> Option<Selection> {
        self.saved_selection
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn echo_guard(&self) -> &EchoGuard {
        &self.echo
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    /// Capture the selection and report the current value.
    pub fn blur(&mut self, sink: &mut impl DraftSink) {
        if let Some(selection) = self.selection.take() {
            self.saved_selection = Some(selection);
        }
        self.focused = false;
        self.emit(sink);
    }

    /// The user moved the selection.
    ///
    /// A fresh selection replaces whatever the last blur captured.
    pub fn set_selection(&mut self, selection: Selection) -> Result<(), FormatError> {
        if !is_valid_position(&self.doc, selection.anchor)
            || !is_valid_position(&self.doc, selection.focus)
        {
            return Err(FormatError::SelectionOutOfBounds);
        }
        self.selection = Some(selection);
        self.saved_selection = None;
        Ok(())
    }

    /// Select a flat text range.
    pub fn select_range(&mut self, range: TextRange) -> Result<(), FormatError> {
        let selection =
            range_to_selection(&self.doc, range).ok_or(FormatError::SelectionOutOfBounds)?;
        self.set_selection(selection)
    }

    /// Flat range of the live selection.
    pub fn selected_range(&self) -> Option<TextRange> {
        self.selection
            .and_then(|sel| selection_to_range(&self.doc, &sel))
    }

    /// Toggle a style, restoring the captured selection when unfocused.
    pub fn toggle(
        &mut self,
        kind: StyleKind,
        sink: &mut impl DraftSink,
    ) -> Result<FormatOutcome, FormatError> {
        if !self.focused {
            self.focus();
        }
        let selection = self
            .saved_selection
            .take()
            .or(self.selection)
            .unwrap_or_else(|| default_caret(&self.doc));

        let outcome = apply(&mut self.doc, kind, selection)?;
        self.selection = Some(outcome.selection);
        self.emit(sink);
        Ok(outcome)
    }

    /// Run the shortcut bound to `combo`, if any.
    pub fn handle_keydown(&mut self, combo: &KeyCombo, sink: &mut impl DraftSink) -> KeydownResult {
        let Some(action) = self.keybindings.lookup(combo) else {
            return Keybindings::classify_unbound(combo);
        };
        if let Err(error) = self.toggle(action.style(), sink) {
            debug!(?action, %error, "shortcut ignored");
        }
        KeydownResult::Handled
    }

    /// Replace the selection with typed text.
    pub fn type_text(&mut self, text: &str, sink: &mut impl DraftSink) -> Result<(), FormatError> {
        let selection = self.selection.unwrap_or_else(|| default_caret(&self.doc));
        let range =
            selection_to_range(&self.doc, &selection).ok_or(FormatError::SelectionOutOfBounds)?;

        let caret = if range.is_caret() {
            selection.focus
        } else {
            delete_range(&mut self.doc, range).map_err(|_| FormatError::SelectionOutOfBounds)?
        };
        let caret = insert_text(&mut self.doc, caret, text)
            .map_err(|_| FormatError::SelectionOutOfBounds)?;

        self.focused = true;
        self.selection = Some(Selection::caret(caret));
        self.emit(sink);
        Ok(())
    }

    /// A value arrived from outside the editor.
    pub fn sync_external(&mut self, value: &str) -> SyncOutcome {
        self.sync_external_at(value, Instant::now())
    }

    pub fn sync_external_at(&mut self, value: &str, now: Instant) -> SyncOutcome {
        if value == self.last_value {
            return SyncOutcome::Unchanged;
        }
        if self.echo.is_active_at(now) {
            trace!("ignoring value update inside echo window");
            return SyncOutcome::Suppressed;
        }
        self.last_value = value.to_owned();
        if normalize(value) == serialize(&self.doc) {
            return SyncOutcome::Unchanged;
        }

        self.doc = parse(value);
        self.saved_selection = None;
        self.selection = self.focused.then(|| default_caret(&self.doc));
        debug!(len = value.len(), "re-parsed field from external value");
        SyncOutcome::Reparsed
    }

    fn emit(&mut self, sink: &mut impl DraftSink) {
        let value = serialize(&self.doc);
        self.last_value.clone_from(&value);
        self.echo.mark();
        sink.on_change(value);
    }
}

/// Caret used when no selection exists: the end of the content, or the start
/// of an empty field.
pub fn default_caret(doc: &Document) -> Selection {
    let root = doc.root();
    let children = doc.children(root);
    let position = match children.last() {
        Some(last) => match doc.kind(*last) {
            Some(NodeKind::Text(_)) => Position::new(*last, doc.char_len(*last)),
            _ => Position::new(root, children.len()),
        },
        None => Position::new(root, 0),
    };
    Selection::caret(position)
}
