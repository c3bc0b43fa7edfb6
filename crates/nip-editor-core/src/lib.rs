//! nip-editor-core: rich-text field editing without framework dependencies.
//!
//! This crate provides:
//! - `Document` - arena tree of text runs, formatting spans and line breaks
//! - `markup` - the fragment codec used for field values
//! - `format::apply` - bold/italic/underline toggling with selection tracking
//! - `RichTextEditor` - per-field state: focus, shortcuts, echo suppression

pub mod actions;
pub mod document;
pub mod echo;
pub mod edit;
pub mod editor;
pub mod format;
pub mod markup;
pub mod offsets;
pub mod types;

pub use actions::{EditorAction, Key, KeyCombo, KeydownResult, Keybindings, Modifiers};
pub use document::{Absorbed, Document, NodeId, NodeKind, StructureError};
pub use echo::{DEFAULT_ECHO_WINDOW, EchoGuard};
pub use editor::{DraftSink, RichTextEditor, SyncOutcome, default_caret};
pub use format::{FormatError, FormatOutcome, FormatPath, apply};
pub use offsets::{Bias, position_to_offset, range_to_selection, selection_to_range};
pub use smol_str::SmolStr;
pub use types::{PLACEHOLDER, Position, Selection, StyleKind, TextRange};
