//! Editor actions and keyboard input types.
//!
//! Platform-agnostic definitions: the surface converts its native key events
//! into a [`KeyCombo`] and asks a [`Keybindings`] table for the action.

use std::collections::HashMap;

use smol_str::SmolStr;

use crate::types::StyleKind;

/// Semantic operations on a rich-text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorAction {
    /// Toggle bold on the current selection.
    ToggleBold,
    /// Toggle italic on the current selection.
    ToggleItalic,
    /// Toggle underline on the current selection.
    ToggleUnderline,
}

impl EditorAction {
    pub fn toggle(kind: StyleKind) -> Self {
        match kind {
            StyleKind::Bold => Self::ToggleBold,
            StyleKind::Italic => Self::ToggleItalic,
            StyleKind::Underline => Self::ToggleUnderline,
        }
    }

    /// Style a toggle action applies.
    pub fn style(self) -> StyleKind {
        match self {
            Self::ToggleBold => StyleKind::Bold,
            Self::ToggleItalic => StyleKind::Italic,
            Self::ToggleUnderline => StyleKind::Underline,
        }
    }
}

/// Key values for keyboard input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A character key.
    Character(SmolStr),

    /// Unknown/unidentified key.
    Unidentified,

    // === Editing ===
    Backspace,
    Delete,
    Enter,
    Tab,
    Escape,

    // === Navigation ===
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    PageUp,
    PageDown,

    // === Modifiers ===
    Alt,
    Control,
    Meta,
    Shift,
}

impl Key {
    /// Create a character key.
    ///
    /// Single characters are lowercased so `Ctrl+B` with caps lock on still
    /// matches the binding for `b`.
    pub fn character(s: impl Into<SmolStr>) -> Self {
        let s: SmolStr = s.into();
        if s.chars().count() == 1 && s.chars().any(|c| c.is_uppercase()) {
            Self::Character(SmolStr::from(s.to_lowercase()))
        } else {
            Self::Character(s)
        }
    }

    /// Parse a DOM `KeyboardEvent.key` value.
    pub fn from_dom(key: &str) -> Self {
        match key {
            "Backspace" => Self::Backspace,
            "Delete" => Self::Delete,
            "Enter" => Self::Enter,
            "Tab" => Self::Tab,
            "Escape" => Self::Escape,
            "ArrowLeft" => Self::ArrowLeft,
            "ArrowRight" => Self::ArrowRight,
            "ArrowUp" => Self::ArrowUp,
            "ArrowDown" => Self::ArrowDown,
            "Home" => Self::Home,
            "End" => Self::End,
            "PageUp" => Self::PageUp,
            "PageDown" => Self::PageDown,
            "Alt" => Self::Alt,
            "Control" => Self::Control,
            "Meta" => Self::Meta,
            "Shift" => Self::Shift,
            "" | "Unidentified" => Self::Unidentified,
            other => Self::character(other),
        }
    }

    /// Check if this is a navigation key.
    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Self::ArrowLeft
                | Self::ArrowRight
                | Self::ArrowUp
                | Self::ArrowDown
                | Self::Home
                | Self::End
                | Self::PageUp
                | Self::PageDown
        )
    }

    /// Check if this is a modifier key.
    pub fn is_modifier(&self) -> bool {
        matches!(self, Self::Alt | Self::Control | Self::Meta | Self::Shift)
    }
}

/// Modifier key state for a key combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        ..Self::NONE
    };

    pub const META: Self = Self {
        meta: true,
        ..Self::NONE
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };

    /// Get the primary modifier for the platform (Cmd on Mac, Ctrl elsewhere).
    pub fn primary(is_mac: bool) -> Self {
        if is_mac { Self::META } else { Self::CTRL }
    }

    /// Ctrl or Meta held, regardless of platform.
    pub fn has_command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// A key combination for triggering an action.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyCombo {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn ctrl(key: Key) -> Self {
        Self::with_modifiers(key, Modifiers::CTRL)
    }

    pub fn meta(key: Key) -> Self {
        Self::with_modifiers(key, Modifiers::META)
    }

    pub fn primary(key: Key, is_mac: bool) -> Self {
        Self::with_modifiers(key, Modifiers::primary(is_mac))
    }
}

/// Result of handling a keydown event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeydownResult {
    /// Event was handled, prevent default.
    Handled,
    /// Event was not a keybinding, let the surface handle it.
    NotHandled,
    /// Event should be passed through (navigation, modifiers).
    PassThrough,
}

/// Keyboard shortcut table.
///
/// The default table binds b, i and u with Ctrl and with Meta on every
/// platform, so a Linux user with a Mac keyboard layout and the reverse both
/// work.
#[derive(Debug, Clone)]
pub struct Keybindings {
    bindings: HashMap<KeyCombo, EditorAction>,
}

impl Default for Keybindings {
    fn default() -> Self {
        let mut bindings = HashMap::new();
        for kind in StyleKind::ALL {
            let key = Key::character(kind.shortcut_key());
            bindings.insert(KeyCombo::ctrl(key.clone()), EditorAction::toggle(kind));
            bindings.insert(KeyCombo::meta(key), EditorAction::toggle(kind));
        }
        Self { bindings }
    }
}

impl Keybindings {
    /// An empty table.
    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    pub fn bind(&mut self, combo: KeyCombo, action: EditorAction) -> Option<EditorAction> {
        self.bindings.insert(combo, action)
    }

    pub fn unbind(&mut self, combo: &KeyCombo) -> Option<EditorAction> {
        self.bindings.remove(combo)
    }

    pub fn lookup(&self, combo: &KeyCombo) -> Option<EditorAction> {
        self.bindings.get(combo).copied()
    }

    /// Classify a key combination that has no binding.
    pub fn classify_unbound(combo: &KeyCombo) -> KeydownResult {
        if combo.key.is_navigation() || combo.key.is_modifier() {
            KeydownResult::PassThrough
        } else {
            KeydownResult::NotHandled
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bindings_cover_ctrl_and_meta() {
        let bindings = Keybindings::default();
        for (key, action) in [
            ("b", EditorAction::ToggleBold),
            ("i", EditorAction::ToggleItalic),
            ("u", EditorAction::ToggleUnderline),
        ] {
            assert_eq!(bindings.lookup(&KeyCombo::ctrl(Key::character(key))), Some(action));
            assert_eq!(bindings.lookup(&KeyCombo::meta(Key::character(key))), Some(action));
        }
    }

    #[test]
    fn test_unmodified_and_shifted_keys_are_unbound() {
        let bindings = Keybindings::default();
        assert_eq!(bindings.lookup(&KeyCombo::new(Key::character("b"))), None);
        let ctrl_shift = Modifiers {
            shift: true,
            ..Modifiers::CTRL
        };
        assert_eq!(
            bindings.lookup(&KeyCombo::with_modifiers(Key::character("b"), ctrl_shift)),
            None
        );
    }

    #[test]
    fn test_character_keys_are_case_insensitive() {
        assert_eq!(Key::from_dom("B"), Key::character("b"));
        assert_eq!(Key::from_dom("ArrowLeft"), Key::ArrowLeft);
        assert_eq!(Key::from_dom("Unidentified"), Key::Unidentified);
    }

    #[test]
    fn test_classify_unbound() {
        assert_eq!(
            Keybindings::classify_unbound(&KeyCombo::new(Key::ArrowLeft)),
            KeydownResult::PassThrough
        );
        assert_eq!(
            Keybindings::classify_unbound(&KeyCombo::new(Key::Control)),
            KeydownResult::PassThrough
        );
        assert_eq!(
            Keybindings::classify_unbound(&KeyCombo::ctrl(Key::character("s"))),
            KeydownResult::NotHandled
        );
    }

    #[test]
    fn test_rebinding() {
        let mut bindings = Keybindings::empty();
        let combo = KeyCombo::primary(Key::character("k"), true);
        assert_eq!(bindings.bind(combo.clone(), EditorAction::ToggleUnderline), None);
        assert_eq!(bindings.lookup(&combo), Some(EditorAction::ToggleUnderline));
        assert_eq!(bindings.unbind(&combo), Some(EditorAction::ToggleUnderline));
        assert_eq!(bindings.lookup(&combo), None);
    }
}
