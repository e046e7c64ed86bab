#![forbid(unsafe_code)]

//! Input events understood by the email selector.
//!
//! The selector accepts two granularities of input:
//!
//! - Field-level events ([`SelectorEvent::UsernameInput`],
//!   [`SelectorEvent::DomainSelected`], [`SelectorEvent::Blur`]) carrying the
//!   full new field content, as a host toolkit reports them.
//! - Key-level events ([`SelectorEvent::Key`]) for terminal hosts that only
//!   deliver keystrokes. The widget folds these into field-level edits.

/// The two sub-fields of the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Field {
    /// Free-text username input.
    #[default]
    Username,
    /// Domain picker.
    Domain,
}

impl Field {
    /// The other sub-field.
    #[must_use]
    pub fn toggle(self) -> Self {
        match self {
            Self::Username => Self::Domain,
            Self::Domain => Self::Username,
        }
    }
}

/// A single editing keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyInput {
    /// A printable character.
    Char(char),
    /// Delete the last grapheme of the username.
    Backspace,
    /// Previous domain (when the domain picker has focus).
    Left,
    /// Next domain (when the domain picker has focus).
    Right,
    /// Move focus to the other sub-field.
    Tab,
    /// Move focus to the other sub-field (reverse).
    BackTab,
    /// Leave the selector entirely.
    Esc,
}

/// An event delivered to the selector widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorEvent {
    /// The username text field now contains this text.
    UsernameInput(String),
    /// The domain picker now shows this domain.
    DomainSelected(String),
    /// Focus left the selector.
    Blur,
    /// A raw keystroke.
    Key(KeyInput),
}

impl From<KeyInput> for SelectorEvent {
    fn from(key: KeyInput) -> Self {
        Self::Key(key)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl KeyInput {
    /// Map a crossterm key event to a selector keystroke.
    ///
    /// Returns `None` for key releases, modifier chords, and keys the
    /// selector does not handle.
    #[must_use]
    pub fn from_crossterm(event: &crossterm::event::KeyEvent) -> Option<Self> {
        use crossterm::event::{KeyCode, KeyEventKind, KeyModifiers};

        if event.kind == KeyEventKind::Release {
            return None;
        }
        if event
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
        {
            return None;
        }
        match event.code {
            KeyCode::Char(c) => Some(Self::Char(c)),
            KeyCode::Backspace => Some(Self::Backspace),
            KeyCode::Left => Some(Self::Left),
            KeyCode::Right => Some(Self::Right),
            KeyCode::Tab => Some(Self::Tab),
            KeyCode::BackTab => Some(Self::BackTab),
            KeyCode::Esc => Some(Self::Esc),
            _ => None,
        }
    }
}
