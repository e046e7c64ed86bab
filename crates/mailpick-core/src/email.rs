#![forbid(unsafe_code)]

//! The `username@domain` value edited by the selector.

use std::fmt;

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// An email address split into the part the user types and the part the
/// user picks from a list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailValue {
    /// Local part, typed by the user.
    pub username: String,
    /// Domain, selected from the configured domain list.
    pub domain: String,
}

impl EmailValue {
    /// Create a value from its two parts.
    #[must_use]
    pub fn new(username: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            domain: domain.into(),
        }
    }

    /// Both parts are non-empty.
    ///
    /// Validators skip incomplete values; an empty username or domain is
    /// never reported as an error.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.domain.is_empty()
    }

    /// The joined address, if both parts are present.
    #[must_use]
    pub fn address(&self) -> Option<String> {
        self.is_complete().then(|| self.to_string())
    }

    /// Remove the last user-perceived character of the username.
    ///
    /// Returns `false` when the username was already empty.
    pub fn pop_username_grapheme(&mut self) -> bool {
        match self.username.grapheme_indices(true).next_back() {
            Some((idx, _)) => {
                self.username.truncate(idx);
                true
            }
            None => false,
        }
    }

    /// Number of user-perceived characters in the username.
    #[must_use]
    pub fn username_width(&self) -> usize {
        self.username.graphemes(true).count()
    }
}

impl fmt::Display for EmailValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.username, self.domain)
    }
}
