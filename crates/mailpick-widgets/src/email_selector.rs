#![forbid(unsafe_code)]

//! The composite `username@domain` selector.
//!
//! [`EmailSelector`] edits an [`EmailValue`] through two sub-fields: a free
//! text username and a domain picker. It implements [`ValueAccessor`], so a
//! host control receives its edits as [`ControlSignal`]s:
//!
//! - Username edits are debounced. A burst of keystrokes produces one
//!   `Changed` once the quiet period passes, carrying the latest value.
//! - Domain changes emit `Changed` immediately and cancel any pending
//!   username emission, since the immediate one already carries it.
//! - Leaving the selector emits `Touched`.
//!
//! # Key Bindings
//!
//! | Key | Username focused | Domain focused |
//! |-----|------------------|----------------|
//! | printable | append to username | ignored |
//! | Backspace | delete last character | ignored |
//! | Left / Right | ignored | previous / next domain |
//! | Tab / BackTab | focus domain | focus username |
//! | Esc | touched | touched |

use std::time::{Duration, Instant};

use mailpick_core::event::{Field, KeyInput, SelectorEvent};
use mailpick_core::{Debouncer, EmailValue};
use unicode_width::UnicodeWidthStr;

use crate::accessor::{ControlSignal, ValueAccessor};
use crate::config::{DEFAULT_DEBOUNCE, DEFAULT_DOMAINS, SelectorConfig};

/// Display columns reserved for the username when rendering.
pub const USERNAME_FIELD_WIDTH: usize = 16;

/// Placeholder shown in an empty username field.
pub const USERNAME_PLACEHOLDER: &str = "john";

/// Composite username and domain input.
#[derive(Debug, Clone)]
pub struct EmailSelector {
    domains: Vec<String>,
    value: EmailValue,
    focus: Field,
    debouncer: Debouncer<EmailValue>,
    disabled: bool,
    disposed: bool,
}

impl Default for EmailSelector {
    fn default() -> Self {
        Self::new(DEFAULT_DOMAINS)
    }
}

impl EmailSelector {
    /// Create a selector offering `domains`, with the default debounce.
    #[must_use]
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            domains: domains.into_iter().map(Into::into).collect(),
            value: EmailValue::default(),
            focus: Field::Username,
            debouncer: Debouncer::new(DEFAULT_DEBOUNCE),
            disabled: false,
            disposed: false,
        }
    }

    /// Create a selector from a loaded configuration.
    #[must_use]
    pub fn from_config(config: &SelectorConfig) -> Self {
        Self::new(config.domains.iter().cloned()).with_debounce(config.debounce)
    }

    /// Set the username debounce quiet period.
    #[must_use]
    pub fn with_debounce(mut self, quiet: Duration) -> Self {
        self.debouncer = Debouncer::new(quiet);
        self
    }

    /// The value as currently shown, including edits not yet emitted.
    #[must_use]
    pub fn value(&self) -> &EmailValue {
        &self.value
    }

    /// The domains offered by the picker.
    #[must_use]
    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    /// Position of the current domain in the picker.
    #[must_use]
    pub fn selected_domain_index(&self) -> Option<usize> {
        self.domains.iter().position(|d| *d == self.value.domain)
    }

    /// The focused sub-field.
    #[must_use]
    pub fn focus(&self) -> Field {
        self.focus
    }

    /// Move focus to `field`.
    pub fn set_focus(&mut self, field: Field) {
        self.focus = field;
    }

    /// Whether input is ignored.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Whether a username edit is waiting for the quiet period.
    #[must_use]
    pub fn has_pending_emit(&self) -> bool {
        self.debouncer.has_pending()
    }

    /// Whether [`dispose`](ValueAccessor::dispose) has run.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Render the selector as one line of text.
    ///
    /// The focused sub-field is drawn with a cursor (username) or picker
    /// arrows (domain).
    #[must_use]
    pub fn render_line(&self) -> String {
        let username_focused = self.focus == Field::Username && !self.disabled;
        let (text, cursor) = if self.value.username.is_empty() && !username_focused {
            (USERNAME_PLACEHOLDER, "")
        } else if username_focused {
            (self.value.username.as_str(), "_")
        } else {
            (self.value.username.as_str(), "")
        };
        let used = text.width() + cursor.width();
        let pad = USERNAME_FIELD_WIDTH.saturating_sub(used);

        let domain = if self.value.domain.is_empty() {
            "-"
        } else {
            self.value.domain.as_str()
        };
        let (open, close) = if self.focus == Field::Domain && !self.disabled {
            ('<', '>')
        } else {
            (' ', ' ')
        };

        format!(
            "[{}{text}{cursor}] @ [{open} {domain} {close}]",
            " ".repeat(pad)
        )
    }

    fn emit_username(&mut self, now: Instant) {
        self.debouncer.push_at(self.value.clone(), now);
    }

    fn emit_domain(&mut self, domain: String) -> ControlSignal<EmailValue> {
        self.value.domain = domain;
        if self.debouncer.cancel().is_some() {
            tracing::trace!("pending username emit folded into domain change");
        }
        ControlSignal::Changed(self.value.clone())
    }

    fn cycle_domain(&mut self, forward: bool) -> Option<ControlSignal<EmailValue>> {
        let len = self.domains.len();
        if len == 0 {
            return None;
        }
        let next = match (self.selected_domain_index(), forward) {
            (Some(i), true) => (i + 1) % len,
            (Some(i), false) => (i + len - 1) % len,
            (None, true) => 0,
            (None, false) => len - 1,
        };
        let domain = self.domains[next].clone();
        Some(self.emit_domain(domain))
    }

    fn handle_key(&mut self, key: KeyInput, now: Instant) -> Option<ControlSignal<EmailValue>> {
        match (self.focus, key) {
            (_, KeyInput::Tab | KeyInput::BackTab) => {
                self.focus = self.focus.toggle();
                None
            }
            (_, KeyInput::Esc) => Some(ControlSignal::Touched),
            (Field::Username, KeyInput::Char(c)) if !c.is_control() => {
                self.value.username.push(c);
                self.emit_username(now);
                None
            }
            (Field::Username, KeyInput::Backspace) => {
                if self.value.pop_username_grapheme() {
                    self.emit_username(now);
                }
                None
            }
            (Field::Domain, KeyInput::Left) => self.cycle_domain(false),
            (Field::Domain, KeyInput::Right) => self.cycle_domain(true),
            _ => None,
        }
    }
}

impl ValueAccessor for EmailSelector {
    type Value = EmailValue;
    type Event = SelectorEvent;

    fn write_value(&mut self, value: EmailValue) {
        // A model write replaces whatever the user had pending.
        self.debouncer.cancel();
        self.value = value;
    }

    fn handle_event_at(
        &mut self,
        event: &SelectorEvent,
        now: Instant,
    ) -> Option<ControlSignal<EmailValue>> {
        if self.disposed || self.disabled {
            return None;
        }
        match event {
            SelectorEvent::UsernameInput(text) => {
                self.value.username.clone_from(text);
                self.emit_username(now);
                None
            }
            SelectorEvent::DomainSelected(domain) => Some(self.emit_domain(domain.clone())),
            SelectorEvent::Blur => Some(ControlSignal::Touched),
            SelectorEvent::Key(key) => self.handle_key(*key, now),
        }
    }

    fn tick_at(&mut self, now: Instant) -> Option<ControlSignal<EmailValue>> {
        if self.disposed {
            return None;
        }
        self.debouncer.tick_at(now).map(ControlSignal::Changed)
    }

    fn time_until_tick(&self, now: Instant) -> Option<Duration> {
        self.debouncer.time_until_fire(now)
    }

    fn set_disabled(&mut self, disabled: bool) {
        if disabled {
            self.debouncer.cancel();
        }
        self.disabled = disabled;
    }

    fn dispose(&mut self) {
        self.debouncer.cancel();
        self.disposed = true;
    }
}
