#![forbid(unsafe_code)]

//! Wiring between a [`ValueAccessor`] and the [`FormControl`] it edits.
//!
//! [`BoundControl`] owns both halves. Input events go to the widget, the
//! widget's signals go to the control, and ticks drive the widget's debounce
//! and the control's async validation in that order.
//!
//! ```
//! use std::time::{Duration, Instant};
//! use mailpick_core::EmailValue;
//! use mailpick_core::event::SelectorEvent;
//! use mailpick_validation::{AvailabilityChecker, UsernameFormat};
//! use mailpick_widgets::{BoundControl, EmailSelector, FormControl};
//!
//! let t0 = Instant::now();
//! let control = FormControl::new(EmailValue::new("john", "sreyaj.dev"))
//!     .with_validator(UsernameFormat::new())
//!     .with_async_validator(AvailabilityChecker::with_mock_directory());
//! let mut bound = BoundControl::new_at(EmailSelector::default(), control, t0);
//!
//! bound.handle_event_at(&SelectorEvent::DomainSelected("adi.so".into()), t0);
//! assert!(bound.control().is_loading());
//!
//! bound.tick_at(t0 + Duration::from_secs(1));
//! assert_eq!(bound.control().get_error("email"), Some("Email already exists."));
//! ```

use std::time::{Duration, Instant};

use crate::accessor::{ControlSignal, ValueAccessor};
use crate::control::{ControlStatus, FormControl};

/// What changed during one [`BoundControl`] step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BindingUpdate {
    /// The widget emitted a new value.
    pub value_changed: bool,
    /// The widget reported focus loss.
    pub touched: bool,
    /// An async check resolved with this status.
    pub resolved: Option<ControlStatus>,
}

impl BindingUpdate {
    /// Whether anything happened.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.value_changed && !self.touched && self.resolved.is_none()
    }
}

/// A widget registered as the value accessor of a control.
#[derive(Debug)]
pub struct BoundControl<A: ValueAccessor> {
    accessor: A,
    control: FormControl<A::Value>,
}

impl<A: ValueAccessor> BoundControl<A> {
    /// Register `accessor` with `control` at `now`.
    ///
    /// The control's value is written into the widget and validation runs
    /// once, as on first render.
    pub fn new_at(mut accessor: A, mut control: FormControl<A::Value>, now: Instant) -> Self {
        accessor.write_value(control.value().clone());
        accessor.set_disabled(control.is_disabled());
        control.update_value_and_validity_at(now);
        Self { accessor, control }
    }

    /// The widget.
    #[must_use]
    pub fn accessor(&self) -> &A {
        &self.accessor
    }

    /// The widget, mutably (focus changes and the like).
    pub fn accessor_mut(&mut self) -> &mut A {
        &mut self.accessor
    }

    /// The control.
    #[must_use]
    pub fn control(&self) -> &FormControl<A::Value> {
        &self.control
    }

    /// Feed one input event through the widget into the control.
    pub fn handle_event_at(&mut self, event: &A::Event, now: Instant) -> BindingUpdate {
        let mut update = BindingUpdate::default();
        if let Some(signal) = self.accessor.handle_event_at(event, now) {
            self.route(signal, now, &mut update);
        }
        update
    }

    /// Advance the widget's debounce, then the control's async check.
    pub fn tick_at(&mut self, now: Instant) -> BindingUpdate {
        let mut update = BindingUpdate::default();
        if let Some(signal) = self.accessor.tick_at(now) {
            self.route(signal, now, &mut update);
        }
        update.resolved = self.control.tick_at(now);
        update
    }

    /// Push a model value into both halves without dirtying the control.
    pub fn set_value_at(&mut self, value: A::Value, now: Instant) {
        self.accessor.write_value(value.clone());
        self.control.set_value_at(value, now);
    }

    /// Disable or enable both halves.
    pub fn set_disabled_at(&mut self, disabled: bool, now: Instant) {
        self.accessor.set_disabled(disabled);
        if disabled {
            self.control.disable_at(now);
        } else {
            self.control.enable_at(now);
        }
    }

    /// Earliest time something may happen on a tick, if anything is waiting.
    #[must_use]
    pub fn time_until_next_tick(&self, now: Instant) -> Option<Duration> {
        match (
            self.accessor.time_until_tick(now),
            self.control.time_until_ready(now),
        ) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Tear down both halves. Nothing is emitted or validated afterwards.
    pub fn dispose_at(&mut self, now: Instant) {
        self.accessor.dispose();
        self.control.dispose_at(now);
    }

    fn route(&mut self, signal: ControlSignal<A::Value>, now: Instant, update: &mut BindingUpdate) {
        match signal {
            ControlSignal::Changed(value) => {
                self.control.on_change_at(value, now);
                update.value_changed = true;
            }
            ControlSignal::Touched => {
                self.control.mark_touched();
                update.touched = true;
            }
        }
    }
}
