#![forbid(unsafe_code)]

//! The bridge between a custom widget and a host form control.
//!
//! A [`ValueAccessor`] is the widget side of the bridge. The host pushes model
//! values in with [`write_value`](ValueAccessor::write_value); the widget
//! reports user edits and focus loss back as [`ControlSignal`]s, either
//! directly from [`handle_event_at`](ValueAccessor::handle_event_at) or later
//! from [`tick_at`](ValueAccessor::tick_at) when emission is debounced.
//!
//! Signals are returned rather than delivered through stored callbacks, so the
//! widget never holds a reference back into its control.

use std::time::{Duration, Instant};

/// A notification from a widget to its control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlSignal<V> {
    /// The user changed the value.
    Changed(V),
    /// The user left the widget.
    Touched,
}

impl<V> ControlSignal<V> {
    /// The carried value, for `Changed`.
    #[must_use]
    pub fn value(&self) -> Option<&V> {
        match self {
            Self::Changed(value) => Some(value),
            Self::Touched => None,
        }
    }
}

/// Widget side of the control bridge.
pub trait ValueAccessor {
    /// The model value exchanged with the control.
    type Value: Clone;
    /// The input events the widget understands.
    type Event;

    /// Replace the widget's value with one from the model.
    ///
    /// Never produces a signal; model writes are not user edits.
    fn write_value(&mut self, value: Self::Value);

    /// Feed one input event to the widget.
    fn handle_event_at(
        &mut self,
        event: &Self::Event,
        now: Instant,
    ) -> Option<ControlSignal<Self::Value>>;

    /// Release any emission whose delay has elapsed.
    fn tick_at(&mut self, now: Instant) -> Option<ControlSignal<Self::Value>>;

    /// How long until [`tick_at`](Self::tick_at) may produce a signal.
    fn time_until_tick(&self, _now: Instant) -> Option<Duration> {
        None
    }

    /// Mirror the control's disabled state.
    fn set_disabled(&mut self, _disabled: bool) {}

    /// Drop pending emissions. No signal is produced afterwards.
    fn dispose(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn changed_carries_value() {
        let signal = ControlSignal::Changed(7);
        assert_eq!(signal.value(), Some(&7));
        assert_eq!(ControlSignal::<i32>::Touched.value(), None);
    }
}
