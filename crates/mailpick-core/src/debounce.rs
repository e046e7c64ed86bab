#![forbid(unsafe_code)]

//! Latest-wins debouncing.
//!
//! A [`Debouncer`] holds at most one pending value. Every push replaces the
//! pending value and restarts the quiet period; the value is released exactly
//! once, by the first tick that observes the quiet period has elapsed with no
//! further pushes.
//!
//! Time is injected through the `*_at` methods so behavior is deterministic
//! under test. The plain variants read [`Instant::now`].
//!
//! # Usage
//!
//! ```
//! use std::time::{Duration, Instant};
//! use mailpick_core::debounce::Debouncer;
//!
//! let t0 = Instant::now();
//! let mut debouncer = Debouncer::new(Duration::from_millis(500));
//!
//! debouncer.push_at("j", t0);
//! debouncer.push_at("jo", t0 + Duration::from_millis(100));
//! debouncer.push_at("joh", t0 + Duration::from_millis(200));
//!
//! // Still inside the quiet period of the last push.
//! assert_eq!(debouncer.tick_at(t0 + Duration::from_millis(600)), None);
//!
//! // Quiet period elapsed: only the last value comes out.
//! assert_eq!(debouncer.tick_at(t0 + Duration::from_millis(700)), Some("joh"));
//! assert_eq!(debouncer.tick_at(t0 + Duration::from_millis(800)), None);
//! ```
//!
//! # Invariants
//!
//! - **Latest-wins**: intermediate values are never delivered.
//! - **Exactly once**: a pushed burst yields one delivery.
//! - **No early fire**: nothing is delivered before `last_push + quiet`.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | `quiet = 0` | Fires on the next tick |
//! | Clock moves backwards | Treated as zero elapsed; waits |
//! | Tick with nothing pending | Returns `None` |

use std::time::{Duration, Instant};

use crate::logging::trace;

#[inline]
fn duration_since_or_zero(now: Instant, earlier: Instant) -> Duration {
    now.checked_duration_since(earlier)
        .unwrap_or(Duration::ZERO)
}

#[derive(Debug, Clone)]
struct Pending<T> {
    value: T,
    pushed_at: Instant,
    /// Pushes folded into this pending value (1 = no coalescing).
    coalesced: u64,
}

/// Holds the most recent value until input goes quiet.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    quiet: Duration,
    pending: Option<Pending<T>>,
    fired: u64,
    dropped: u64,
    last_burst: u64,
}

impl<T> Debouncer<T> {
    /// Create a debouncer with the given quiet period.
    #[must_use]
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
            fired: 0,
            dropped: 0,
            last_burst: 0,
        }
    }

    /// The configured quiet period.
    #[must_use]
    pub fn quiet(&self) -> Duration {
        self.quiet
    }

    /// Push a value now.
    pub fn push(&mut self, value: T) {
        self.push_at(value, Instant::now());
    }

    /// Push a value at `now`, replacing any pending value.
    pub fn push_at(&mut self, value: T, now: Instant) {
        let coalesced = match self.pending.take() {
            Some(prev) => {
                self.dropped = self.dropped.saturating_add(1);
                prev.coalesced.saturating_add(1)
            }
            None => 1,
        };
        self.pending = Some(Pending {
            value,
            pushed_at: now,
            coalesced,
        });
    }

    /// Release the pending value if the quiet period has elapsed.
    pub fn tick(&mut self) -> Option<T> {
        self.tick_at(Instant::now())
    }

    /// Release the pending value if the quiet period has elapsed by `now`.
    pub fn tick_at(&mut self, now: Instant) -> Option<T> {
        let ready = self
            .pending
            .as_ref()
            .is_some_and(|p| duration_since_or_zero(now, p.pushed_at) >= self.quiet);
        if !ready {
            return None;
        }
        let pending = self.pending.take()?;
        self.fired = self.fired.saturating_add(1);
        self.last_burst = pending.coalesced;
        trace!(
            coalesced = pending.coalesced,
            quiet_ms = self.quiet.as_millis() as u64,
            "debounce fired"
        );
        Some(pending.value)
    }

    /// Drop the pending value without delivering it.
    ///
    /// Returns the dropped value, if any.
    pub fn cancel(&mut self) -> Option<T> {
        let pending = self.pending.take()?;
        self.dropped = self.dropped.saturating_add(1);
        Some(pending.value)
    }

    /// Whether a value is waiting for the quiet period.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Time left until the pending value fires, or `None` when idle.
    ///
    /// Returns `Duration::ZERO` when the value is already due.
    #[must_use]
    pub fn time_until_fire(&self, now: Instant) -> Option<Duration> {
        self.pending.as_ref().map(|p| {
            self.quiet
                .saturating_sub(duration_since_or_zero(now, p.pushed_at))
        })
    }

    /// Delivery and coalescing counters.
    #[must_use]
    pub fn stats(&self) -> DebounceStats {
        DebounceStats {
            fired: self.fired,
            dropped: self.dropped,
            last_burst: self.last_burst,
            pending: self.pending.is_some(),
        }
    }
}

/// Counters for a [`Debouncer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DebounceStats {
    /// Values delivered.
    pub fired: u64,
    /// Values replaced or cancelled before delivery.
    pub dropped: u64,
    /// Pushes folded into the most recent delivery.
    pub last_burst: u64,
    /// Whether a value is currently pending.
    pub pending: bool,
}

/// A callback wrapped in a [`Debouncer`].
///
/// Calls are buffered; the wrapped callback runs with the last argument once
/// the quiet period elapses, as observed by [`DebouncedFn::tick_at`].
pub struct DebouncedFn<T, F>
where
    F: FnMut(T),
{
    inner: Debouncer<T>,
    callback: F,
}

impl<T, F> std::fmt::Debug for DebouncedFn<T, F>
where
    T: std::fmt::Debug,
    F: FnMut(T),
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebouncedFn")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl<T, F> DebouncedFn<T, F>
where
    F: FnMut(T),
{
    /// Wrap `callback` so it only runs after `quiet` of inactivity.
    #[must_use]
    pub fn new(callback: F, quiet: Duration) -> Self {
        Self {
            inner: Debouncer::new(quiet),
            callback,
        }
    }

    /// Schedule a call at `now`; supersedes any scheduled call.
    pub fn call_at(&mut self, value: T, now: Instant) {
        self.inner.push_at(value, now);
    }

    /// Run the callback if the scheduled call is due.
    ///
    /// Returns `true` when the callback ran.
    pub fn tick_at(&mut self, now: Instant) -> bool {
        match self.inner.tick_at(now) {
            Some(value) => {
                (self.callback)(value);
                true
            }
            None => false,
        }
    }

    /// Drop the scheduled call.
    pub fn cancel(&mut self) {
        self.inner.cancel();
    }

    /// Whether a call is scheduled.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.inner.has_pending()
    }

    /// Time left until the scheduled call runs.
    #[must_use]
    pub fn time_until_fire(&self, now: Instant) -> Option<Duration> {
        self.inner.time_until_fire(now)
    }
}
