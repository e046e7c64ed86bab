#![forbid(unsafe_code)]

//! Async check coordination with token-based staleness prevention.
//!
//! Every availability check is issued a [`CheckToken`]. Starting a new check
//! supersedes every check still in flight, and a result is applied only if
//! its token is still in flight when it arrives. This gives switch-to-latest
//! semantics without a stream library: late answers for superseded input
//! are recorded and dropped instead of overwriting the newer state.
//!
//! All lifecycle steps are recorded in a [`CheckTrace`] that can be
//! checksummed and exported as JSONL for regression comparison.
//!
//! # Example
//!
//! ```rust
//! use std::time::{Duration, Instant};
//! use mailpick_validation::{CheckCoordinator, ValidationResult};
//!
//! let t0 = Instant::now();
//! let mut coordinator = CheckCoordinator::with_epoch(t0);
//!
//! let first = coordinator.start_at(t0);
//! let second = coordinator.start_at(t0 + Duration::from_millis(10));
//!
//! // The superseded check's answer is discarded.
//! let late = t0 + Duration::from_millis(900);
//! assert!(!coordinator.try_apply_at(first, ValidationResult::Valid, false, late));
//! assert!(coordinator.try_apply_at(second, ValidationResult::Valid, false, late));
//! assert!(coordinator.verify_trace().is_ok());
//! ```

use std::collections::{HashSet, VecDeque};
use std::hash::{DefaultHasher, Hash, Hasher};
use std::time::{Duration, Instant};

use serde::Serialize;

use super::ValidationResult;

#[inline]
fn nanos_since(now: Instant, earlier: Instant) -> u64 {
    u64::try_from(now.saturating_duration_since(earlier).as_nanos()).unwrap_or(u64::MAX)
}

// ---------------------------------------------------------------------------
// CheckToken
// ---------------------------------------------------------------------------

/// A monotonically increasing identifier for one check request.
///
/// # Invariants
///
/// - Tokens are strictly monotonic: `token_n < token_{n+1}`
/// - Token 0 is reserved for "no check"
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct CheckToken(u64);

impl CheckToken {
    /// The null token representing no check.
    pub const NONE: Self = Self(0);

    /// Create a token from a raw value.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw token value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Check if this is the null token.
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for CheckToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Check({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// CheckEvent
// ---------------------------------------------------------------------------

/// A step in a check's lifecycle.
///
/// `elapsed_ns` is measured from the coordinator's epoch, so traces recorded
/// with the same injected timestamps are identical across runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CheckEvent {
    /// A check was issued.
    Started { token: CheckToken, elapsed_ns: u64 },

    /// A check was superseded by a newer one.
    Superseded {
        token: CheckToken,
        by: CheckToken,
        elapsed_ns: u64,
    },

    /// A check was dropped with no successor (value became ineligible, or
    /// the owner was disposed).
    Abandoned { token: CheckToken, elapsed_ns: u64 },

    /// A check's answer arrived (it may or may not be applied).
    Completed {
        token: CheckToken,
        is_valid: bool,
        /// The lookup failed and the answer is the fail-open default.
        failed: bool,
        duration_ns: u64,
        elapsed_ns: u64,
    },

    /// A check's answer became the control's result.
    Applied {
        token: CheckToken,
        is_valid: bool,
        elapsed_ns: u64,
    },

    /// A check's answer was dropped because the check was no longer current.
    StaleDiscarded {
        token: CheckToken,
        current_token: CheckToken,
        elapsed_ns: u64,
    },
}

impl CheckEvent {
    /// Get the token associated with this event.
    #[must_use]
    pub fn token(&self) -> CheckToken {
        match self {
            Self::Started { token, .. }
            | Self::Superseded { token, .. }
            | Self::Abandoned { token, .. }
            | Self::Completed { token, .. }
            | Self::Applied { token, .. }
            | Self::StaleDiscarded { token, .. } => *token,
        }
    }

    /// Get the event type name for logging.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Started { .. } => "started",
            Self::Superseded { .. } => "superseded",
            Self::Abandoned { .. } => "abandoned",
            Self::Completed { .. } => "completed",
            Self::Applied { .. } => "applied",
            Self::StaleDiscarded { .. } => "stale_discarded",
        }
    }
}

// ---------------------------------------------------------------------------
// CheckTrace
// ---------------------------------------------------------------------------

/// Events kept by a [`CheckTrace`] before the oldest half is dropped.
pub const MAX_TRACE_EVENTS: usize = 1024;

/// An ordered record of the most recent check events.
///
/// The trace holds at most [`MAX_TRACE_EVENTS`]. When full, the oldest half
/// is dropped so a long-lived checker keeps bounded memory.
#[derive(Debug, Clone, Default)]
pub struct CheckTrace {
    events: Vec<CheckEvent>,
    dropped: u64,
}

impl CheckTrace {
    /// Create a new empty trace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event to the trace.
    pub fn push(&mut self, event: CheckEvent) {
        if self.events.len() >= MAX_TRACE_EVENTS {
            let evict = MAX_TRACE_EVENTS / 2;
            self.events.drain(..evict);
            self.dropped = self.dropped.saturating_add(evict as u64);
        }
        self.events.push(event);
    }

    /// Number of events evicted to stay within [`MAX_TRACE_EVENTS`].
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Get all events in the trace.
    #[must_use]
    pub fn events(&self) -> &[CheckEvent] {
        &self.events
    }

    /// Check if the trace contains a specific event type for a token.
    #[must_use]
    pub fn contains_event_type(&self, token: CheckToken, event_type: &str) -> bool {
        self.events
            .iter()
            .any(|e| e.token() == token && e.event_type() == event_type)
    }

    /// Get all events for a specific token.
    #[must_use]
    pub fn events_for_token(&self, token: CheckToken) -> Vec<&CheckEvent> {
        self.events.iter().filter(|e| e.token() == token).collect()
    }

    /// Checksum over all events and their order.
    #[must_use]
    pub fn checksum(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for event in &self.events {
            event.hash(&mut hasher);
        }
        hasher.finish()
    }

    /// Render the trace as JSON lines, one event per line.
    #[must_use]
    pub fn to_jsonl(&self) -> String {
        let mut out = String::new();
        for event in &self.events {
            match serde_json::to_string(event) {
                Ok(line) => {
                    out.push_str(&line);
                    out.push('\n');
                }
                Err(e) => tracing::warn!(error = %e, "failed to encode check event"),
            }
        }
        out
    }

    /// Get the number of events in the trace.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if the trace is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Verify trace invariants.
    ///
    /// Returns a list of violations if any invariants are broken. Tokens
    /// whose start was evicted are not judged.
    #[must_use]
    pub fn verify_invariants(&self) -> Vec<String> {
        let mut violations = Vec::new();
        let mut last_started = CheckToken::NONE;
        let mut started: HashSet<CheckToken> = HashSet::new();
        let mut retired: HashSet<CheckToken> = HashSet::new();
        let mut applied: HashSet<CheckToken> = HashSet::new();

        for event in &self.events {
            match event {
                CheckEvent::Started { token, .. } => {
                    if *token <= last_started {
                        violations.push(format!(
                            "non-monotonic start token: {token} after {last_started}"
                        ));
                    }
                    last_started = *token;
                    started.insert(*token);
                }
                CheckEvent::Superseded { token, by, .. } => {
                    if by <= token {
                        violations.push(format!("{token} superseded by older {by}"));
                    }
                    retired.insert(*token);
                }
                CheckEvent::Abandoned { token, .. } => {
                    retired.insert(*token);
                }
                CheckEvent::Applied { token, .. } => {
                    if retired.contains(token) {
                        violations.push(format!("{token} applied after being retired"));
                    }
                    if !applied.insert(*token) {
                        violations.push(format!("{token} applied more than once"));
                    }
                }
                CheckEvent::StaleDiscarded {
                    token,
                    current_token,
                    ..
                } => {
                    if token >= current_token
                        && started.contains(token)
                        && !retired.contains(token)
                        && !applied.contains(token)
                    {
                        violations.push(format!(
                            "stale discard of live token: {token} >= {current_token}"
                        ));
                    }
                }
                CheckEvent::Completed { .. } => {}
            }
        }

        violations
    }
}

// ---------------------------------------------------------------------------
// CheckCoordinator
// ---------------------------------------------------------------------------

/// A check that has been issued and not yet answered or retired.
#[derive(Debug, Clone)]
pub struct InFlightCheck {
    /// The token for this check.
    pub token: CheckToken,
    /// When the check was issued.
    pub started_at: Instant,
}

/// Issues check tokens and decides which answers may be applied.
///
/// Single-threaded: the owner calls [`start_at`](Self::start_at) when input
/// changes and [`try_apply_at`](Self::try_apply_at) when an answer arrives.
pub struct CheckCoordinator {
    next_token: u64,
    current_token: CheckToken,
    in_flight: VecDeque<InFlightCheck>,
    trace: CheckTrace,
    epoch: Instant,
    current_result: Option<ValidationResult>,
}

impl std::fmt::Debug for CheckCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckCoordinator")
            .field("current_token", &self.current_token)
            .field("in_flight_count", &self.in_flight.len())
            .field("trace_events", &self.trace.len())
            .finish()
    }
}

impl Default for CheckCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckCoordinator {
    /// Create a coordinator whose epoch is now.
    #[must_use]
    pub fn new() -> Self {
        Self::with_epoch(Instant::now())
    }

    /// Create a coordinator measuring trace timestamps from `epoch`.
    #[must_use]
    pub fn with_epoch(epoch: Instant) -> Self {
        Self {
            next_token: 1,
            current_token: CheckToken::NONE,
            in_flight: VecDeque::new(),
            trace: CheckTrace::new(),
            epoch,
            current_result: None,
        }
    }

    /// Issue a new check at `now`, superseding every check in flight.
    pub fn start_at(&mut self, now: Instant) -> CheckToken {
        let token = CheckToken(self.next_token);
        self.next_token = self.next_token.saturating_add(1);
        let elapsed_ns = nanos_since(now, self.epoch);

        for check in self.in_flight.drain(..) {
            tracing::trace!(token = check.token.raw(), by = token.raw(), "check superseded");
            self.trace.push(CheckEvent::Superseded {
                token: check.token,
                by: token,
                elapsed_ns,
            });
        }

        self.in_flight.push_back(InFlightCheck {
            token,
            started_at: now,
        });
        self.current_token = token;
        self.trace.push(CheckEvent::Started { token, elapsed_ns });
        token
    }

    /// Retire every check in flight without issuing a successor.
    ///
    /// Returns the number of checks retired.
    pub fn abandon_at(&mut self, now: Instant) -> usize {
        let elapsed_ns = nanos_since(now, self.epoch);
        let count = self.in_flight.len();
        for check in self.in_flight.drain(..) {
            self.trace.push(CheckEvent::Abandoned {
                token: check.token,
                elapsed_ns,
            });
        }
        count
    }

    /// Get the most recently issued token.
    #[must_use]
    pub fn current_token(&self) -> CheckToken {
        self.current_token
    }

    /// Whether `token` is still waiting for its answer.
    #[must_use]
    pub fn is_in_flight(&self, token: CheckToken) -> bool {
        self.in_flight.iter().any(|c| c.token == token)
    }

    /// Offer an answer for `token`.
    ///
    /// Returns `true` if the answer was applied. Answers for superseded or
    /// abandoned checks are recorded as stale and dropped.
    pub fn try_apply_at(
        &mut self,
        token: CheckToken,
        result: ValidationResult,
        failed: bool,
        now: Instant,
    ) -> bool {
        let elapsed_ns = nanos_since(now, self.epoch);
        let is_valid = result.is_valid();
        let started_at = self
            .in_flight
            .iter()
            .find(|c| c.token == token)
            .map(|c| c.started_at);
        let duration_ns = started_at.map_or(0, |at| nanos_since(now, at));

        self.trace.push(CheckEvent::Completed {
            token,
            is_valid,
            failed,
            duration_ns,
            elapsed_ns,
        });

        if started_at.is_none() {
            self.trace.push(CheckEvent::StaleDiscarded {
                token,
                current_token: self.current_token,
                elapsed_ns,
            });
            return false;
        }

        self.in_flight.retain(|c| c.token != token);
        self.current_result = Some(result);
        self.trace.push(CheckEvent::Applied {
            token,
            is_valid,
            elapsed_ns,
        });
        true
    }

    /// Get the most recently applied result.
    #[must_use]
    pub fn current_result(&self) -> Option<&ValidationResult> {
        self.current_result.as_ref()
    }

    /// Get the event trace.
    #[must_use]
    pub fn trace(&self) -> &CheckTrace {
        &self.trace
    }

    /// Get the number of in-flight checks.
    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Check if there are any in-flight checks.
    #[must_use]
    pub fn has_in_flight(&self) -> bool {
        !self.in_flight.is_empty()
    }

    /// Verify that the trace satisfies all invariants.
    pub fn verify_trace(&self) -> Result<(), Vec<String>> {
        let violations = self.trace.verify_invariants();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

// ---------------------------------------------------------------------------
// AsyncValidator Trait
// ---------------------------------------------------------------------------

/// A validator whose answer arrives later than the value it checks.
///
/// The host calls [`begin_at`](Self::begin_at) whenever the value changes
/// and polls [`tick_at`](Self::tick_at) until a result is produced.
/// Implementations must honor switch-to-latest: once a newer check begins,
/// an older one never produces a result.
pub trait AsyncValidator<T: ?Sized> {
    /// Begin checking `value`, superseding any check in flight.
    ///
    /// Returns `false` when the value needs no check and is valid as is.
    fn begin_at(&mut self, value: &T, now: Instant) -> bool;

    /// Advance in-flight work; returns the latest check's result once.
    fn tick_at(&mut self, now: Instant) -> Option<ValidationResult>;

    /// Drop any check in flight.
    fn cancel_at(&mut self, now: Instant);

    /// Whether a check is in flight.
    fn is_pending(&self) -> bool;

    /// How long until the in-flight check may resolve, if known.
    fn time_until_ready(&self, _now: Instant) -> Option<Duration> {
        None
    }

    /// Skip this validator while the control is pristine.
    fn dirty_only(&self) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
