#![forbid(unsafe_code)]

//! Username availability checking with switch-to-latest semantics.
//!
//! [`AvailabilityChecker`] owns at most one in-flight lookup. Beginning a new
//! check supersedes the previous one: its answer, if it ever arrives, is
//! discarded by the [`CheckCoordinator`] token guard. The loading flag is
//! derived from the in-flight slot, so it is true strictly between a check
//! starting and its resolution, cancellation, or disposal.
//!
//! # Failure policy
//!
//! A lookup that fails (unknown domain, backend error, dead worker) resolves
//! as *valid*. The failure is logged at `warn` and recorded as
//! `failed: true` in the check trace, but never shown to the user.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Incomplete value | No check; resolves valid immediately |
//! | Lookup error | Fail-open: valid, loading cleared |
//! | Worker thread cannot spawn | Treated as disconnected: valid |
//! | `begin_at` after `dispose_at` | Ignored; returns `false` |

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use mailpick_core::EmailValue;

use crate::async_validation::{AsyncValidator, CheckCoordinator, CheckToken};
use crate::lookup::{AvailabilityLookup, LookupError, MockDirectory};
use crate::validators::{ERROR_CODE_EMAIL, ValidationError, ValidationResult};

/// Message shown when the username is already registered on the domain.
pub const EMAIL_TAKEN_MESSAGE: &str = "Email already exists.";

/// The lookup currently awaited.
enum Flight {
    /// Answered in place once `ready_at` passes.
    Simulated {
        token: CheckToken,
        value: EmailValue,
        ready_at: Instant,
    },
    /// Answered by a worker thread through `rx`.
    Background {
        token: CheckToken,
        rx: Receiver<Result<bool, LookupError>>,
    },
}

impl Flight {
    fn token(&self) -> CheckToken {
        match self {
            Self::Simulated { token, .. } | Self::Background { token, .. } => *token,
        }
    }
}

/// Drives availability lookups for the email selector.
pub struct AvailabilityChecker {
    lookup: Arc<dyn AvailabilityLookup>,
    coordinator: CheckCoordinator,
    flight: Option<Flight>,
    disposed: bool,
}

impl std::fmt::Debug for AvailabilityChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvailabilityChecker")
            .field("lookup", &self.lookup.name())
            .field("coordinator", &self.coordinator)
            .field("in_flight", &self.flight.as_ref().map(Flight::token))
            .field("disposed", &self.disposed)
            .finish()
    }
}

impl AvailabilityChecker {
    /// Create a checker backed by `lookup`.
    #[must_use]
    pub fn new(lookup: Arc<dyn AvailabilityLookup>) -> Self {
        Self::with_epoch(lookup, Instant::now())
    }

    /// Create a checker whose trace timestamps are measured from `epoch`.
    #[must_use]
    pub fn with_epoch(lookup: Arc<dyn AvailabilityLookup>, epoch: Instant) -> Self {
        Self {
            lookup,
            coordinator: CheckCoordinator::with_epoch(epoch),
            flight: None,
            disposed: false,
        }
    }

    /// Create a checker backed by the default [`MockDirectory`].
    #[must_use]
    pub fn with_mock_directory() -> Self {
        Self::new(Arc::new(MockDirectory::default()))
    }

    /// Whether a check is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.flight.is_some()
    }

    /// Whether [`dispose_at`](Self::dispose_at) has run.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Token of the in-flight check, if any.
    #[must_use]
    pub fn in_flight_token(&self) -> Option<CheckToken> {
        self.flight.as_ref().map(Flight::token)
    }

    /// The most recently applied result.
    #[must_use]
    pub fn current_result(&self) -> Option<&ValidationResult> {
        self.coordinator.current_result()
    }

    /// The token coordinator (for trace inspection).
    #[must_use]
    pub fn coordinator(&self) -> &CheckCoordinator {
        &self.coordinator
    }

    /// Name of the lookup backend.
    #[must_use]
    pub fn lookup_name(&self) -> &str {
        self.lookup.name()
    }

    /// Stop all work; nothing resolves after this and loading stays false.
    pub fn dispose_at(&mut self, now: Instant) {
        self.cancel_at(now);
        if !self.disposed {
            tracing::debug!(lookup = self.lookup.name(), "availability checker disposed");
        }
        self.disposed = true;
    }

    fn launch(&self, value: &EmailValue, token: CheckToken, now: Instant) -> Flight {
        if let Some(latency) = self.lookup.simulated_latency() {
            return Flight::Simulated {
                token,
                value: value.clone(),
                ready_at: now + latency,
            };
        }

        let (tx, rx) = mpsc::channel();
        let lookup = Arc::clone(&self.lookup);
        let domain = value.domain.clone();
        let username = value.username.clone();
        let spawned = thread::Builder::new()
            .name("mailpick-lookup".into())
            .spawn(move || {
                // The receiver is gone when the check was superseded.
                let _ = tx.send(lookup.is_available(&domain, &username));
            });
        if let Err(e) = spawned {
            // Sender was dropped with the closure; the next tick sees a
            // disconnected channel and fails open.
            tracing::warn!(error = %e, "failed to spawn lookup worker");
        }
        Flight::Background { token, rx }
    }

    fn resolve(
        &mut self,
        token: CheckToken,
        answer: Result<bool, LookupError>,
        now: Instant,
    ) -> Option<ValidationResult> {
        let (result, failed) = match answer {
            Ok(true) => (ValidationResult::Valid, false),
            Ok(false) => (
                ValidationResult::Invalid(ValidationError::new(
                    ERROR_CODE_EMAIL,
                    EMAIL_TAKEN_MESSAGE,
                )),
                false,
            ),
            Err(e) => {
                tracing::warn!(
                    token = token.raw(),
                    lookup = self.lookup.name(),
                    error = %e,
                    "availability lookup failed, treating as available"
                );
                (ValidationResult::Valid, true)
            }
        };

        if self
            .coordinator
            .try_apply_at(token, result.clone(), failed, now)
        {
            tracing::debug!(
                token = token.raw(),
                valid = result.is_valid(),
                failed,
                "availability resolved"
            );
            Some(result)
        } else {
            None
        }
    }
}

impl AsyncValidator<EmailValue> for AvailabilityChecker {
    fn begin_at(&mut self, value: &EmailValue, now: Instant) -> bool {
        if self.disposed {
            return false;
        }
        if !value.is_complete() {
            self.cancel_at(now);
            return false;
        }

        let token = self.coordinator.start_at(now);
        tracing::debug!(
            token = token.raw(),
            domain = %value.domain,
            username = %value.username,
            lookup = self.lookup.name(),
            "availability check started"
        );
        self.flight = Some(self.launch(value, token, now));
        true
    }

    fn tick_at(&mut self, now: Instant) -> Option<ValidationResult> {
        let (token, answer) = match self.flight.as_ref()? {
            Flight::Simulated {
                token,
                value,
                ready_at,
            } => {
                if now < *ready_at {
                    return None;
                }
                (
                    *token,
                    self.lookup.is_available(&value.domain, &value.username),
                )
            }
            Flight::Background { token, rx } => match rx.try_recv() {
                Ok(answer) => (*token, answer),
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => (*token, Err(LookupError::Disconnected)),
            },
        };
        self.flight = None;
        self.resolve(token, answer, now)
    }

    fn cancel_at(&mut self, now: Instant) {
        if self.flight.take().is_some() {
            self.coordinator.abandon_at(now);
        }
    }

    fn is_pending(&self) -> bool {
        self.is_loading()
    }

    fn time_until_ready(&self, now: Instant) -> Option<Duration> {
        match self.flight.as_ref()? {
            Flight::Simulated { ready_at, .. } => Some(ready_at.saturating_duration_since(now)),
            Flight::Background { .. } => None,
        }
    }
}
