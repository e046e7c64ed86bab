#![forbid(unsafe_code)]

//! A form control that owns a value and its validation state.
//!
//! [`FormControl`] tracks the value, whether the user has edited it (dirty)
//! or left it (touched), and the outcome of its validators. Sync validators
//! run first; the async validator only runs when they all pass.
//!
//! # Invariants
//!
//! - `status() == Pending` exactly while the async validator has a check in
//!   flight.
//! - `errors()` is `None` whenever the status is not `Invalid`.
//! - Dirty and touched are sticky until [`reset_at`](FormControl::reset_at).
//! - After [`dispose_at`](FormControl::dispose_at), nothing is validated.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Sync error while a check is in flight | Check cancelled; sync error shown |
//! | Value edited while a check is in flight | Old check superseded |
//! | Control disabled | Checks cancelled; status `Disabled`, no errors |

use std::fmt;
use std::time::{Duration, Instant};

use mailpick_validation::{AsyncValidator, ValidationErrors, ValidationResult, Validator};
use serde::Serialize;

/// Validation status of a control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlStatus {
    /// Every validator passed.
    #[default]
    Valid,
    /// At least one validator reported an error.
    Invalid,
    /// Sync validators passed; the async check is in flight.
    Pending,
    /// Validation is switched off.
    Disabled,
}

impl ControlStatus {
    /// Lowercase name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Invalid => "invalid",
            Self::Pending => "pending",
            Self::Disabled => "disabled",
        }
    }
}

impl fmt::Display for ControlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point-in-time view of a control, for logs and test evidence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlSnapshot<'a, V> {
    /// Current model value.
    pub value: &'a V,
    /// Validation status.
    pub status: ControlStatus,
    /// The user has edited the value.
    pub dirty: bool,
    /// The user has left the field.
    pub touched: bool,
    /// An async check is in flight.
    pub loading: bool,
    /// Errors by code, present only while invalid.
    pub errors: Option<&'a ValidationErrors>,
}

/// A value plus its validators and validation state.
pub struct FormControl<V> {
    value: V,
    dirty: bool,
    touched: bool,
    status: ControlStatus,
    errors: Option<ValidationErrors>,
    validators: Vec<Box<dyn Validator<V>>>,
    async_validator: Option<Box<dyn AsyncValidator<V>>>,
    disposed: bool,
}

impl<V: fmt::Debug> fmt::Debug for FormControl<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormControl")
            .field("value", &self.value)
            .field("dirty", &self.dirty)
            .field("touched", &self.touched)
            .field("status", &self.status)
            .field("errors", &self.errors)
            .field("validators", &self.validators.len())
            .field("has_async_validator", &self.async_validator.is_some())
            .finish()
    }
}

impl<V> FormControl<V> {
    /// Create a pristine, valid control holding `value`.
    #[must_use]
    pub fn new(value: V) -> Self {
        Self {
            value,
            dirty: false,
            touched: false,
            status: ControlStatus::Valid,
            errors: None,
            validators: Vec::new(),
            async_validator: None,
            disposed: false,
        }
    }

    /// Add a sync validator.
    #[must_use]
    pub fn with_validator(mut self, validator: impl Validator<V> + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    /// Set the async validator, replacing any previous one.
    #[must_use]
    pub fn with_async_validator(mut self, validator: impl AsyncValidator<V> + 'static) -> Self {
        self.async_validator = Some(Box::new(validator));
        self
    }

    /// The current value.
    #[must_use]
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Whether the user has changed the value.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether the user has never changed the value.
    #[must_use]
    pub fn is_pristine(&self) -> bool {
        !self.dirty
    }

    /// Whether the user has left the widget at least once.
    #[must_use]
    pub fn is_touched(&self) -> bool {
        self.touched
    }

    /// Current validation status.
    #[must_use]
    pub fn status(&self) -> ControlStatus {
        self.status
    }

    /// Whether the status is `Valid`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.status == ControlStatus::Valid
    }

    /// Current errors, `None` unless the status is `Invalid`.
    #[must_use]
    pub fn errors(&self) -> Option<&ValidationErrors> {
        self.errors.as_ref()
    }

    /// The error message recorded under `code`.
    #[must_use]
    pub fn get_error(&self, code: &str) -> Option<&str> {
        self.errors.as_ref().and_then(|e| e.get(code))
    }

    /// Whether an error is recorded under `code`.
    #[must_use]
    pub fn has_error(&self, code: &str) -> bool {
        self.get_error(code).is_some()
    }

    /// Whether an async check is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.async_validator.as_ref().is_some_and(|v| v.is_pending())
    }

    /// Whether [`dispose_at`](Self::dispose_at) has run.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Capture the observable state.
    #[must_use]
    pub fn snapshot(&self) -> ControlSnapshot<'_, V> {
        ControlSnapshot {
            value: &self.value,
            status: self.status,
            dirty: self.dirty,
            touched: self.touched,
            loading: self.is_loading(),
            errors: self.errors.as_ref(),
        }
    }

    /// Mark the control as touched.
    pub fn mark_touched(&mut self) {
        self.touched = true;
    }

    /// Mark the control as dirty without changing the value.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// How long until a pending async check may resolve.
    #[must_use]
    pub fn time_until_ready(&self, now: Instant) -> Option<Duration> {
        self.async_validator
            .as_ref()
            .and_then(|v| v.time_until_ready(now))
    }

    /// Switch validation off and drop any check in flight.
    pub fn disable_at(&mut self, now: Instant) {
        if let Some(validator) = self.async_validator.as_mut() {
            validator.cancel_at(now);
        }
        self.status = ControlStatus::Disabled;
        self.errors = None;
    }

    /// Switch validation back on and re-validate.
    pub fn enable_at(&mut self, now: Instant) {
        if self.status == ControlStatus::Disabled {
            self.status = ControlStatus::Valid;
            self.update_value_and_validity_at(now);
        }
    }

    /// Whether validation is switched off.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.status == ControlStatus::Disabled
    }

    /// Replace the value from the model side. Does not mark the control dirty.
    pub fn set_value_at(&mut self, value: V, now: Instant) {
        self.value = value;
        self.update_value_and_validity_at(now);
    }

    /// Replace the value from a user edit. Marks the control dirty.
    pub fn on_change_at(&mut self, value: V, now: Instant) {
        self.value = value;
        self.dirty = true;
        self.update_value_and_validity_at(now);
    }

    /// Replace the value and return to the pristine, untouched state.
    pub fn reset_at(&mut self, value: V, now: Instant) {
        self.value = value;
        self.dirty = false;
        self.touched = false;
        self.update_value_and_validity_at(now);
    }

    /// Re-run every validator against the current value.
    ///
    /// Sync validators run first. If any of them fails, the async check is
    /// cancelled and the status is `Invalid`. Otherwise the async validator
    /// begins a check and the status becomes `Pending` until
    /// [`tick_at`](Self::tick_at) delivers its result.
    pub fn update_value_and_validity_at(&mut self, now: Instant) {
        if self.disposed || self.status == ControlStatus::Disabled {
            return;
        }

        let mut errors = ValidationErrors::new();
        for validator in &self.validators {
            if validator.dirty_only() && !self.dirty {
                continue;
            }
            errors.absorb(validator.validate(&self.value));
        }

        if let Some(errors) = errors.into_option() {
            if let Some(validator) = self.async_validator.as_mut() {
                validator.cancel_at(now);
            }
            self.set_status(ControlStatus::Invalid, Some(errors));
            return;
        }

        let pending = match self.async_validator.as_mut() {
            Some(validator) if validator.dirty_only() && !self.dirty => {
                validator.cancel_at(now);
                false
            }
            Some(validator) => validator.begin_at(&self.value, now),
            None => false,
        };

        if pending {
            self.set_status(ControlStatus::Pending, None);
        } else {
            self.set_status(ControlStatus::Valid, None);
        }
    }

    /// Poll the async validator.
    ///
    /// Returns the new status when a check resolved on this tick.
    pub fn tick_at(&mut self, now: Instant) -> Option<ControlStatus> {
        if self.disposed {
            return None;
        }
        let result = self.async_validator.as_mut()?.tick_at(now)?;
        match result {
            ValidationResult::Valid => self.set_status(ControlStatus::Valid, None),
            ValidationResult::Invalid(error) => {
                self.set_status(ControlStatus::Invalid, Some(ValidationErrors::from(error)));
            }
        }
        Some(self.status)
    }

    /// Stop validating for good and drop any check in flight.
    pub fn dispose_at(&mut self, now: Instant) {
        if let Some(validator) = self.async_validator.as_mut() {
            validator.cancel_at(now);
        }
        if self.status == ControlStatus::Pending {
            self.status = ControlStatus::Valid;
        }
        self.disposed = true;
    }

    fn set_status(&mut self, status: ControlStatus, errors: Option<ValidationErrors>) {
        if status != self.status {
            tracing::debug!(from = %self.status, to = %status, "control status changed");
        }
        self.status = status;
        self.errors = errors;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailpick_core::EmailValue;
    use mailpick_validation::{
        AvailabilityChecker, EMAIL_TAKEN_MESSAGE, ERROR_CODE_EMAIL, USERNAME_FORMAT_MESSAGE,
        UsernameFormat,
    };

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn email_control(value: EmailValue) -> FormControl<EmailValue> {
        FormControl::new(value)
            .with_validator(UsernameFormat::new())
            .with_async_validator(AvailabilityChecker::with_mock_directory())
    }

    #[test]
    fn pristine_control_is_valid_without_checking() {
        let t0 = Instant::now();
        let mut control = email_control(EmailValue::new("john", "adi.so"));
        control.update_value_and_validity_at(t0);
        assert_eq!(control.status(), ControlStatus::Valid);
        assert!(!control.is_loading());
    }

    #[test]
    fn pristine_control_skips_format_check() {
        let t0 = Instant::now();
        let mut control = email_control(EmailValue::new("john_doe", "adi.so"));
        control.update_value_and_validity_at(t0);
        assert!(control.errors().is_none());
    }

    #[test]
    fn user_edit_starts_check() {
        let t0 = Instant::now();
        let mut control = email_control(EmailValue::default());
        control.on_change_at(EmailValue::new("john", "adi.so"), t0);
        assert!(control.is_dirty());
        assert_eq!(control.status(), ControlStatus::Pending);
        assert!(control.is_loading());
        assert_eq!(control.time_until_ready(t0), Some(ms(1000)));

        assert_eq!(control.tick_at(t0 + ms(999)), None);
        assert_eq!(control.tick_at(t0 + ms(1000)), Some(ControlStatus::Invalid));
        assert_eq!(control.get_error(ERROR_CODE_EMAIL), Some(EMAIL_TAKEN_MESSAGE));
        assert!(!control.is_loading());
    }

    #[test]
    fn format_error_blocks_async_check() {
        let t0 = Instant::now();
        let mut control = email_control(EmailValue::default());
        control.on_change_at(EmailValue::new("john_doe", "adi.so"), t0);
        assert_eq!(control.status(), ControlStatus::Invalid);
        assert_eq!(control.get_error(ERROR_CODE_EMAIL), Some(USERNAME_FORMAT_MESSAGE));
        assert!(!control.is_loading());
    }

    #[test]
    fn format_error_cancels_in_flight_check() {
        let t0 = Instant::now();
        let mut control = email_control(EmailValue::default());
        control.on_change_at(EmailValue::new("john", "adi.so"), t0);
        control.on_change_at(EmailValue::new("john!", "adi.so"), t0 + ms(300));
        assert!(!control.is_loading());
        assert_eq!(control.tick_at(t0 + ms(2000)), None);
        assert_eq!(control.get_error(ERROR_CODE_EMAIL), Some(USERNAME_FORMAT_MESSAGE));
    }

    #[test]
    fn incomplete_value_is_valid_immediately() {
        let t0 = Instant::now();
        let mut control = email_control(EmailValue::default());
        control.on_change_at(EmailValue::new("", "adi.so"), t0);
        assert_eq!(control.status(), ControlStatus::Valid);
        assert!(!control.is_loading());
    }

    #[test]
    fn errors_clear_while_pending() {
        let t0 = Instant::now();
        let mut control = email_control(EmailValue::default());
        control.on_change_at(EmailValue::new("john", "adi.so"), t0);
        control.tick_at(t0 + ms(1000));
        assert!(control.has_error(ERROR_CODE_EMAIL));

        control.on_change_at(EmailValue::new("mike", "adi.so"), t0 + ms(2000));
        assert_eq!(control.status(), ControlStatus::Pending);
        assert!(control.errors().is_none());
        assert_eq!(control.tick_at(t0 + ms(3000)), Some(ControlStatus::Valid));
    }

    #[test]
    fn set_value_does_not_dirty() {
        let t0 = Instant::now();
        let mut control = email_control(EmailValue::default());
        control.set_value_at(EmailValue::new("john", "adi.so"), t0);
        assert!(control.is_pristine());
        assert!(!control.is_loading());
    }

    #[test]
    fn touched_is_sticky_until_reset() {
        let t0 = Instant::now();
        let mut control = email_control(EmailValue::default());
        control.mark_touched();
        control.on_change_at(EmailValue::new("mike", "adi.so"), t0);
        assert!(control.is_touched());
        control.reset_at(EmailValue::default(), t0);
        assert!(!control.is_touched());
        assert!(control.is_pristine());
    }

    #[test]
    fn disable_cancels_and_clears() {
        let t0 = Instant::now();
        let mut control = email_control(EmailValue::default());
        control.on_change_at(EmailValue::new("john", "adi.so"), t0);
        control.disable_at(t0 + ms(10));
        assert!(control.is_disabled());
        assert!(!control.is_loading());
        assert_eq!(control.tick_at(t0 + ms(2000)), None);

        control.enable_at(t0 + ms(3000));
        assert_eq!(control.status(), ControlStatus::Pending);
    }

    #[test]
    fn dispose_stops_validation() {
        let t0 = Instant::now();
        let mut control = email_control(EmailValue::default());
        control.on_change_at(EmailValue::new("john", "adi.so"), t0);
        control.dispose_at(t0 + ms(100));
        assert!(!control.is_loading());
        assert_eq!(control.status(), ControlStatus::Valid);
        assert_eq!(control.tick_at(t0 + ms(2000)), None);
    }

    #[test]
    fn snapshot_serializes() {
        let t0 = Instant::now();
        let mut control = email_control(EmailValue::default());
        control.on_change_at(EmailValue::new("john", "adi.so"), t0);
        control.tick_at(t0 + ms(1000));
        let json = serde_json::to_string(&control.snapshot()).unwrap();
        assert_eq!(
            json,
            r#"{"value":{"username":"john","domain":"adi.so"},"status":"invalid","dirty":true,"touched":false,"loading":false,"errors":{"email":"Email already exists."}}"#
        );
    }

    #[test]
    fn status_display() {
        assert_eq!(ControlStatus::Pending.to_string(), "pending");
        assert_eq!(ControlStatus::default(), ControlStatus::Valid);
    }
}
