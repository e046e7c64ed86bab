#![forbid(unsafe_code)]

//! Core validation types and the username format validator.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use mailpick_core::EmailValue;
use regex::Regex;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Error Codes
// ---------------------------------------------------------------------------

/// Error code shared by every email selector error.
///
/// Both the format error and the availability error are reported under this
/// key, so the control shows at most one email message at a time.
pub const ERROR_CODE_EMAIL: &str = "email";

/// Message for usernames containing characters outside `[a-zA-Z0-9]`.
pub const USERNAME_FORMAT_MESSAGE: &str = "Username can only contain numbers & alphabets.";

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]*$").expect("valid username regex"));

// ---------------------------------------------------------------------------
// ValidationError
// ---------------------------------------------------------------------------

/// A validation error with a stable code and a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// Stable error code for programmatic handling.
    pub code: &'static str,
    /// Human-readable message.
    pub message: String,
}

impl ValidationError {
    /// Create a new validation error with the given code and message.
    #[must_use]
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

// ---------------------------------------------------------------------------
// ValidationResult
// ---------------------------------------------------------------------------

/// The result of a validation operation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ValidationResult {
    /// The value is valid.
    #[default]
    Valid,
    /// The value is invalid with an error.
    Invalid(ValidationError),
}

impl ValidationResult {
    /// Returns `true` if the result is `Valid`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Returns `true` if the result is `Invalid`.
    #[must_use]
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid(_))
    }

    /// Returns the error if the result is `Invalid`, otherwise `None`.
    #[must_use]
    pub fn error(&self) -> Option<&ValidationError> {
        match self {
            Self::Valid => None,
            Self::Invalid(e) => Some(e),
        }
    }

    /// Returns the error message if the result is `Invalid`, otherwise `None`.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        self.error().map(|e| e.message.clone())
    }

    /// Combine two results, returning the first error if any.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match self {
            Self::Valid => other,
            Self::Invalid(_) => self,
        }
    }
}

// ---------------------------------------------------------------------------
// ValidationErrors
// ---------------------------------------------------------------------------

/// Errors attached to a control, keyed by error code.
///
/// Serializes as a flat object, e.g. `{"email":"Email already exists."}`.
/// When two validators report the same code, the first one wins.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    by_code: BTreeMap<&'static str, String>,
}

impl ValidationErrors {
    /// An empty error set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error unless its code is already present.
    pub fn insert(&mut self, error: ValidationError) {
        self.by_code.entry(error.code).or_insert(error.message);
    }

    /// Record the error carried by `result`, if any.
    pub fn absorb(&mut self, result: ValidationResult) {
        if let ValidationResult::Invalid(error) = result {
            self.insert(error);
        }
    }

    /// The message recorded under `code`.
    #[must_use]
    pub fn get(&self, code: &str) -> Option<&str> {
        self.by_code.get(code).map(String::as_str)
    }

    /// Whether an error with `code` is present.
    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.by_code.contains_key(code)
    }

    /// Number of distinct error codes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    /// Whether there are no errors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }

    /// Iterate `(code, message)` pairs in code order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.by_code.iter().map(|(code, msg)| (*code, msg.as_str()))
    }

    /// `None` when empty, otherwise `Some(self)`.
    #[must_use]
    pub fn into_option(self) -> Option<Self> {
        (!self.is_empty()).then_some(self)
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        let mut errors = Self::new();
        errors.insert(error);
        errors
    }
}

// ---------------------------------------------------------------------------
// Validator Trait
// ---------------------------------------------------------------------------

/// A synchronous validator for values of type `T`.
///
/// # Implementing a Custom Validator
///
/// ```rust
/// use mailpick_validation::{Validator, ValidationResult, ValidationError};
///
/// struct NoSpaces;
///
/// impl Validator<str> for NoSpaces {
///     fn validate(&self, value: &str) -> ValidationResult {
///         if value.contains(' ') {
///             ValidationResult::Invalid(
///                 ValidationError::new("no_spaces", "Value must not contain spaces")
///             )
///         } else {
///             ValidationResult::Valid
///         }
///     }
///
///     fn error_message(&self) -> &str {
///         "Value must not contain spaces"
///     }
/// }
/// ```
pub trait Validator<T: ?Sized>: Send + Sync {
    /// Validate the given value.
    fn validate(&self, value: &T) -> ValidationResult;

    /// Return the default error message for this validator.
    fn error_message(&self) -> &str;

    /// Skip this validator while the control is pristine.
    fn dirty_only(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// UsernameFormat
// ---------------------------------------------------------------------------

/// Restricts the username to ASCII letters and digits.
///
/// Incomplete values (empty username or domain) always pass; the check only
/// applies once the user has touched the control.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsernameFormat;

impl UsernameFormat {
    /// Create a new `UsernameFormat` validator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Validator<EmailValue> for UsernameFormat {
    fn validate(&self, value: &EmailValue) -> ValidationResult {
        if !value.is_complete() || USERNAME_RE.is_match(&value.username) {
            ValidationResult::Valid
        } else {
            ValidationResult::Invalid(ValidationError::new(
                ERROR_CODE_EMAIL,
                USERNAME_FORMAT_MESSAGE,
            ))
        }
    }

    fn error_message(&self) -> &str {
        USERNAME_FORMAT_MESSAGE
    }

    fn dirty_only(&self) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
