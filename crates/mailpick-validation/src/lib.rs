#![forbid(unsafe_code)]

//! Validation for the mailpick email selector.
//!
//! This crate provides:
//! - A [`Validator`] trait plus the username format check
//! - A token-based [`CheckCoordinator`] that discards stale async results
//! - The [`AvailabilityLookup`] backend seam and its [`MockDirectory`]
//! - The [`AvailabilityChecker`] that drives lookups and the loading flag
//!
//! # Example
//!
//! ```rust
//! use std::time::{Duration, Instant};
//! use mailpick_core::EmailValue;
//! use mailpick_validation::{AsyncValidator, AvailabilityChecker, UsernameFormat, Validator};
//!
//! assert!(UsernameFormat::new().validate(&EmailValue::new("johndoe123", "adi.so")).is_valid());
//! assert!(UsernameFormat::new().validate(&EmailValue::new("john_doe", "adi.so")).is_invalid());
//!
//! let t0 = Instant::now();
//! let mut checker = AvailabilityChecker::with_mock_directory();
//! assert!(checker.begin_at(&EmailValue::new("john", "adi.so"), t0));
//! assert!(checker.is_loading());
//!
//! let result = checker.tick_at(t0 + Duration::from_secs(1)).unwrap();
//! assert_eq!(result.error_message().as_deref(), Some("Email already exists."));
//! assert!(!checker.is_loading());
//! ```

pub mod async_validation;
pub mod availability;
pub mod lookup;
mod validators;

pub use async_validation::{
    AsyncValidator, CheckCoordinator, CheckEvent, CheckToken, CheckTrace, InFlightCheck,
    MAX_TRACE_EVENTS,
};
pub use availability::{AvailabilityChecker, EMAIL_TAKEN_MESSAGE};
pub use lookup::{AvailabilityLookup, DEFAULT_LOOKUP_LATENCY, LookupError, MockDirectory};
pub use validators::{
    ERROR_CODE_EMAIL, USERNAME_FORMAT_MESSAGE, UsernameFormat, ValidationError, ValidationErrors,
    ValidationResult, Validator,
};
