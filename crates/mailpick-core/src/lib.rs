#![forbid(unsafe_code)]

//! Core types for the mailpick email selector.
//!
//! - [`email::EmailValue`]: the `username@domain` value the selector edits
//! - [`event`]: input events understood by the selector widget
//! - [`debounce`]: latest-wins debouncing driven by injected time
//! - [`logging`]: tracing re-exports with no-op fallbacks

pub mod debounce;
pub mod email;
pub mod event;
pub mod logging;

pub use debounce::{DebouncedFn, Debouncer};
pub use email::EmailValue;
