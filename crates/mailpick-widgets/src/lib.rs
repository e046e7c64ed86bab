#![forbid(unsafe_code)]

//! The mailpick email selector and its host form control.
//!
//! - [`EmailSelector`]: the composite username and domain input
//! - [`ValueAccessor`]: the widget side of the control bridge
//! - [`FormControl`]: value, dirty and touched state, and validation
//! - [`BoundControl`]: a selector registered with its control
//! - [`StatusLine`]: the loading, error, or success line under the field
//! - [`SelectorConfig`]: domains and timings, with environment overrides

pub mod accessor;
pub mod binding;
pub mod config;
pub mod control;
pub mod email_selector;
pub mod status;

pub use accessor::{ControlSignal, ValueAccessor};
pub use binding::{BindingUpdate, BoundControl};
pub use config::{ConfigError, DEFAULT_DEBOUNCE, DEFAULT_DOMAINS, SelectorConfig};
pub use control::{ControlSnapshot, ControlStatus, FormControl};
pub use email_selector::EmailSelector;
pub use status::{SpinnerState, StatusLine};
