#![forbid(unsafe_code)]

//! The feedback line shown under the selector.

use std::fmt;

use mailpick_validation::ERROR_CODE_EMAIL;

use crate::control::FormControl;

/// Braille dot spinner animation frames.
pub const DOTS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Shown next to the spinner while a check is in flight.
pub const CHECKING_MESSAGE: &str = "Checking availability...";

/// Shown when no check is running and there is no email error.
pub const AVAILABLE_MESSAGE: &str = "Email available.";

/// Spinner animation position.
#[derive(Debug, Clone, Default)]
pub struct SpinnerState {
    /// Index of the currently displayed animation frame.
    pub current_frame: usize,
}

impl SpinnerState {
    /// Advance to the next animation frame.
    pub fn tick(&mut self) {
        self.current_frame = self.current_frame.wrapping_add(1);
    }

    /// The glyph for the current frame.
    #[must_use]
    pub fn frame(&self) -> &'static str {
        DOTS[self.current_frame % DOTS.len()]
    }
}

/// What the feedback line says.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusLine {
    /// A check is in flight.
    Checking { frame: &'static str },
    /// The control carries an email error.
    Error(String),
    /// Nothing to report.
    Available,
}

impl StatusLine {
    /// Pick the line for `control`: loading first, then the email error,
    /// then success.
    #[must_use]
    pub fn for_control<V>(control: &FormControl<V>, spinner: &SpinnerState) -> Self {
        if control.is_loading() {
            Self::Checking {
                frame: spinner.frame(),
            }
        } else if let Some(message) = control.get_error(ERROR_CODE_EMAIL) {
            Self::Error(message.to_string())
        } else {
            Self::Available
        }
    }

    /// Whether this line reports an error.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Checking { frame } => write!(f, "{frame} {CHECKING_MESSAGE}"),
            Self::Error(message) => f.write_str(message),
            Self::Available => f.write_str(AVAILABLE_MESSAGE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    use mailpick_core::EmailValue;
    use mailpick_validation::{AvailabilityChecker, UsernameFormat};

    fn control() -> FormControl<EmailValue> {
        FormControl::new(EmailValue::new("john", "sreyaj.dev"))
            .with_validator(UsernameFormat::new())
            .with_async_validator(AvailabilityChecker::with_mock_directory())
    }

    #[test]
    fn spinner_wraps() {
        let mut spinner = SpinnerState::default();
        assert_eq!(spinner.frame(), "⠋");
        for _ in 0..DOTS.len() {
            spinner.tick();
        }
        assert_eq!(spinner.frame(), "⠋");
        spinner.tick();
        assert_eq!(spinner.frame(), "⠙");
    }

    #[test]
    fn pristine_control_reads_available() {
        let line = StatusLine::for_control(&control(), &SpinnerState::default());
        assert_eq!(line, StatusLine::Available);
        assert_eq!(line.to_string(), "Email available.");
    }

    #[test]
    fn loading_wins_over_everything() {
        let t0 = Instant::now();
        let mut c = control();
        c.on_change_at(EmailValue::new("john", "adi.so"), t0);
        let line = StatusLine::for_control(&c, &SpinnerState::default());
        assert_eq!(line.to_string(), "⠋ Checking availability...");
    }

    #[test]
    fn error_after_check() {
        let t0 = Instant::now();
        let mut c = control();
        c.on_change_at(EmailValue::new("john", "adi.so"), t0);
        c.tick_at(t0 + Duration::from_secs(1));
        let line = StatusLine::for_control(&c, &SpinnerState::default());
        assert!(line.is_error());
        assert_eq!(line.to_string(), "Email already exists.");
    }

    #[test]
    fn format_error_shown() {
        let mut c = control();
        c.on_change_at(EmailValue::new("john doe", "adi.so"), Instant::now());
        assert_eq!(
            StatusLine::for_control(&c, &SpinnerState::default()).to_string(),
            "Username can only contain numbers & alphabets."
        );
    }
}
