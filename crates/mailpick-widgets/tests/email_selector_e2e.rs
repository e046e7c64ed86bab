#![forbid(unsafe_code)]

//! End-to-end tests for the email selector bound to its form control.
//!
//! These tests drive a [`BoundControl<EmailSelector>`] with keystrokes and
//! injected time, covering:
//!
//! - Debounced username emission and the availability check it starts
//! - Immediate emission on domain change
//! - Format errors blocking the availability check
//! - Switch-to-latest when the user keeps typing during a check
//! - The status line through a full check
//! - Teardown while a check is in flight
//!
//! # Invariants
//!
//! 1. **Loading window**: the control is loading strictly between a check
//!    starting and its resolution, and never after disposal.
//! 2. **Latest wins**: only the last value typed is ever validated against
//!    the directory.
//! 3. **Error precedence**: the status line shows loading over errors and
//!    errors over success.
//!
//! Run: `cargo test -p mailpick-widgets --test email_selector_e2e`

use std::sync::Arc;
use std::time::{Duration, Instant};

use mailpick_core::EmailValue;
use mailpick_core::event::{Field, KeyInput, SelectorEvent};
use mailpick_validation::{
    AvailabilityChecker, EMAIL_TAKEN_MESSAGE, ERROR_CODE_EMAIL, MockDirectory,
    USERNAME_FORMAT_MESSAGE, UsernameFormat,
};
use mailpick_widgets::{
    BoundControl, ControlStatus, EmailSelector, FormControl, SelectorConfig, SpinnerState,
    StatusLine,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn selector_at(t0: Instant, initial: EmailValue) -> BoundControl<EmailSelector> {
    let control = FormControl::new(initial)
        .with_validator(UsernameFormat::new())
        .with_async_validator(AvailabilityChecker::with_epoch(
            Arc::new(MockDirectory::default()),
            t0,
        ));
    BoundControl::new_at(EmailSelector::default(), control, t0)
}

fn type_text(
    bound: &mut BoundControl<EmailSelector>,
    text: &str,
    start: Instant,
    step: Duration,
) -> Instant {
    let mut now = start;
    for c in text.chars() {
        bound.handle_event_at(&KeyInput::Char(c).into(), now);
        bound.tick_at(now);
        now += step;
    }
    now
}

fn erase(bound: &mut BoundControl<EmailSelector>, count: usize, now: Instant) {
    for _ in 0..count {
        bound.handle_event_at(&KeyInput::Backspace.into(), now);
    }
}

fn status(bound: &BoundControl<EmailSelector>) -> String {
    StatusLine::for_control(bound.control(), &SpinnerState::default()).to_string()
}

/// Tick every 10ms from `from` to `to` inclusive, recording when loading flips.
fn run(
    bound: &mut BoundControl<EmailSelector>,
    from: Instant,
    to: Instant,
) -> Vec<(Duration, bool)> {
    let mut flips = Vec::new();
    let mut loading = bound.control().is_loading();
    let mut now = from;
    while now <= to {
        bound.tick_at(now);
        let l = bound.control().is_loading();
        if l != loading {
            flips.push((now - from, l));
            loading = l;
        }
        now += ms(10);
    }
    flips
}

// ---------------------------------------------------------------------------
// Initial state
// ---------------------------------------------------------------------------

#[test]
fn initial_value_reads_available_without_checking() {
    let t0 = Instant::now();
    let bound = selector_at(t0, EmailValue::new("john", "sreyaj.dev"));
    assert_eq!(bound.accessor().render_line(), "[           john_] @ [  sreyaj.dev  ]");
    assert!(!bound.control().is_loading());
    assert_eq!(status(&bound), "Email available.");
}

// ---------------------------------------------------------------------------
// Typing
// ---------------------------------------------------------------------------

#[test]
fn typing_a_taken_name_reports_it_after_debounce_and_lookup() {
    let t0 = Instant::now();
    let mut bound = selector_at(t0, EmailValue::new("", "adi.so"));

    let after = type_text(&mut bound, "jane", t0, ms(80));
    let last_key = after - ms(80);
    assert!(!bound.control().is_loading(), "nothing emitted while typing");

    let flips = run(&mut bound, last_key, last_key + ms(2000));
    assert_eq!(flips, vec![(ms(500), true), (ms(1500), false)]);
    assert_eq!(bound.control().get_error(ERROR_CODE_EMAIL), Some(EMAIL_TAKEN_MESSAGE));
    assert_eq!(status(&bound), "Email already exists.");
}

#[test]
fn free_name_reads_available() {
    let t0 = Instant::now();
    let mut bound = selector_at(t0, EmailValue::new("", "adi.so"));
    let after = type_text(&mut bound, "mike", t0, ms(50));
    run(&mut bound, after, after + ms(2000));
    assert_eq!(bound.control().status(), ControlStatus::Valid);
    assert_eq!(status(&bound), "Email available.");
}

#[test]
fn format_error_shows_without_loading() {
    let t0 = Instant::now();
    let mut bound = selector_at(t0, EmailValue::new("", "adi.so"));
    let after = type_text(&mut bound, "john_doe", t0, ms(50));
    let flips = run(&mut bound, after, after + ms(2000));
    assert!(flips.is_empty());
    assert_eq!(bound.control().get_error(ERROR_CODE_EMAIL), Some(USERNAME_FORMAT_MESSAGE));
}

#[test]
fn continuing_to_type_during_check_only_validates_latest() {
    let t0 = Instant::now();
    let mut bound = selector_at(t0, EmailValue::new("", "adi.so"));

    let after = type_text(&mut bound, "john", t0, ms(50));
    // Debounce fires, check for "john" starts.
    run(&mut bound, after, after + ms(500));
    assert!(bound.control().is_loading());

    // Keep typing before the check returns.
    let resume = after + ms(600);
    let after = type_text(&mut bound, "ny", resume, ms(50));
    run(&mut bound, after, after + ms(3000));

    assert_eq!(bound.control().value().username, "johnny");
    assert_eq!(bound.control().status(), ControlStatus::Valid);
    assert!(!bound.control().is_loading());
}

#[test]
fn erasing_to_empty_clears_check() {
    let t0 = Instant::now();
    let mut bound = selector_at(t0, EmailValue::new("", "adi.so"));
    let after = type_text(&mut bound, "jo", t0, ms(50));
    run(&mut bound, after, after + ms(600));
    assert!(bound.control().is_loading());

    erase(&mut bound, 2, after + ms(700));
    run(&mut bound, after + ms(700), after + ms(1300));
    assert_eq!(bound.control().value().username, "");
    assert!(!bound.control().is_loading());
    assert_eq!(bound.control().status(), ControlStatus::Valid);
}

// ---------------------------------------------------------------------------
// Domain picker
// ---------------------------------------------------------------------------

#[test]
fn switching_domain_checks_immediately() {
    let t0 = Instant::now();
    let mut bound = selector_at(t0, EmailValue::new("john", "sreyaj.dev"));

    bound.handle_event_at(&KeyInput::Tab.into(), t0);
    assert_eq!(bound.accessor().focus(), Field::Domain);
    let update = bound.handle_event_at(&KeyInput::Right.into(), t0);
    assert!(update.value_changed);
    assert_eq!(bound.control().value(), &EmailValue::new("john", "adi.so"));
    assert!(bound.control().is_loading());

    let flips = run(&mut bound, t0, t0 + ms(1500));
    assert_eq!(flips, vec![(ms(1000), false)]);
    assert_eq!(status(&bound), "Email already exists.");

    // Back to a domain where everything is free.
    bound.handle_event_at(&KeyInput::Left.into(), t0 + ms(2000));
    run(&mut bound, t0 + ms(2000), t0 + ms(3000));
    assert_eq!(status(&bound), "Email available.");
}

#[test]
fn domain_change_absorbs_pending_username_edit() {
    let t0 = Instant::now();
    let mut bound = selector_at(t0, EmailValue::new("", "sreyaj.dev"));
    type_text(&mut bound, "jane", t0, ms(20));

    let update =
        bound.handle_event_at(&SelectorEvent::DomainSelected("adi.so".into()), t0 + ms(100));
    assert!(update.value_changed);
    assert_eq!(bound.control().value(), &EmailValue::new("jane", "adi.so"));

    // The debounced username emit never arrives on its own.
    let mut emitted_late = false;
    let mut now = t0 + ms(100);
    while now <= t0 + ms(900) {
        emitted_late |= bound.tick_at(now).value_changed;
        now += ms(10);
    }
    assert!(!emitted_late);
}

// ---------------------------------------------------------------------------
// Touch and teardown
// ---------------------------------------------------------------------------

#[test]
fn blur_marks_touched_not_dirty() {
    let t0 = Instant::now();
    let mut bound = selector_at(t0, EmailValue::new("john", "sreyaj.dev"));
    bound.handle_event_at(&SelectorEvent::Blur, t0);
    assert!(bound.control().is_touched());
    assert!(bound.control().is_pristine());
}

#[test]
fn dispose_mid_check_clears_loading_for_good() {
    let t0 = Instant::now();
    let mut bound = selector_at(t0, EmailValue::new("", "adi.so"));
    let after = type_text(&mut bound, "john", t0, ms(50));
    run(&mut bound, after, after + ms(600));
    assert!(bound.control().is_loading());

    bound.dispose_at(after + ms(700));
    assert!(!bound.control().is_loading());
    let flips = run(&mut bound, after + ms(700), after + ms(3000));
    assert!(flips.is_empty());
    assert!(bound.control().errors().is_none());
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[test]
fn configured_domains_and_timings() {
    let t0 = Instant::now();
    let config = SelectorConfig::default()
        .with_domains(["corp.io", "adi.so"])
        .with_debounce(ms(100))
        .with_lookup_latency(ms(200));
    let directory = MockDirectory::default()
        .with_domain("corp.io", ["admin"])
        .with_latency(config.lookup_latency);
    let control = FormControl::new(EmailValue::new("", "corp.io"))
        .with_validator(UsernameFormat::new())
        .with_async_validator(AvailabilityChecker::with_epoch(Arc::new(directory), t0));
    let mut bound = BoundControl::new_at(EmailSelector::from_config(&config), control, t0);

    let after = type_text(&mut bound, "admin", t0, ms(10));
    let flips = run(&mut bound, after - ms(10), after + ms(1000));
    assert_eq!(flips, vec![(ms(100), true), (ms(300), false)]);
    assert_eq!(bound.control().get_error(ERROR_CODE_EMAIL), Some(EMAIL_TAKEN_MESSAGE));
}
