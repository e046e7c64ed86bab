#![forbid(unsafe_code)]

//! Headless runs of the demo app: real key events, simulated clock.
//!
//! Run: `cargo test -p mailpick-demo --test app_flow`

use std::time::{Duration, Instant};

use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use mailpick_demo::app::{App, AppEvent, map_event};
use mailpick_demo::cli::{Command, Opts};
use mailpick_widgets::ControlStatus;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn press(app: &mut App, code: KeyCode, now: Instant) {
    let event = Event::Key(KeyEvent::new(code, KeyModifiers::NONE));
    if let Some(event) = map_event(&event) {
        app.handle(event, now);
    }
}

fn type_text(app: &mut App, text: &str, now: Instant) {
    for c in text.chars() {
        press(app, KeyCode::Char(c), now);
    }
}

fn opts(args: &[&str]) -> Opts {
    match Opts::parse_from(args, |_| None).unwrap() {
        Command::Run(opts) => opts,
        other => panic!("expected Run, got {other:?}"),
    }
}

// ═════════════════════════════════════════════════════════════════════════
// Typing
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn retyping_a_taken_name_on_adi_so() {
    let t0 = Instant::now();
    let mut app = App::new(&opts(&["--debounce-ms=100", "--latency-ms=200"]), t0);

    // Domain first, then clear "john" and type "jane".
    press(&mut app, KeyCode::Tab, t0);
    press(&mut app, KeyCode::Right, t0);
    press(&mut app, KeyCode::Tab, t0);
    for _ in 0..4 {
        press(&mut app, KeyCode::Backspace, t0);
    }
    type_text(&mut app, "jane", t0);

    app.tick(t0 + ms(100));
    assert_eq!(app.bound().control().status(), ControlStatus::Pending);
    assert_eq!(app.bound().control().value().to_string(), "jane@adi.so");

    app.tick(t0 + ms(300));
    assert_eq!(app.bound().control().status(), ControlStatus::Invalid);
    assert_eq!(app.view()[3], "  Email already exists.");
}

#[test]
fn bad_character_is_rejected_without_a_lookup() {
    let t0 = Instant::now();
    let mut app = App::new(&opts(&["--debounce-ms=100"]), t0);

    type_text(&mut app, "-x", t0);
    app.tick(t0 + ms(100));

    let control = app.bound().control();
    assert_eq!(control.status(), ControlStatus::Invalid);
    assert!(!control.is_loading());
    assert_eq!(control.value().to_string(), "john-x@sreyaj.dev");
    assert!(app.view()[3].contains("Username can only contain"));
}

#[test]
fn escape_marks_touched() {
    let t0 = Instant::now();
    let mut app = App::new(&Opts::default(), t0);
    press(&mut app, KeyCode::Esc, t0);
    assert!(app.bound().control().is_touched());
    assert!(app.view()[5].ends_with("touched: yes"));
}

// ═════════════════════════════════════════════════════════════════════════
// Lifecycle
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn ctrl_c_ends_the_loop() {
    let t0 = Instant::now();
    let mut app = App::new(&Opts::default(), t0);
    let quit = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
    assert_eq!(map_event(&quit), Some(AppEvent::Quit));
    app.handle(AppEvent::Quit, t0);
    assert!(app.should_quit());
}

#[test]
fn input_after_dispose_is_ignored() {
    let t0 = Instant::now();
    let mut app = App::new(&Opts::default(), t0);
    app.dispose(t0);
    type_text(&mut app, "zz", t0 + ms(1));
    app.tick(t0 + ms(2000));
    assert_eq!(app.bound().control().value().to_string(), "john@sreyaj.dev");
    assert!(!app.bound().control().is_loading());
}
