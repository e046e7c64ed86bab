#![forbid(unsafe_code)]

//! Demo application model and event loop.
//!
//! [`App`] holds one email selector bound to a validated control and knows
//! how to turn terminal events into selector input and how to draw itself.
//! It never touches the terminal; [`run`] owns the [`TerminalSession`] and
//! drives the model with real time.

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers};
use mailpick_core::EmailValue;
use mailpick_core::event::{KeyInput, SelectorEvent};
use mailpick_validation::{AvailabilityChecker, MockDirectory, UsernameFormat};
use mailpick_widgets::{BoundControl, EmailSelector, FormControl, SpinnerState, StatusLine};

use crate::cli::Opts;
use crate::terminal::TerminalSession;

/// Upper bound on the time between redraws.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(80);

/// The value the control starts with.
#[must_use]
pub fn initial_value() -> EmailValue {
    EmailValue::new("john", "sreyaj.dev")
}

/// Input the demo reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Forward to the selector.
    Selector(SelectorEvent),
    /// Leave the demo.
    Quit,
}

/// Translate a terminal event. Returns `None` for events the demo ignores.
#[must_use]
pub fn map_event(event: &Event) -> Option<AppEvent> {
    match event {
        Event::Key(key) => {
            if key.kind != KeyEventKind::Release
                && key.modifiers.contains(KeyModifiers::CONTROL)
                && matches!(key.code, KeyCode::Char('c' | 'd'))
            {
                return Some(AppEvent::Quit);
            }
            KeyInput::from_crossterm(key).map(|k| AppEvent::Selector(SelectorEvent::Key(k)))
        }
        Event::FocusLost => Some(AppEvent::Selector(SelectorEvent::Blur)),
        _ => None,
    }
}

/// The demo's state.
#[derive(Debug)]
pub struct App {
    bound: BoundControl<EmailSelector>,
    spinner: SpinnerState,
    started: Instant,
    exit_after: Option<Duration>,
    quit: bool,
}

impl App {
    /// Build the selector, its control, and the mock directory from `opts`.
    #[must_use]
    pub fn new(opts: &Opts, now: Instant) -> Self {
        let directory = MockDirectory::default().with_latency(opts.config.lookup_latency);
        let control = FormControl::new(initial_value())
            .with_validator(UsernameFormat::new())
            .with_async_validator(AvailabilityChecker::with_epoch(Arc::new(directory), now));
        let selector = EmailSelector::from_config(&opts.config);

        tracing::info!(
            domains = ?opts.config.domains,
            debounce_ms = opts.config.debounce.as_millis() as u64,
            latency_ms = opts.config.lookup_latency.as_millis() as u64,
            "demo started"
        );

        Self {
            bound: BoundControl::new_at(selector, control, now),
            spinner: SpinnerState::default(),
            started: now,
            exit_after: opts.exit_after(),
            quit: false,
        }
    }

    /// The selector and its control.
    #[must_use]
    pub fn bound(&self) -> &BoundControl<EmailSelector> {
        &self.bound
    }

    /// Whether the loop should stop.
    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Apply one input event.
    pub fn handle(&mut self, event: AppEvent, now: Instant) {
        match event {
            AppEvent::Quit => self.quit = true,
            AppEvent::Selector(event) => {
                let update = self.bound.handle_event_at(&event, now);
                if !update.is_empty() {
                    self.log_state("input");
                }
            }
        }
    }

    /// Advance timers: debounce, lookups, spinner, and auto-exit.
    pub fn tick(&mut self, now: Instant) {
        if let Some(limit) = self.exit_after {
            if now.saturating_duration_since(self.started) >= limit {
                tracing::info!(after_ms = limit.as_millis() as u64, "auto-exit");
                self.quit = true;
            }
        }

        let update = self.bound.tick_at(now);
        if !update.is_empty() {
            self.log_state("tick");
        }
        if self.bound.control().is_loading() {
            self.spinner.tick();
        }
    }

    /// How long the loop may block waiting for input.
    #[must_use]
    pub fn poll_timeout(&self, now: Instant) -> Duration {
        let mut timeout = FRAME_INTERVAL;
        if let Some(next) = self.bound.time_until_next_tick(now) {
            timeout = timeout.min(next);
        }
        if let Some(limit) = self.exit_after {
            let left = limit.saturating_sub(now.saturating_duration_since(self.started));
            timeout = timeout.min(left);
        }
        timeout
    }

    /// The status line under the selector.
    #[must_use]
    pub fn status_line(&self) -> StatusLine {
        StatusLine::for_control(self.bound.control(), &self.spinner)
    }

    /// Screen contents, one string per row.
    #[must_use]
    pub fn view(&self) -> Vec<String> {
        let control = self.bound.control();
        let yes_no = |b: bool| if b { "yes" } else { "no" };
        vec![
            "mailpick demo  (Ctrl+C quits, run with --help for keys)".to_string(),
            String::new(),
            format!("  {}", self.bound.accessor().render_line()),
            format!("  {}", self.status_line()),
            String::new(),
            format!(
                "  value: {}  status: {}  dirty: {}  touched: {}",
                control.value(),
                control.status(),
                yes_no(control.is_dirty()),
                yes_no(control.is_touched()),
            ),
        ]
    }

    /// Tear down the selector and any check in flight.
    pub fn dispose(&mut self, now: Instant) {
        self.bound.dispose_at(now);
        tracing::info!("demo disposed");
    }

    fn log_state(&self, source: &'static str) {
        match serde_json::to_string(&self.bound.control().snapshot()) {
            Ok(json) => tracing::debug!(source, state = %json, "control state"),
            Err(e) => tracing::warn!(error = %e, "failed to encode control state"),
        }
    }
}

/// Run the interactive demo until the user quits.
pub fn run(opts: &Opts) -> io::Result<()> {
    let session = TerminalSession::new()?;
    let mut app = App::new(opts, Instant::now());

    while !app.should_quit() {
        let now = Instant::now();
        app.tick(now);
        session.draw(&app.view())?;
        if app.should_quit() {
            break;
        }

        if let Some(event) = session.poll_event(app.poll_timeout(now))? {
            if let Some(event) = map_event(&event) {
                app.handle(event, Instant::now());
            }
        }
    }

    app.dispose(Instant::now());
    Ok(())
}
