#![forbid(unsafe_code)]

//! Raw-mode terminal session with guaranteed cleanup.
//!
//! [`TerminalSession`] enters raw mode and the alternate screen, and turns on
//! focus events so a window losing focus counts as leaving the field. Every
//! mode it enables is undone on drop, and a panic hook does the same on the
//! way out of a panic.

use std::io::{self, Write};
use std::sync::OnceLock;
use std::time::Duration;

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{DisableFocusChange, EnableFocusChange, Event};
use crossterm::style::Print;
use crossterm::terminal::{
    Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode,
    enable_raw_mode,
};
use crossterm::{execute, queue};

/// An active raw-mode session.
#[derive(Debug)]
pub struct TerminalSession {
    alternate_screen_enabled: bool,
    focus_events_enabled: bool,
}

impl TerminalSession {
    /// Enter raw mode, the alternate screen, and focus reporting.
    ///
    /// # Errors
    ///
    /// Returns an error if raw mode cannot be enabled.
    pub fn new() -> io::Result<Self> {
        install_panic_hook();

        enable_raw_mode()?;
        tracing::info!("terminal raw mode enabled");

        let mut session = Self {
            alternate_screen_enabled: false,
            focus_events_enabled: false,
        };
        let mut stdout = io::stdout();

        execute!(stdout, EnterAlternateScreen, Hide)?;
        session.alternate_screen_enabled = true;

        // Not every terminal reports focus; losing it is harmless.
        match execute!(stdout, EnableFocusChange) {
            Ok(()) => session.focus_events_enabled = true,
            Err(e) => tracing::debug!(error = %e, "focus events unavailable"),
        }

        Ok(session)
    }

    /// Wait up to `timeout` for an input event.
    pub fn poll_event(&self, timeout: Duration) -> io::Result<Option<Event>> {
        if crossterm::event::poll(timeout)? {
            crossterm::event::read().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Replace the screen contents with `lines`.
    pub fn draw(&self, lines: &[String]) -> io::Result<()> {
        let mut stdout = io::stdout();
        queue!(stdout, Clear(ClearType::All))?;
        for (row, line) in lines.iter().enumerate() {
            let row = u16::try_from(row).unwrap_or(u16::MAX);
            queue!(stdout, MoveTo(0, row), Print(line))?;
        }
        stdout.flush()
    }

    fn cleanup(&mut self) {
        let mut stdout = io::stdout();

        if self.focus_events_enabled {
            let _ = execute!(stdout, DisableFocusChange);
            self.focus_events_enabled = false;
        }

        let _ = execute!(stdout, Show);

        if self.alternate_screen_enabled {
            let _ = execute!(stdout, LeaveAlternateScreen);
            self.alternate_screen_enabled = false;
        }

        let _ = disable_raw_mode();
        tracing::info!("terminal restored");
        let _ = stdout.flush();
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        self.cleanup();
    }
}

fn install_panic_hook() {
    static HOOK: OnceLock<()> = OnceLock::new();
    HOOK.get_or_init(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            best_effort_cleanup();
            previous(info);
        }));
    });
}

fn best_effort_cleanup() {
    let mut stdout = io::stdout();
    let _ = execute!(stdout, DisableFocusChange, Show, LeaveAlternateScreen);
    let _ = disable_raw_mode();
    let _ = stdout.flush();
}
