#![forbid(unsafe_code)]

//! Terminal demo for the mailpick email selector.
//!
//! The binary wires an [`app::App`] to a raw-mode [`terminal::TerminalSession`].
//! Everything except the terminal itself is usable without a TTY, which is
//! how the tests drive it.

pub mod app;
pub mod cli;
pub mod logging;
pub mod terminal;
