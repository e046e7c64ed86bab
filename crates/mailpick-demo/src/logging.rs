#![forbid(unsafe_code)]

//! File-backed log sink for the demo.
//!
//! The terminal belongs to the UI, so log output never goes to stdout or
//! stderr while the demo runs. When a filter is configured, events are
//! formatted by `tracing_subscriber::fmt` into a log file instead.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Why the log sink could not be installed.
#[derive(Debug)]
pub enum LogError {
    /// The filter directive did not parse.
    Filter(String),
    /// The log file could not be opened.
    Io { path: PathBuf, source: io::Error },
    /// A global subscriber was already installed.
    SubscriberAlreadySet,
}

impl fmt::Display for LogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogError::Filter(msg) => write!(f, "invalid log filter: {msg}"),
            LogError::Io { path, source } => {
                write!(f, "cannot open log file {}: {source}", path.display())
            }
            LogError::SubscriberAlreadySet => write!(f, "a log subscriber is already installed"),
        }
    }
}

impl std::error::Error for LogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LogError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Parse a filter directive such as `debug` or `mailpick_validation=trace`.
pub fn parse_filter(directive: &str) -> Result<EnvFilter, LogError> {
    EnvFilter::try_new(directive).map_err(|e| LogError::Filter(e.to_string()))
}

/// Open (append) the log file at `path`.
pub fn open_log_file(path: &Path) -> Result<File, LogError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LogError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Install the global subscriber writing to `path`, if `filter` is set.
///
/// Returns `Ok(false)` when logging is off.
pub fn install(filter: Option<&str>, path: &Path) -> Result<bool, LogError> {
    let Some(directive) = filter else {
        return Ok(false);
    };
    let filter = parse_filter(directive)?;
    let file = open_log_file(path)?;

    let layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(Mutex::new(file));
    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .map_err(|_| LogError::SubscriberAlreadySet)?;

    tracing::info!(
        filter = directive,
        path = %path.display(),
        version = crate::cli::VERSION,
        "logging started"
    );
    Ok(true)
}
