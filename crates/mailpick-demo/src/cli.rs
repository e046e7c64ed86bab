#![forbid(unsafe_code)]

//! Command-line argument parsing for the demo.
//!
//! Parses args by hand. Environment variables with the `MAILPICK_` prefix
//! provide defaults that explicit flags override.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use mailpick_widgets::SelectorConfig;
use mailpick_widgets::config::{ConfigError, parse_millis};

/// Crate version, as shown by `--version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Auto-exit delay in milliseconds.
pub const ENV_EXIT_AFTER_MS: &str = "MAILPICK_EXIT_AFTER_MS";
/// Log filter directive; logging stays off when unset.
pub const ENV_LOG: &str = "MAILPICK_LOG";
/// Log file path.
pub const ENV_LOG_FILE: &str = "MAILPICK_LOG_FILE";

/// Log file used when `MAILPICK_LOG` is set without a path.
pub const DEFAULT_LOG_FILE: &str = "mailpick-demo.log";

/// Usage text printed by `--help`.
pub const HELP_TEXT: &str = "\
mailpick demo: pick a username@domain and watch it get checked

USAGE:
    mailpick-demo [OPTIONS]

OPTIONS:
    --debounce-ms=N      Quiet period before a username edit is checked (default: 500)
    --latency-ms=N       Simulated directory round-trip (default: 1000)
    --exit-after-ms=N    Quit automatically after N milliseconds (0 = never)
    --log-file=PATH      Write logs to PATH (default: mailpick-demo.log)
    --help, -h           Show this help message
    --version, -V        Show version

KEYBINDINGS:
    a-z, 0-9        Type the username
    Backspace       Delete the last character
    Tab / Shift-Tab Switch between username and domain
    Left / Right    Pick the previous / next domain
    Esc             Leave the field (marks it touched)
    Ctrl+C          Quit

TRY:
    john@adi.so and jane@adi.so are taken; everything on sreyaj.dev is free.

ENVIRONMENT VARIABLES (flags take precedence):
    MAILPICK_DEBOUNCE_MS      Default for --debounce-ms
    MAILPICK_LATENCY_MS       Default for --latency-ms
    MAILPICK_EXIT_AFTER_MS    Default for --exit-after-ms
    MAILPICK_DOMAINS          Comma-separated domain list
    MAILPICK_LOG              Log filter, e.g. 'debug' or 'mailpick_validation=trace'
    MAILPICK_LOG_FILE         Default for --log-file";

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opts {
    /// Selector and directory settings.
    pub config: SelectorConfig,
    /// Auto-exit after this many milliseconds (0 = disabled).
    pub exit_after_ms: u64,
    /// Log filter directive; logging is off when `None`.
    pub log_filter: Option<String>,
    /// Where log output goes.
    pub log_file: PathBuf,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            config: SelectorConfig::default(),
            exit_after_ms: 0,
            log_filter: None,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start the demo with these options.
    Run(Opts),
    /// Print usage and exit.
    Help,
    /// Print the version and exit.
    Version,
}

/// Why the command line was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliError {
    /// An environment variable held a bad value.
    Config(ConfigError),
    /// A flag held a bad value.
    InvalidValue { flag: &'static str, value: String },
    /// An argument was not recognized.
    UnknownArgument(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(e) => write!(f, "{e}"),
            CliError::InvalidValue { flag, value } => write!(f, "Invalid {flag} value: {value}"),
            CliError::UnknownArgument(arg) => write!(f, "Unknown argument: {arg}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl Opts {
    /// Parse the process arguments and environment.
    pub fn parse() -> Result<Command, CliError> {
        Self::parse_from(env::args().skip(1), |key| env::var(key).ok())
    }

    /// Parse `args` (without the program name) with `lookup` standing in for
    /// the environment.
    pub fn parse_from<I, S>(
        args: I,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Command, CliError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        // Environment first; flags below override it.
        let mut opts = Opts {
            config: SelectorConfig::from_lookup(&lookup)?,
            ..Opts::default()
        };
        if let Some(val) = lookup(ENV_EXIT_AFTER_MS).filter(|v| !v.trim().is_empty()) {
            opts.exit_after_ms = millis(ENV_EXIT_AFTER_MS, &val)?;
        }
        opts.log_filter = lookup(ENV_LOG).filter(|v| !v.trim().is_empty());
        if let Some(path) = lookup(ENV_LOG_FILE).filter(|v| !v.trim().is_empty()) {
            opts.log_file = PathBuf::from(path);
        }

        for arg in args {
            let arg = arg.as_ref();
            match arg {
                "--help" | "-h" => return Ok(Command::Help),
                "--version" | "-V" => return Ok(Command::Version),
                other => {
                    if let Some(val) = other.strip_prefix("--debounce-ms=") {
                        opts.config.debounce = flag_duration("--debounce-ms", val)?;
                    } else if let Some(val) = other.strip_prefix("--latency-ms=") {
                        opts.config.lookup_latency = flag_duration("--latency-ms", val)?;
                    } else if let Some(val) = other.strip_prefix("--exit-after-ms=") {
                        opts.exit_after_ms = val.parse().map_err(|_| CliError::InvalidValue {
                            flag: "--exit-after-ms",
                            value: val.to_string(),
                        })?;
                    } else if let Some(val) = other.strip_prefix("--log-file=") {
                        if val.is_empty() {
                            return Err(CliError::InvalidValue {
                                flag: "--log-file",
                                value: String::new(),
                            });
                        }
                        opts.log_file = PathBuf::from(val);
                    } else {
                        return Err(CliError::UnknownArgument(other.to_string()));
                    }
                }
            }
        }

        Ok(Command::Run(opts))
    }

    /// The auto-exit deadline, if enabled.
    #[must_use]
    pub fn exit_after(&self) -> Option<Duration> {
        (self.exit_after_ms > 0).then(|| Duration::from_millis(self.exit_after_ms))
    }
}

fn millis(var: &'static str, raw: &str) -> Result<u64, CliError> {
    let duration = parse_millis(var, raw)?;
    Ok(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

fn flag_duration(flag: &'static str, val: &str) -> Result<Duration, CliError> {
    val.parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| CliError::InvalidValue {
            flag,
            value: val.to_string(),
        })
}
