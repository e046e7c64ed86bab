#![forbid(unsafe_code)]

//! Selector configuration.
//!
//! # Environment Variables
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `MAILPICK_DOMAINS` | Comma-separated domain list | `adi.so,sreyaj.dev` |
//! | `MAILPICK_DEBOUNCE_MS` | Username debounce quiet period | `500` |
//! | `MAILPICK_LATENCY_MS` | Mock directory round-trip time | `1000` |
//!
//! Unset or empty variables keep their defaults. A value that is set but
//! does not parse is an error rather than a silent fallback.

use std::env;
use std::fmt;
use std::time::Duration;

use mailpick_validation::DEFAULT_LOOKUP_LATENCY;

/// Domains offered when none are configured.
pub const DEFAULT_DOMAINS: [&str; 2] = ["adi.so", "sreyaj.dev"];

/// Quiet period before a username edit is emitted.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Comma-separated domain list.
pub const ENV_DOMAINS: &str = "MAILPICK_DOMAINS";
/// Debounce quiet period in milliseconds.
pub const ENV_DEBOUNCE_MS: &str = "MAILPICK_DEBOUNCE_MS";
/// Simulated lookup latency in milliseconds.
pub const ENV_LATENCY_MS: &str = "MAILPICK_LATENCY_MS";

/// Why configuration could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A numeric variable held something other than a non-negative integer.
    InvalidNumber { var: &'static str, value: String },
    /// The domain list was set but contained no domains.
    NoDomains { var: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidNumber { var, value } => {
                write!(f, "{var} must be a whole number of milliseconds, got {value:?}")
            }
            ConfigError::NoDomains { var } => write!(f, "{var} lists no domains"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Settings for an [`EmailSelector`](crate::EmailSelector) and its mock backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorConfig {
    /// Domains offered by the picker, in display order.
    pub domains: Vec<String>,
    /// Username debounce quiet period.
    pub debounce: Duration,
    /// Simulated availability lookup latency.
    pub lookup_latency: Duration,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            domains: DEFAULT_DOMAINS.iter().map(|d| (*d).to_string()).collect(),
            debounce: DEFAULT_DEBOUNCE,
            lookup_latency: DEFAULT_LOOKUP_LATENCY,
        }
    }
}

impl SelectorConfig {
    /// Set the domain list.
    #[must_use]
    pub fn with_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.domains = domains.into_iter().map(Into::into).collect();
        self
    }

    /// Set the username debounce quiet period.
    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Set the simulated lookup latency.
    #[must_use]
    pub fn with_lookup_latency(mut self, latency: Duration) -> Self {
        self.lookup_latency = latency;
        self
    }

    /// Load defaults overridden by `MAILPICK_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load defaults overridden by whatever `lookup` returns per variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = non_empty(lookup(ENV_DOMAINS)) {
            let domains: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string)
                .collect();
            if domains.is_empty() {
                return Err(ConfigError::NoDomains { var: ENV_DOMAINS });
            }
            config.domains = domains;
        }
        if let Some(raw) = non_empty(lookup(ENV_DEBOUNCE_MS)) {
            config.debounce = parse_millis(ENV_DEBOUNCE_MS, &raw)?;
        }
        if let Some(raw) = non_empty(lookup(ENV_LATENCY_MS)) {
            config.lookup_latency = parse_millis(ENV_LATENCY_MS, &raw)?;
        }

        tracing::debug!(
            domains = config.domains.len(),
            debounce_ms = config.debounce.as_millis() as u64,
            latency_ms = config.lookup_latency.as_millis() as u64,
            "selector config loaded"
        );
        Ok(config)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Parse a millisecond count.
pub fn parse_millis(var: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| ConfigError::InvalidNumber {
            var,
            value: raw.to_string(),
        })
}
