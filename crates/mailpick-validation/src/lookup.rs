#![forbid(unsafe_code)]

//! Username availability backends.
//!
//! [`AvailabilityLookup`] is the seam between the selector and whatever
//! service knows which usernames are taken. [`MockDirectory`] stands in for
//! that service with a static table and a simulated network delay.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Simulated round-trip time of the mock directory.
pub const DEFAULT_LOOKUP_LATENCY: Duration = Duration::from_millis(1000);

/// Why a lookup could not answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// The backend has no table for this domain.
    UnknownDomain(String),
    /// The backend reported a failure.
    Backend(String),
    /// The worker answering the lookup went away without replying.
    Disconnected,
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::UnknownDomain(domain) => write!(f, "unknown domain: {domain}"),
            LookupError::Backend(msg) => write!(f, "backend error: {msg}"),
            LookupError::Disconnected => write!(f, "lookup worker disconnected"),
        }
    }
}

impl std::error::Error for LookupError {}

/// Answers whether a username is free on a domain.
///
/// Implementations with a [`simulated_latency`](Self::simulated_latency) are
/// answered in place once that much time has passed. Implementations without
/// one are treated as blocking service calls and run off the UI thread.
pub trait AvailabilityLookup: Send + Sync {
    /// `Ok(true)` when `username` is free on `domain`.
    fn is_available(&self, domain: &str, username: &str) -> Result<bool, LookupError>;

    /// Fixed delay to simulate before answering, if any.
    fn simulated_latency(&self) -> Option<Duration> {
        None
    }

    /// Short backend name for logs.
    fn name(&self) -> &str;
}

/// Static table of taken usernames per domain.
#[derive(Debug, Clone)]
pub struct MockDirectory {
    taken: HashMap<String, Vec<String>>,
    latency: Duration,
}

impl Default for MockDirectory {
    fn default() -> Self {
        Self::empty()
            .with_domain("adi.so", ["john", "jane"])
            .with_domain("sreyaj.dev", Vec::<String>::new())
    }
}

impl MockDirectory {
    /// A directory with no domains.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            taken: HashMap::new(),
            latency: DEFAULT_LOOKUP_LATENCY,
        }
    }

    /// Add (or replace) a domain and its taken usernames.
    #[must_use]
    pub fn with_domain<I, S>(mut self, domain: impl Into<String>, taken: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let taken = taken.into_iter().map(Into::into).collect();
        self.taken.insert(domain.into(), taken);
        self
    }

    /// Set the simulated round-trip time.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

}

impl AvailabilityLookup for MockDirectory {
    fn is_available(&self, domain: &str, username: &str) -> Result<bool, LookupError> {
        let taken = self
            .taken
            .get(domain)
            .ok_or_else(|| LookupError::UnknownDomain(domain.to_string()))?;
        Ok(!taken.iter().any(|t| t == username))
    }

    fn simulated_latency(&self) -> Option<Duration> {
        Some(self.latency)
    }

    fn name(&self) -> &str {
        "mock-directory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn john_is_taken_on_adi_so() {
        let dir = MockDirectory::default();
        assert_eq!(dir.is_available("adi.so", "john"), Ok(false));
        assert_eq!(dir.is_available("adi.so", "jane"), Ok(false));
    }

    #[test]
    fn mike_is_free_on_adi_so() {
        assert_eq!(MockDirectory::default().is_available("adi.so", "mike"), Ok(true));
    }

    #[test]
    fn everything_is_free_on_sreyaj_dev() {
        let dir = MockDirectory::default();
        for name in ["john", "jane", "mike", "x"] {
            assert_eq!(dir.is_available("sreyaj.dev", name), Ok(true));
        }
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert_eq!(MockDirectory::default().is_available("adi.so", "John"), Ok(true));
    }

    #[test]
    fn unknown_domain_is_an_error() {
        let err = MockDirectory::default()
            .is_available("example.com", "john")
            .unwrap_err();
        assert_eq!(err, LookupError::UnknownDomain("example.com".into()));
        assert_eq!(err.to_string(), "unknown domain: example.com");
    }

    #[test]
    fn default_latency_is_one_second() {
        assert_eq!(
            MockDirectory::default().simulated_latency(),
            Some(Duration::from_secs(1))
        );
    }
}
