//! Fetch queue configuration.

use super::defaults::{default_max_concurrent, DEFAULT_FETCH_TIMEOUT_SECS};
use crate::fetch::DEFAULT_USER_AGENT;
use std::time::Duration;

/// Configuration for the keyed fetch queue and its HTTP client.
///
/// # Example
///
/// ```
/// use photogrid::config::FetchConfig;
/// use std::time::Duration;
///
/// // Using defaults: 15 second timeout, one slot per CPU
/// let config = FetchConfig::default();
/// assert_eq!(config.timeout(), Duration::from_secs(15));
///
/// // Custom configuration
/// let config = FetchConfig::new()
///     .with_timeout_secs(30)
///     .with_max_concurrent(4);
/// assert_eq!(config.max_concurrent(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Maximum time a single request may take
    timeout: Duration,
    /// Maximum number of simultaneously running fetches
    max_concurrent: usize,
    /// User-Agent header sent with every request
    user_agent: String,
}

impl FetchConfig {
    /// Create a new fetch configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-request timeout in seconds.
    ///
    /// Default: 15 seconds.
    pub fn with_timeout_secs(self, timeout: u64) -> Self {
        self.with_timeout(Duration::from_secs(timeout))
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the maximum number of concurrently running fetches.
    ///
    /// Zero is raised to one. Default: available hardware parallelism.
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Set the User-Agent header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Get the per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Get the maximum number of concurrently running fetches.
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Get the User-Agent header.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            max_concurrent: default_max_concurrent(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(15));
        assert_eq!(config.max_concurrent(), default_max_concurrent());
        assert_eq!(config.user_agent(), DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_new_equals_default() {
        assert_eq!(FetchConfig::new(), FetchConfig::default());
    }

    #[test]
    fn test_builder_chain() {
        let config = FetchConfig::new()
            .with_timeout(Duration::from_millis(250))
            .with_max_concurrent(4)
            .with_user_agent("test-agent");

        assert_eq!(config.timeout(), Duration::from_millis(250));
        assert_eq!(config.max_concurrent(), 4);
        assert_eq!(config.user_agent(), "test-agent");
    }

    #[test]
    fn test_zero_concurrency_is_raised_to_one() {
        let config = FetchConfig::new().with_max_concurrent(0);
        assert_eq!(config.max_concurrent(), 1);
    }
}
