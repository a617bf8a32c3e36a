//! Loop timing configuration.

use std::time::Duration;

/// Timing knobs for the orchestration loop.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Pause after each shell command before the next oracle call.
    pub settle_delay: Duration,
    /// Wait before retrying a rate-limited oracle call. Retries are
    /// unbounded; cancellation is checked between attempts.
    pub rate_limit_backoff: Duration,
    /// Token cap for the launch-command request (a single command line
    /// never needs more).
    pub launch_max_tokens: u32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(1),
            rate_limit_backoff: Duration::from_secs(10),
            launch_max_tokens: 100,
        }
    }
}

impl LoopConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the post-command settle delay.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Sets the rate-limit retry backoff.
    pub fn with_rate_limit_backoff(mut self, backoff: Duration) -> Self {
        self.rate_limit_backoff = backoff;
        self
    }

    /// Sets the launch-request token cap.
    pub fn with_launch_max_tokens(mut self, max_tokens: u32) -> Self {
        self.launch_max_tokens = max_tokens;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoopConfig::default();
        assert_eq!(config.settle_delay, Duration::from_secs(1));
        assert_eq!(config.rate_limit_backoff, Duration::from_secs(10));
        assert_eq!(config.launch_max_tokens, 100);
    }

    #[test]
    fn test_builders() {
        let config = LoopConfig::new()
            .with_settle_delay(Duration::from_millis(5))
            .with_rate_limit_backoff(Duration::from_millis(10))
            .with_launch_max_tokens(50);
        assert_eq!(config.settle_delay, Duration::from_millis(5));
        assert_eq!(config.rate_limit_backoff, Duration::from_millis(10));
        assert_eq!(config.launch_max_tokens, 50);
    }
}
