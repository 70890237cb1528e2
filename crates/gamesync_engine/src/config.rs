//! Configuration for the sync engine.

use std::time::Duration;

/// Local store key holding the pending sync queue.
pub const DEFAULT_QUEUE_KEY: &str = "sync_queue";
/// Local store key holding the cached snapshot.
pub const DEFAULT_PROGRESS_KEY: &str = "game_progress";

/// Configuration for the sync orchestrator.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Attempts per queued operation before it is dropped.
    pub max_retries: u32,
    /// Delay between queue-drain passes.
    pub retry: RetryConfig,
    /// Period of the background flush.
    pub auto_sync_interval: Duration,
    /// Local store key for the queue.
    pub queue_key: String,
    /// Local store key for the snapshot.
    pub progress_key: String,
}

impl SyncConfig {
    /// Creates the default configuration: 3 attempts, fixed 1 s delay,
    /// 30 s background flush.
    pub fn new() -> Self {
        Self {
            max_retries: 3,
            retry: RetryConfig::default(),
            auto_sync_interval: Duration::from_secs(30),
            queue_key: DEFAULT_QUEUE_KEY.to_string(),
            progress_key: DEFAULT_PROGRESS_KEY.to_string(),
        }
    }

    /// Sets the attempts per operation. Clamped to at least 1.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Sets the retry delay policy.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the background flush period.
    pub fn with_auto_sync_interval(mut self, interval: Duration) -> Self {
        self.auto_sync_interval = interval;
        self
    }

    /// Sets the local store keys for the queue and the snapshot.
    pub fn with_keys(mut self, queue_key: impl Into<String>, progress_key: impl Into<String>) -> Self {
        self.queue_key = queue_key.into();
        self.progress_key = progress_key.into();
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Delay between drain passes.
///
/// The default is a fixed one second regardless of how often the head has
/// failed. Exponential backoff is available but must be chosen explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Delay after the first failure.
    pub initial_delay: Duration,
    /// Upper bound on any delay.
    pub max_delay: Duration,
    /// Multiplier per additional failure (1.0 = fixed delay).
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    /// A fixed delay between passes.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            initial_delay: delay,
            max_delay: delay,
            backoff_multiplier: 1.0,
        }
    }

    /// Exponential backoff starting at `initial_delay`, capped at `max_delay`.
    pub fn exponential(initial_delay: Duration, max_delay: Duration, multiplier: f64) -> Self {
        Self {
            initial_delay,
            max_delay,
            backoff_multiplier: multiplier.max(1.0),
        }
    }

    /// Returns true if every delay is the same.
    pub fn is_fixed(&self) -> bool {
        self.backoff_multiplier <= 1.0
    }

    /// Calculates the delay to wait given the head's retry count.
    ///
    /// A head that has never failed (`retry_count == 0`) still waits the
    /// initial delay; passes are always spaced.
    pub fn delay_for_attempt(&self, retry_count: u32) -> Duration {
        if self.is_fixed() {
            return self.initial_delay;
        }

        let exponent = retry_count.saturating_sub(1).min(i32::MAX as u32) as i32;
        let delay_secs =
            self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        Duration::from_secs_f64(delay_secs.min(self.max_delay.as_secs_f64()))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::fixed(Duration::from_secs(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_config_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry, RetryConfig::fixed(Duration::from_secs(1)));
        assert_eq!(config.auto_sync_interval, Duration::from_secs(30));
        assert_eq!(config.queue_key, "sync_queue");
        assert_eq!(config.progress_key, "game_progress");
    }

    #[test]
    fn sync_config_builder() {
        let config = SyncConfig::new()
            .with_max_retries(5)
            .with_auto_sync_interval(Duration::from_secs(10))
            .with_keys("queue_v2", "progress_v2");

        assert_eq!(config.max_retries, 5);
        assert_eq!(config.auto_sync_interval, Duration::from_secs(10));
        assert_eq!(config.queue_key, "queue_v2");
        assert_eq!(config.progress_key, "progress_v2");
    }

    #[test]
    fn max_retries_never_zero() {
        assert_eq!(SyncConfig::new().with_max_retries(0).max_retries, 1);
    }

    #[test]
    fn fixed_delay_ignores_retry_count() {
        let retry = RetryConfig::default();
        assert!(retry.is_fixed());
        for count in [0, 1, 2, 10] {
            assert_eq!(retry.delay_for_attempt(count), Duration::from_secs(1));
        }
    }

    #[test]
    fn exponential_delay_calculation() {
        let retry = RetryConfig::exponential(
            Duration::from_millis(100),
            Duration::from_secs(30),
            2.0,
        );
        assert!(!retry.is_fixed());
        assert_eq!(retry.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(retry.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(retry.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(retry.delay_for_attempt(3), Duration::from_millis(400));
    }

    #[test]
    fn exponential_delay_respects_max() {
        let retry = RetryConfig::exponential(Duration::from_secs(1), Duration::from_secs(5), 10.0);
        assert_eq!(retry.delay_for_attempt(6), Duration::from_secs(5));
    }
}
