use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::shared::RetryConfig;

/// Default interval between two pod status reads.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;

/// Settings of the pod lifecycle watcher.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Interval, in milliseconds, between two status reads of the watched pod.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Overall budget of a watch, in seconds.
    ///
    /// When unset the watch only ends on a terminal phase or on a shutdown signal.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Retry policy for transient API errors.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl WatchConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            timeout_secs: None,
            retry: RetryConfig::default(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}
