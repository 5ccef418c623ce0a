//! Editing-session configuration.

use std::time::Duration;

/// Auto-save scheduling configuration.
///
/// Structural mutations go through the throttled lane, high-frequency config
/// edits through the debounced lane; both feed the same save path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoSaveConfig {
    pub enabled: bool,
    /// Quiet period before a debounced save fires.
    pub debounce: Duration,
    /// Minimum spacing between throttled saves.
    pub throttle: Duration,
    /// Automatic retries after a failed save before giving up.
    pub max_retries: u32,
    /// Fixed delay between retries.
    pub retry_delay: Duration,
}

impl Default for AutoSaveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce: Duration::from_secs(2),
            throttle: Duration::from_secs(10),
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

impl AutoSaveConfig {
    /// Disables automatic saving entirely; `save_now` still works.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Sets the debounce window.
    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Sets the throttle window.
    #[must_use]
    pub fn with_throttle(mut self, throttle: Duration) -> Self {
        self.throttle = throttle;
        self
    }

    /// Sets the retry cap.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the retry delay.
    #[must_use]
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }
}

/// Undo/redo history configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryConfig {
    pub enabled: bool,
    /// Maximum retained entries; the oldest are evicted beyond this.
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 50,
        }
    }
}

impl HistoryConfig {
    /// Enables or disables recording.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sets the stack capacity.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}
