//! Placeholder resolution cache configuration.

use std::time::Duration;

use serde::Deserialize;

/// Placeholder cache settings.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceholderConfig {
    /// Age after which a rendered value is recomputed.
    #[serde(default = "default_expiry_ms")]
    pub expiry_ms: u64,
    /// Interval between sweeps of expired entries.
    #[serde(default = "default_cleanup_interval_ms")]
    pub cleanup_interval_ms: u64,
    /// Returned while a value is computed for the first time.
    #[serde(default = "default_pending_sentinel")]
    pub pending_sentinel: String,
}

impl PlaceholderConfig {
    #[must_use]
    pub fn expiry(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(i64::try_from(self.expiry_ms).unwrap_or(i64::MAX))
    }

    #[must_use]
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_millis(self.cleanup_interval_ms)
    }
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        Self {
            expiry_ms: default_expiry_ms(),
            cleanup_interval_ms: default_cleanup_interval_ms(),
            pending_sentinel: default_pending_sentinel(),
        }
    }
}

const fn default_expiry_ms() -> u64 {
    5_000
}

const fn default_cleanup_interval_ms() -> u64 {
    5_000
}

fn default_pending_sentinel() -> String {
    "...".into()
}
