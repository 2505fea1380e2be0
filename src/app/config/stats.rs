//! Group statistics cache configuration.

use std::time::Duration;

use serde::Deserialize;

/// Group statistics cache and refresh schedule.
#[derive(Debug, Clone, Deserialize)]
pub struct StatsConfig {
    /// Maximum age of a cached entry served without recomputation.
    #[serde(default = "default_staleness_ms")]
    pub staleness_ms: u64,
    /// Interval between full refresh sweeps.
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
    /// Delay before the first sweep.
    #[serde(default = "default_refresh_initial_delay_ms")]
    pub refresh_initial_delay_ms: u64,
    /// Upper bound for a single group computation.
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
}

impl StatsConfig {
    #[must_use]
    pub fn staleness(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(i64::try_from(self.staleness_ms).unwrap_or(i64::MAX))
    }

    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    #[must_use]
    pub fn refresh_initial_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_initial_delay_ms)
    }

    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            staleness_ms: default_staleness_ms(),
            refresh_interval_ms: default_refresh_interval_ms(),
            refresh_initial_delay_ms: default_refresh_initial_delay_ms(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
        }
    }
}

const fn default_staleness_ms() -> u64 {
    5_000
}

const fn default_refresh_interval_ms() -> u64 {
    5_000
}

const fn default_refresh_initial_delay_ms() -> u64 {
    5_000
}

const fn default_fetch_timeout_ms() -> u64 {
    30_000
}
