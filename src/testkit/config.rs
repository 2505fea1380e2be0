//! Canonical test configurations.
//!
//! Single source of truth for config structs used across tests.

use crate::app::config::{PlaceholderConfig, StatsConfig};

/// Stats config with the default 5 second staleness and a short timeout.
pub fn stats() -> StatsConfig {
    StatsConfig {
        fetch_timeout_ms: 2_000,
        ..StatsConfig::default()
    }
}

/// Stats config whose entries are stale as soon as they are written.
pub fn always_stale_stats() -> StatsConfig {
    StatsConfig {
        staleness_ms: 1,
        ..stats()
    }
}

/// Stats config with the given fetch timeout.
pub fn stats_with_timeout(fetch_timeout_ms: u64) -> StatsConfig {
    StatsConfig {
        fetch_timeout_ms,
        ..stats()
    }
}

/// Placeholder config with the default 5 second expiry.
pub fn placeholders() -> PlaceholderConfig {
    PlaceholderConfig::default()
}

/// Placeholder config whose entries expire after `expiry_ms`.
pub fn placeholders_expiring(expiry_ms: u64) -> PlaceholderConfig {
    PlaceholderConfig {
        expiry_ms,
        ..PlaceholderConfig::default()
    }
}
