//! Application configuration loading and validation.
//!
//! Configuration is loaded from a TOML file. Every section is optional and
//! falls back to defaults matching the reference deployment (5 second
//! windows everywhere).

use serde::Deserialize;
use std::path::Path;

use crate::error::{ConfigError, Result};

mod logging;
mod placeholder;
mod stats;

pub use logging::LoggingConfig;
pub use placeholder::PlaceholderConfig;
pub use stats::StatsConfig;

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Group statistics cache and refresh schedule.
    #[serde(default)]
    pub stats: StatsConfig,
    /// Placeholder resolution cache.
    #[serde(default)]
    pub placeholders: PlaceholderConfig,
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse(&content)
    }

    /// Parse and validate configuration from a TOML string.
    #[allow(clippy::result_large_err)]
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    #[allow(clippy::result_large_err)]
    fn validate(&self) -> Result<()> {
        let positive = [
            ("stats.staleness_ms", self.stats.staleness_ms),
            ("stats.refresh_interval_ms", self.stats.refresh_interval_ms),
            ("stats.fetch_timeout_ms", self.stats.fetch_timeout_ms),
            ("placeholders.expiry_ms", self.placeholders.expiry_ms),
            (
                "placeholders.cleanup_interval_ms",
                self.placeholders.cleanup_interval_ms,
            ),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must be greater than 0".into(),
                }
                .into());
            }
            if value > i64::MAX as u64 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("{value} is out of range"),
                }
                .into());
            }
        }

        if self.placeholders.pending_sentinel.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "placeholders.pending_sentinel",
                reason: "cannot be empty".into(),
            }
            .into());
        }

        Ok(())
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.stats.staleness_ms, 5_000);
        assert_eq!(config.stats.refresh_interval_ms, 5_000);
        assert_eq!(config.stats.fetch_timeout_ms, 30_000);
        assert_eq!(config.placeholders.expiry_ms, 5_000);
        assert_eq!(config.placeholders.pending_sentinel, "...");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::parse(
            r#"
[stats]
staleness_ms = 250

[placeholders]
pending_sentinel = "loading"
"#,
        )
        .unwrap();

        assert_eq!(config.stats.staleness_ms, 250);
        assert_eq!(config.stats.refresh_interval_ms, 5_000);
        assert_eq!(config.placeholders.pending_sentinel, "loading");
        assert_eq!(config.stats.staleness(), chrono::Duration::milliseconds(250));
    }

    #[test]
    fn logging_can_be_initialized_twice() {
        let config = Config::parse("[logging]\nformat = \"json\"\n").unwrap();
        config.init_logging();
        Config::default().init_logging();
    }

    #[test]
    fn rejects_zero_durations() {
        let err = Config::parse("[stats]\nfetch_timeout_ms = 0\n").unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue {
                field: "stats.fetch_timeout_ms",
                ..
            })
        ));
    }

    #[test]
    fn rejects_empty_sentinel() {
        let err = Config::parse("[placeholders]\npending_sentinel = \"\"\n").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn reports_parse_errors() {
        let err = Config::parse("[stats\n").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::Parse(_))));
    }
}
