use std::time::Duration;

use thiserror::Error;

/// Errors reported by a [`Directory`](crate::port::Directory) implementation.
///
/// Cloneable so a single failure can be handed to every caller waiting on
/// the same fetch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DirectoryError {
    #[error("directory unavailable: {0}")]
    Unavailable(String),

    #[error("lookup failed for member {member}: {reason}")]
    Lookup { member: String, reason: String },
}

/// Errors produced while computing group statistics on demand.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CacheError {
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error("fetch for group '{group}' timed out after {after:?}")]
    Timeout { group: String, after: Duration },

    #[error("fetch for group '{group}' was aborted")]
    Aborted { group: String },
}

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
