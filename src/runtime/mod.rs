//! Caches and background services.

pub mod cache;
pub mod scheduler;

pub use cache::{GroupStatsCache, PlaceholderCache};
pub use scheduler::{RefreshService, RefreshServiceHandle};
