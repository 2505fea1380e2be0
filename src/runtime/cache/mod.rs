//! Stateful caches for group statistics and rendered placeholders.

mod group_stats;
mod placeholder;

pub use group_stats::{compute_group_stats, GroupStatsCache, StatsFuture};
pub use placeholder::{PlaceholderCache, PlaceholderEntry};
