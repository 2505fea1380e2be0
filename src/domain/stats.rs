//! Aggregate statistics for a single group.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Last known aggregate for one group.
///
/// Replaced wholesale on every recomputation, never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    /// Group name as defined by the directory (case-sensitive).
    pub group: String,
    /// Sum of member balances.
    pub total_balance: f64,
    /// Number of members.
    pub member_count: usize,
    /// When the computation that produced this value started.
    pub computed_at: DateTime<Utc>,
}

impl GroupStats {
    /// Create a stats snapshot.
    pub fn new(
        group: impl Into<String>,
        total_balance: f64,
        member_count: usize,
        computed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            group: group.into(),
            total_balance,
            member_count,
            computed_at,
        }
    }

    /// Stats for a group with no members.
    pub fn empty(group: impl Into<String>, computed_at: DateTime<Utc>) -> Self {
        Self::new(group, 0.0, 0, computed_at)
    }

    /// Age of the snapshot relative to `now`.
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.computed_at
    }

    /// True while the snapshot is younger than `window`.
    #[must_use]
    pub fn is_fresh(&self, window: Duration, now: DateTime<Utc>) -> bool {
        self.age(now) < window
    }

    /// True if this snapshot may replace `other` (it is at least as new).
    #[must_use]
    pub fn supersedes(&self, other: &GroupStats) -> bool {
        self.computed_at >= other.computed_at
    }
}
