//! Group statistics cache with single-flight refresh.
//!
//! Entries are `(total_balance, member_count)` snapshots per group. Reads are
//! cache-aside: a fresh entry answers immediately, otherwise the caller gets a
//! future attached to the one in-flight computation for that group. The
//! computation itself ([`compute_group_stats`]) only produces a value; storing
//! it is the cache's job ([`GroupStatsCache::commit`]).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::{self, BoxFuture, FutureExt, Shared};
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use crate::app::config::StatsConfig;
use crate::domain::GroupStats;
use crate::error::CacheError;
use crate::port::Directory;

/// Future resolving to a group's statistics.
pub type StatsFuture = BoxFuture<'static, Result<GroupStats, CacheError>>;

/// In-flight computation for one group.
struct PendingFetch {
    id: u64,
    future: Shared<StatsFuture>,
    abort: AbortHandle,
}

/// Compute statistics for `group` from the directory.
///
/// A failed balance lookup counts as `0.0` and does not abort the
/// aggregation. Failing to enumerate the group's members is an error. A
/// group without members yields zero statistics. The result is stamped with
/// the time the computation started.
pub async fn compute_group_stats(
    directory: &dyn Directory,
    group: &str,
) -> Result<GroupStats, CacheError> {
    let started_at = Utc::now();
    let members = directory.members_of(group).await?;
    if members.is_empty() {
        return Ok(GroupStats::empty(group, started_at));
    }

    let mut total_balance = 0.0;
    for member in &members {
        match directory.balance_of(member).await {
            Ok(balance) => total_balance += balance,
            Err(e) => {
                warn!(
                    group = group,
                    member = %member,
                    error = %e,
                    "Balance lookup failed, counting as zero"
                );
            }
        }
    }

    Ok(GroupStats::new(
        group,
        total_balance,
        members.len(),
        started_at,
    ))
}

struct Inner {
    directory: Arc<dyn Directory>,
    entries: DashMap<String, GroupStats>,
    pending: DashMap<String, PendingFetch>,
    next_fetch_id: AtomicU64,
    staleness: chrono::Duration,
    fetch_timeout: Duration,
    runtime: Handle,
}

impl Inner {
    fn commit(&self, stats: GroupStats) -> bool {
        match self.entries.entry(stats.group.clone()) {
            Entry::Occupied(mut entry) => {
                if stats.supersedes(entry.get()) {
                    entry.insert(stats);
                    true
                } else {
                    debug!(
                        group = %stats.group,
                        computed_at = %stats.computed_at,
                        stored_at = %entry.get().computed_at,
                        "Discarding result older than stored entry"
                    );
                    false
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(stats);
                true
            }
        }
    }
}

/// Releases a group's single-flight slot when the fetch task ends, including
/// when it panics or is aborted.
struct SlotGuard {
    inner: Arc<Inner>,
    group: String,
    id: u64,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        let id = self.id;
        self.inner.pending.remove_if(&self.group, |_, p| p.id == id);
    }
}

/// Cache of the most recent statistics per group.
///
/// Cheap to clone; clones share the same entries.
#[derive(Clone)]
pub struct GroupStatsCache {
    inner: Arc<Inner>,
}

impl GroupStatsCache {
    /// Create a cache that spawns fetches on the current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn new(directory: Arc<dyn Directory>, config: &StatsConfig) -> Self {
        Self::with_handle(directory, config, Handle::current())
    }

    /// Create a cache that spawns fetches on `runtime`.
    pub fn with_handle(
        directory: Arc<dyn Directory>,
        config: &StatsConfig,
        runtime: Handle,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                directory,
                entries: DashMap::new(),
                pending: DashMap::new(),
                next_fetch_id: AtomicU64::new(0),
                staleness: config.staleness(),
                fetch_timeout: config.fetch_timeout(),
                runtime,
            }),
        }
    }

    /// Statistics for `group`.
    ///
    /// Resolves immediately from a fresh entry; otherwise joins or starts
    /// the group's fetch. Never blocks.
    pub fn stats(&self, group: &str) -> StatsFuture {
        if let Some(stats) = self.fresh(group) {
            return future::ready(Ok(stats)).boxed();
        }
        self.fetch(group)
    }

    /// Summed balance of `group`.
    pub fn total_balance(&self, group: &str) -> BoxFuture<'static, Result<f64, CacheError>> {
        self.stats(group)
            .map(|result| result.map(|stats| stats.total_balance))
            .boxed()
    }

    /// Member count of `group`.
    pub fn member_count(&self, group: &str) -> BoxFuture<'static, Result<usize, CacheError>> {
        self.stats(group)
            .map(|result| result.map(|stats| stats.member_count))
            .boxed()
    }

    /// Recompute `group` even if its entry is fresh.
    ///
    /// Joins the in-flight fetch if there is one. The computation runs on
    /// its own task; the returned future may be dropped.
    pub fn refresh_group(&self, group: &str) -> StatsFuture {
        self.fetch(group)
    }

    /// Trigger a refresh of every group the directory knows.
    ///
    /// Returns the number of groups a refresh was triggered for. Failures
    /// are logged per group and never abort the sweep. The group listing is
    /// bounded by the fetch timeout.
    pub async fn refresh_all(&self) -> usize {
        let listing = tokio::time::timeout(
            self.inner.fetch_timeout,
            self.inner.directory.list_groups(),
        );
        let groups = match listing.await {
            Ok(Ok(groups)) => groups,
            Ok(Err(e)) => {
                warn!(
                    directory = self.inner.directory.name(),
                    error = %e,
                    "Failed to list groups, skipping refresh"
                );
                return 0;
            }
            Err(_) => {
                warn!(
                    directory = self.inner.directory.name(),
                    after_ms = self.inner.fetch_timeout.as_millis() as u64,
                    "Listing groups timed out, skipping refresh"
                );
                return 0;
            }
        };

        for group in &groups {
            drop(self.refresh_group(group));
        }

        debug!(groups = groups.len(), "Triggered refresh for all groups");
        groups.len()
    }

    /// Store `stats` unless a newer entry for the same group exists.
    ///
    /// Returns whether the entry was written.
    pub fn commit(&self, stats: GroupStats) -> bool {
        self.inner.commit(stats)
    }

    /// The stored entry for `group`, regardless of age.
    #[must_use]
    pub fn peek(&self, group: &str) -> Option<GroupStats> {
        self.inner.entries.get(group).map(|e| e.value().clone())
    }

    /// Whether a fetch for `group` is in flight.
    #[must_use]
    pub fn is_fetching(&self, group: &str) -> bool {
        self.inner.pending.contains_key(group)
    }

    /// Number of groups with an entry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    /// Returns true if no group has an entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    /// Abort in-flight fetches and drop every entry.
    pub fn clear(&self) {
        let aborts: Vec<AbortHandle> = self
            .inner
            .pending
            .iter()
            .map(|p| p.abort.clone())
            .collect();
        self.inner.pending.clear();
        for abort in &aborts {
            abort.abort();
        }
        self.inner.entries.clear();
        info!(aborted = aborts.len(), "Group statistics cache cleared");
    }

    fn fresh(&self, group: &str) -> Option<GroupStats> {
        let entry = self.inner.entries.get(group)?;
        if entry.is_fresh(self.inner.staleness, Utc::now()) {
            Some(entry.value().clone())
        } else {
            None
        }
    }

    fn fetch(&self, group: &str) -> StatsFuture {
        let shared = match self.inner.pending.entry(group.to_string()) {
            Entry::Occupied(entry) => {
                debug!(group = group, "Joining in-flight fetch");
                entry.get().future.clone()
            }
            Entry::Vacant(entry) => {
                let id = self.inner.next_fetch_id.fetch_add(1, Ordering::Relaxed);
                let (future, abort) = self.spawn_fetch(group.to_string(), id);
                entry.insert(PendingFetch {
                    id,
                    future: future.clone(),
                    abort,
                });
                future
            }
        };
        shared.boxed()
    }

    /// Spawn the computation for `group`. The task commits its own result
    /// before releasing the slot, so a caller arriving after the slot is
    /// released sees the new entry.
    fn spawn_fetch(&self, group: String, id: u64) -> (Shared<StatsFuture>, AbortHandle) {
        let inner = Arc::clone(&self.inner);
        let task_group = group.clone();

        let task = self.inner.runtime.spawn(async move {
            let _slot = SlotGuard {
                inner: Arc::clone(&inner),
                group: task_group.clone(),
                id,
            };
            debug!(group = %task_group, "Computing group statistics");

            let computation = compute_group_stats(inner.directory.as_ref(), &task_group);
            let result = match tokio::time::timeout(inner.fetch_timeout, computation).await {
                Ok(result) => result,
                Err(_) => Err(CacheError::Timeout {
                    group: task_group.clone(),
                    after: inner.fetch_timeout,
                }),
            };

            match &result {
                Ok(stats) => {
                    inner.commit(stats.clone());
                }
                Err(e) => {
                    warn!(group = %task_group, error = %e, "Group statistics fetch failed");
                }
            }
            result
        });
        let abort = task.abort_handle();
        let owner: Weak<Inner> = Arc::downgrade(&self.inner);

        let future: StatsFuture = async move {
            match task.await {
                Ok(result) => result,
                Err(e) => {
                    // A task dropped before its first poll never ran its guard.
                    if let Some(inner) = owner.upgrade() {
                        inner.pending.remove_if(&group, |_, p| p.id == id);
                    }
                    debug!(group = %group, error = %e, "Fetch task ended without a result");
                    Err(CacheError::Aborted { group })
                }
            }
        }
        .boxed();

        (future.shared(), abort)
    }
}
