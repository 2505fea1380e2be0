//! Background refresh of group statistics and placeholder cleanup.
//!
//! One task drives both timers. Each sweep runs on its own task and only
//! awaits the group listing; every per-group computation runs on its own
//! task as well. A tick is skipped while the previous sweep is still
//! listing groups.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::app::config::{PlaceholderConfig, StatsConfig};
use crate::runtime::cache::{GroupStatsCache, PlaceholderCache};

/// Handle to control the refresh service.
pub struct RefreshServiceHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl RefreshServiceHandle {
    /// Signal the service to shut down and wait for it to stop.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        let _ = self.task.await;
    }
}

/// Periodic refresh sweep and placeholder cleanup.
pub struct RefreshService {
    stats: GroupStatsCache,
    placeholders: PlaceholderCache,
    refresh_interval: Duration,
    initial_delay: Duration,
    cleanup_interval: Duration,
}

impl RefreshService {
    /// Create a new refresh service.
    pub fn new(
        stats: GroupStatsCache,
        placeholders: PlaceholderCache,
        stats_config: &StatsConfig,
        placeholder_config: &PlaceholderConfig,
    ) -> Self {
        Self {
            stats,
            placeholders,
            refresh_interval: stats_config.refresh_interval(),
            initial_delay: stats_config.refresh_initial_delay(),
            cleanup_interval: placeholder_config.cleanup_interval(),
        }
    }

    /// Start the service on the current runtime.
    pub fn start(self) -> RefreshServiceHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let task = tokio::spawn(async move {
            let start = Instant::now();
            let mut refresh_timer =
                interval_at(start + self.initial_delay, self.refresh_interval);
            refresh_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut cleanup_timer =
                interval_at(start + self.cleanup_interval, self.cleanup_interval);
            cleanup_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!(
                interval_ms = self.refresh_interval.as_millis() as u64,
                "Refresh service started"
            );

            let mut sweep: Option<JoinHandle<()>> = None;

            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Refresh service shutting down");
                        if let Some(sweep) = sweep.take() {
                            sweep.abort();
                        }
                        break;
                    }
                    _ = refresh_timer.tick() => {
                        if sweep.as_ref().is_some_and(|task| !task.is_finished()) {
                            debug!("Previous refresh sweep still running, skipping tick");
                        } else {
                            let stats = self.stats.clone();
                            sweep = Some(tokio::spawn(async move {
                                let groups = stats.refresh_all().await;
                                debug!(groups, "Refresh sweep triggered");
                            }));
                        }
                    }
                    _ = cleanup_timer.tick() => {
                        self.placeholders.cleanup();
                    }
                }
            }
        });

        RefreshServiceHandle { shutdown_tx, task }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::testkit::wait::eventually;
    use crate::testkit::{config, ScriptedDirectory};

    fn fast_stats() -> StatsConfig {
        StatsConfig {
            refresh_interval_ms: 20,
            refresh_initial_delay_ms: 0,
            ..config::stats()
        }
    }

    #[tokio::test]
    async fn sweeps_repeatedly_until_shutdown() {
        let directory = Arc::new(
            ScriptedDirectory::new()
                .with_member("a", &["vip"], 1.0)
                .with_member("b", &["default"], 2.0),
        );
        let stats_config = fast_stats();
        let stats = GroupStatsCache::new(directory.clone(), &stats_config);
        let placeholders =
            PlaceholderCache::new(directory.clone(), stats.clone(), &config::placeholders());

        let handle =
            RefreshService::new(stats.clone(), placeholders, &stats_config, &config::placeholders())
                .start();

        assert!(eventually(Duration::from_secs(2), || directory.list_groups_calls() >= 2).await);
        assert!(eventually(Duration::from_secs(2), || stats.len() == 2).await);

        handle.shutdown().await;
        let calls = directory.list_groups_calls();
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(directory.list_groups_calls(), calls);
    }

    #[tokio::test]
    async fn stalled_listing_blocks_neither_cleanup_nor_shutdown() {
        let directory = Arc::new(ScriptedDirectory::new().with_member("a", &["vip"], 1.0));
        directory.stall_list_groups(true);
        let stats_config = fast_stats();
        let placeholder_config = PlaceholderConfig {
            expiry_ms: 1,
            cleanup_interval_ms: 10,
            ..config::placeholders()
        };
        let stats = GroupStatsCache::new(directory.clone(), &stats_config);
        let placeholders =
            PlaceholderCache::new(directory.clone(), stats.clone(), &placeholder_config);

        let handle = RefreshService::new(
            stats.clone(),
            placeholders.clone(),
            &stats_config,
            &placeholder_config,
        )
        .start();
        assert!(eventually(Duration::from_secs(2), || directory.list_groups_calls() >= 1).await);

        stats.commit(crate::domain::GroupStats::new("vip", 1.0, 1, chrono::Utc::now()));
        placeholders.resolve(None, &"memberCount::vip".parse().unwrap());
        assert_eq!(placeholders.len(), 1);
        assert!(eventually(Duration::from_secs(2), || placeholders.is_empty()).await);

        let stopped = tokio::time::timeout(Duration::from_secs(2), handle.shutdown()).await;
        assert!(stopped.is_ok(), "shutdown waited on a stalled sweep");
        assert_eq!(directory.list_groups_calls(), 1);
    }

    #[tokio::test]
    async fn cleanup_runs_on_its_own_timer() {
        let directory = Arc::new(ScriptedDirectory::new().with_member("a", &["vip"], 1.0));
        let stats_config = StatsConfig {
            refresh_initial_delay_ms: 60_000,
            ..config::stats()
        };
        let placeholder_config = PlaceholderConfig {
            expiry_ms: 1,
            cleanup_interval_ms: 10,
            ..config::placeholders()
        };
        let stats = GroupStatsCache::new(directory.clone(), &stats_config);
        let placeholders =
            PlaceholderCache::new(directory.clone(), stats.clone(), &placeholder_config);
        stats.commit(crate::domain::GroupStats::new("vip", 1.0, 1, chrono::Utc::now()));
        placeholders.resolve(None, &"memberCount::vip".parse().unwrap());
        assert_eq!(placeholders.len(), 1);

        let handle = RefreshService::new(
            stats,
            placeholders.clone(),
            &stats_config,
            &placeholder_config,
        )
        .start();

        assert!(eventually(Duration::from_secs(2), || placeholders.is_empty()).await);
        assert_eq!(directory.list_groups_calls(), 0);
        handle.shutdown().await;
    }
}
