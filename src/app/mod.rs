//! Application wiring and lifecycle.
//!
//! [`App`] owns the caches and the refresh service. It is built once at
//! process start and torn down at shutdown; consumers get handles to the
//! caches instead of reaching for global state.

pub mod config;

use std::sync::Arc;

use tracing::info;

use crate::domain::SubjectId;
use crate::port::Directory;
use crate::runtime::{GroupStatsCache, PlaceholderCache, RefreshService, RefreshServiceHandle};
use config::Config;

/// Running application.
pub struct App {
    stats: GroupStatsCache,
    placeholders: PlaceholderCache,
    refresher: RefreshServiceHandle,
}

impl App {
    /// Build the caches and start the refresh service.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn start(config: &Config, directory: Arc<dyn Directory>) -> Self {
        let stats = GroupStatsCache::new(Arc::clone(&directory), &config.stats);
        let placeholders =
            PlaceholderCache::new(Arc::clone(&directory), stats.clone(), &config.placeholders);
        let refresher = RefreshService::new(
            stats.clone(),
            placeholders.clone(),
            &config.stats,
            &config.placeholders,
        )
        .start();

        info!(directory = directory.name(), "rankstats started");

        Self {
            stats,
            placeholders,
            refresher,
        }
    }

    /// Group statistics cache handle.
    #[must_use]
    pub fn stats(&self) -> &GroupStatsCache {
        &self.stats
    }

    /// Placeholder cache handle.
    #[must_use]
    pub fn placeholders(&self) -> &PlaceholderCache {
        &self.placeholders
    }

    /// Resolve a textual placeholder identifier for `subject`.
    ///
    /// Returns `None` if the identifier is not a known placeholder.
    pub fn resolve(&self, subject: Option<&SubjectId>, identifier: &str) -> Option<String> {
        self.placeholders.resolve_identifier(subject, identifier)
    }

    /// Stop the refresh service and clear both caches.
    pub async fn shutdown(self) {
        self.refresher.shutdown().await;
        self.placeholders.clear();
        self.stats.clear();
        info!("rankstats stopped");
    }
}
