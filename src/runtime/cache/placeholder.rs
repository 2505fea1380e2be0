//! Placeholder resolution cache.
//!
//! Sits in front of [`GroupStatsCache`] and answers every lookup
//! synchronously: a fresh rendered value, else the freshly computed value if
//! it is available without waiting, else the previous value or a pending
//! sentinel while the computation finishes in the background.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt};
use tokio::runtime::Handle;
use tracing::debug;

use super::GroupStatsCache;
use crate::app::config::PlaceholderConfig;
use crate::domain::format::{format_abbreviated, format_grouped, format_raw};
use crate::domain::{Placeholder, SubjectId, Target};
use crate::error::CacheError;
use crate::port::Directory;

/// Rendered for own-group placeholders when the subject has no group, and
/// when a computation fails with nothing cached to fall back on.
const NO_VALUE: &str = "0";

/// Rendered for [`Placeholder::PrimaryGroup`] when the subject has no group.
const NO_GROUP: &str = "none";

/// A rendered placeholder value.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceholderEntry {
    pub value: String,
    pub cached_at: DateTime<Utc>,
}

impl PlaceholderEntry {
    fn is_fresh(&self, expiry: chrono::Duration, now: DateTime<Utc>) -> bool {
        now - self.cached_at < expiry
    }
}

/// `None` stands for "no subject" (server-side rendering).
type CacheKey = (Option<SubjectId>, Placeholder);

struct SubjectLabel<'a>(Option<&'a SubjectId>);

impl fmt::Display for SubjectLabel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(subject) => write!(f, "{subject}"),
            None => f.write_str("server"),
        }
    }
}

struct Inner {
    directory: Arc<dyn Directory>,
    stats: GroupStatsCache,
    entries: DashMap<CacheKey, PlaceholderEntry>,
    expiry: chrono::Duration,
    pending_sentinel: String,
    runtime: Handle,
}

impl Inner {
    fn store(&self, key: CacheKey, value: String) {
        self.entries.insert(
            key,
            PlaceholderEntry {
                value,
                cached_at: Utc::now(),
            },
        );
    }

    async fn primary_group(
        &self,
        subject: Option<&SubjectId>,
    ) -> Result<Option<String>, CacheError> {
        let Some(subject) = subject else {
            return Ok(None);
        };
        Ok(self.directory.primary_group(subject).await?)
    }

    async fn render(
        &self,
        subject: Option<SubjectId>,
        placeholder: Placeholder,
    ) -> Result<String, CacheError> {
        let target = match &placeholder {
            Placeholder::PrimaryGroup => {
                return Ok(self
                    .primary_group(subject.as_ref())
                    .await?
                    .unwrap_or_else(|| NO_GROUP.to_string()));
            }
            Placeholder::MemberCount(target)
            | Placeholder::TotalBalance(target)
            | Placeholder::TotalBalanceFormatted(target)
            | Placeholder::TotalBalanceCommas(target) => target,
        };

        let group = match target {
            Target::Group(group) => group.clone(),
            Target::OwnGroup => match self.primary_group(subject.as_ref()).await? {
                Some(group) => group,
                None => return Ok(NO_VALUE.to_string()),
            },
        };

        if let Placeholder::MemberCount(_) = placeholder {
            return Ok(self.stats.member_count(&group).await?.to_string());
        }

        let total = self.stats.total_balance(&group).await?;
        Ok(match placeholder {
            Placeholder::TotalBalanceFormatted(_) => format_abbreviated(total),
            Placeholder::TotalBalanceCommas(_) => format_grouped(total),
            _ => format_raw(total),
        })
    }
}

/// Per-`(subject, placeholder)` cache of display-ready strings.
///
/// Cheap to clone; clones share the same entries.
#[derive(Clone)]
pub struct PlaceholderCache {
    inner: Arc<Inner>,
}

impl PlaceholderCache {
    /// Create a cache that finishes computations on the current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn new(
        directory: Arc<dyn Directory>,
        stats: GroupStatsCache,
        config: &PlaceholderConfig,
    ) -> Self {
        Self::with_handle(directory, stats, config, Handle::current())
    }

    /// Create a cache that finishes computations on `runtime`.
    pub fn with_handle(
        directory: Arc<dyn Directory>,
        stats: GroupStatsCache,
        config: &PlaceholderConfig,
        runtime: Handle,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                directory,
                stats,
                entries: DashMap::new(),
                expiry: config.expiry(),
                pending_sentinel: config.pending_sentinel.clone(),
                runtime,
            }),
        }
    }

    /// Resolve `placeholder` for `subject`.
    ///
    /// Never blocks and never fails. Safe to call from threads outside the
    /// runtime.
    pub fn resolve(&self, subject: Option<&SubjectId>, placeholder: &Placeholder) -> String {
        let key: CacheKey = (subject.cloned(), placeholder.clone());
        let previous = self.inner.entries.get(&key).map(|e| e.value().clone());

        if let Some(entry) = &previous {
            if entry.is_fresh(self.inner.expiry, Utc::now()) {
                return entry.value.clone();
            }
        }

        let _context = self.inner.runtime.enter();
        let inner = Arc::clone(&self.inner);
        let (task_subject, task_placeholder) = key.clone();
        let mut rendering: BoxFuture<'static, Result<String, CacheError>> =
            async move { inner.render(task_subject, task_placeholder).await }.boxed();

        match (&mut rendering).now_or_never() {
            Some(Ok(value)) => {
                self.inner.store(key, value.clone());
                value
            }
            Some(Err(e)) => {
                debug!(
                    subject = %SubjectLabel(subject),
                    placeholder = %placeholder,
                    error = %e,
                    "Placeholder computation failed"
                );
                previous.map_or_else(|| NO_VALUE.to_string(), |entry| entry.value)
            }
            None => {
                let inner = Arc::clone(&self.inner);
                self.inner.runtime.spawn(async move {
                    match rendering.await {
                        Ok(value) => inner.store(key, value),
                        Err(e) => {
                            debug!(
                                subject = %SubjectLabel(key.0.as_ref()),
                                placeholder = %key.1,
                                error = %e,
                                "Placeholder computation failed"
                            );
                        }
                    }
                });
                previous.map_or_else(|| self.inner.pending_sentinel.clone(), |entry| entry.value)
            }
        }
    }

    /// Parse `identifier` and resolve it.
    ///
    /// Returns `None` only when the identifier is not a known placeholder.
    pub fn resolve_identifier(
        &self,
        subject: Option<&SubjectId>,
        identifier: &str,
    ) -> Option<String> {
        match identifier.parse::<Placeholder>() {
            Ok(placeholder) => Some(self.resolve(subject, &placeholder)),
            Err(e) => {
                debug!(error = %e, "Ignoring unknown placeholder");
                None
            }
        }
    }

    /// The cached entry for `(subject, placeholder)`, regardless of age.
    #[must_use]
    pub fn peek(
        &self,
        subject: Option<&SubjectId>,
        placeholder: &Placeholder,
    ) -> Option<PlaceholderEntry> {
        self.inner
            .entries
            .get(&(subject.cloned(), placeholder.clone()))
            .map(|e| e.value().clone())
    }

    /// Remove entries older than the expiry window. Returns count removed.
    pub fn cleanup(&self) -> usize {
        let now = Utc::now();
        let expiry = self.inner.expiry;
        let before = self.inner.entries.len();
        self.inner
            .entries
            .retain(|_, entry| now - entry.cached_at <= expiry);
        let removed = before.saturating_sub(self.inner.entries.len());
        if removed > 0 {
            debug!(removed, "Pruned expired placeholder entries");
        }
        removed
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.inner.entries.clear();
    }
}
