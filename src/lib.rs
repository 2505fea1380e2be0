//! Rankstats - near-real-time group statistics for templating placeholders.
//!
//! Keeps the summed balance and member count of every group defined by an
//! external directory, and renders them as display-ready strings for a
//! templating consumer that must never wait.
//!
//! # Architecture
//!
//! Two cache tiers sit between the consumer and the directory:
//!
//! - **`runtime::cache::GroupStatsCache`** - `(total_balance, member_count)`
//!   per group, refreshed on a fixed schedule and on demand. Concurrent
//!   requests for the same group share one computation (single-flight).
//! - **`runtime::cache::PlaceholderCache`** - rendered strings per
//!   `(subject, placeholder)`, with its own expiry. Always answers
//!   synchronously: fresh value, previous value, or a pending sentinel.
//!
//! # Modules
//!
//! - [`app`] - Configuration and lifecycle wiring
//! - [`domain`] - Identifiers, group statistics, placeholders, formatting
//! - [`port`] - The [`port::Directory`] trait
//! - [`adapter`] - In-memory directory implementation
//! - [`runtime`] - Caches and the refresh service
//! - [`error`] - Error types for the crate
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use rankstats::adapter::InMemoryDirectory;
//! use rankstats::app::{config::Config, App};
//!
//! # async fn run() {
//! let directory = InMemoryDirectory::new();
//! directory.upsert_member("alice", &["vip"], 100.0);
//!
//! let app = App::start(&Config::default(), Arc::new(directory));
//! let rendered = app.resolve(None, "totalBalance_formatted::vip");
//! app.shutdown().await;
//! # }
//! ```

pub mod adapter;
pub mod app;
pub mod domain;
pub mod error;
pub mod port;
pub mod runtime;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
