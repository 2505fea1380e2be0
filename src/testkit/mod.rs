//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`directory`] — `ScriptedDirectory`, a counting, failure-injecting
//!   [`Directory`](crate::port::Directory).
//! - [`config`] — Canonical test configurations.
//! - [`wait`] — Polling helpers for background work.

pub mod config;
pub mod directory;
pub mod wait;

pub use directory::ScriptedDirectory;
