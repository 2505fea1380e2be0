//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! # Available Ports
//!
//! - [`Directory`] - Group membership, primary groups and balances

mod directory;

pub use directory::Directory;
