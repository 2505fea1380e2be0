//! Adapter implementations of the ports.

mod memory;

pub use memory::{DirectorySnapshot, InMemoryDirectory, MemberRecord};
