//! Directory-agnostic domain types.

mod ids;
mod placeholder;
mod stats;

pub mod format;

pub use ids::{MemberId, SubjectId};
pub use placeholder::{Placeholder, PlaceholderParseError, Target};
pub use stats::GroupStats;
