//! Shared vocabulary types for the brook query planner.

pub mod limits;
pub mod sort;
pub mod stream;

pub use sort::SortClause;
pub use stream::StreamId;
