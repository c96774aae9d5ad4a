//! SQL generation for range-bucketed detection percentages.
//!
//! The distance axis `[lower, upper]` is split into contiguous blocks of a
//! caller-chosen width. Each block becomes one aggregate column in a single
//! `GROUP BY` query over the configured category column.
//!
//! ```text
//! BlockSizeInput ──validate──▶ BlockSize ──build_ranges──▶ [Range]
//!                                                             │
//!                               RenderedQuery ◀──render───────┘
//! ```

pub mod generator;
pub mod ranges;
pub mod render;
pub mod validation;

pub use generator::{RenderedQuery, SqlQueryGenerator};
pub use ranges::{build_ranges, BlockRanges, DistanceDomain, Range};
pub use render::{QueryTemplate, END_TOKEN, PLACEHOLDER_TOKEN, START_TOKEN};
pub use validation::{BlockSize, BlockSizeInput, QueryValidator};

/// Lowest distance covered by the report.
pub const LOWER_BOUND: i64 = 1;
/// Highest distance covered by the report.
pub const UPPER_BOUND: i64 = 100;
