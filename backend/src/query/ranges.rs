//! Partitioning of the distance domain into contiguous blocks.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{LOWER_BOUND, UPPER_BOUND};

/// Inclusive integer domain being partitioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DistanceDomain {
    pub lower: i64,
    pub upper: i64,
}

impl DistanceDomain {
    pub const DEFAULT: DistanceDomain = DistanceDomain {
        lower: LOWER_BOUND,
        upper: UPPER_BOUND,
    };

    pub const fn new(lower: i64, upper: i64) -> Self {
        Self { lower, upper }
    }

    /// Number of integer points in the domain (0 when inverted).
    pub fn width(&self) -> i64 {
        if self.upper < self.lower {
            0
        } else {
            self.upper - self.lower + 1
        }
    }

    pub fn contains(&self, value: i64) -> bool {
        value >= self.lower && value <= self.upper
    }

    /// Iterate the blocks of `block_size` covering this domain.
    pub fn blocks(&self, block_size: i64) -> BlockRanges {
        BlockRanges::new(*self, block_size)
    }
}

impl Default for DistanceDomain {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// One contiguous `[start, end]` bucket of the distance axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: i64,
    pub end: i64,
}

impl Range {
    pub const fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn width(&self) -> i64 {
        self.end - self.start + 1
    }

    /// Column alias used in the rendered query, e.g. `"31-60"`.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Iterator over the blocks of a domain.
///
/// Each block is `block_size` wide except the last, which is truncated at the
/// domain's upper bound. The only state is the next start position, so
/// [`DistanceDomain::blocks`] always yields the same sequence.
#[derive(Debug, Clone)]
pub struct BlockRanges {
    domain: DistanceDomain,
    block_size: i64,
    next_start: Option<i64>,
}

impl BlockRanges {
    fn new(domain: DistanceDomain, block_size: i64) -> Self {
        // A non-positive width would never advance.
        let next_start = (block_size > 0 && domain.lower <= domain.upper).then_some(domain.lower);
        Self {
            domain,
            block_size,
            next_start,
        }
    }
}

impl Iterator for BlockRanges {
    type Item = Range;

    fn next(&mut self) -> Option<Range> {
        let start = self.next_start?;
        if start > self.domain.upper {
            self.next_start = None;
            return None;
        }

        let end = start
            .checked_add(self.block_size - 1)
            .map_or(self.domain.upper, |end| end.min(self.domain.upper));
        self.next_start = start.checked_add(self.block_size);
        Some(Range::new(start, end))
    }
}

/// Build the ordered blocks covering `domain`.
///
/// Returns an empty list when `block_size` is not positive; callers are
/// expected to validate the size first.
pub fn build_ranges(domain: DistanceDomain, block_size: i64) -> Vec<Range> {
    domain.blocks(block_size).collect()
}
