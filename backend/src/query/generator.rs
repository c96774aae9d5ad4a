//! Query construction from a block size.

use serde::Serialize;
use std::fmt;

use super::ranges::{build_ranges, Range};
use super::render::QueryTemplate;
use super::validation::{BlockSize, BlockSizeInput, QueryValidator};
use crate::config::QuerySettings;

/// Fully substituted query text, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedQuery {
    text: String,
    block_size: BlockSize,
    ranges: Vec<Range>,
}

impl RenderedQuery {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn block_size(&self) -> BlockSize {
        self.block_size
    }

    pub fn ranges(&self) -> &[Range] {
        &self.ranges
    }

    /// Aliases of the aggregate columns, in query order.
    pub fn column_labels(&self) -> Vec<String> {
        self.ranges.iter().map(Range::label).collect()
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for RenderedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl AsRef<str> for RenderedQuery {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

/// Builds the range aggregate query for a block size.
#[derive(Debug, Clone, Default)]
pub struct SqlQueryGenerator {
    validator: QueryValidator,
    template: QueryTemplate,
}

impl SqlQueryGenerator {
    pub fn new(template: QueryTemplate) -> Self {
        Self {
            validator: QueryValidator::new(template.domain),
            template,
        }
    }

    pub fn from_settings(settings: &QuerySettings) -> Self {
        Self::new(QueryTemplate::from_settings(settings))
    }

    pub fn validator(&self) -> &QueryValidator {
        &self.validator
    }

    pub fn template(&self) -> &QueryTemplate {
        &self.template
    }

    /// Render the query for `block_size`, or `None` when validation fails.
    pub fn create_query_by_range(&self, block_size: impl Into<BlockSizeInput>) -> Option<RenderedQuery> {
        let input = block_size.into();
        let Some(block_size) = self.validator.check(&input) else {
            log::error!("Exit creating SQL query, block size is not correct");
            return None;
        };

        let ranges = build_ranges(self.template.domain, block_size.get());
        let lines = self.template.render_ranges(&ranges);
        let text = self.template.render_query(&lines);
        log::debug!(
            "Rendered query with {} range columns for block_size={}",
            ranges.len(),
            block_size
        );

        Some(RenderedQuery {
            text,
            block_size,
            ranges,
        })
    }
}
