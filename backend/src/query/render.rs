//! Text templates for the range aggregate query.

use super::ranges::{DistanceDomain, Range};
use crate::config::QuerySettings;

pub const START_TOKEN: &str = "###START###";
pub const END_TOKEN: &str = "###END###";
pub const PLACEHOLDER_TOKEN: &str = "###PLACE_HOLDER###";

/// Schema names and domain used to render the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTemplate {
    pub table: String,
    pub category_column: String,
    pub distance_column: String,
    pub detection_column: String,
    pub domain: DistanceDomain,
}

impl Default for QueryTemplate {
    fn default() -> Self {
        Self::from_settings(&QuerySettings::default())
    }
}

impl QueryTemplate {
    pub fn from_settings(settings: &QuerySettings) -> Self {
        Self {
            table: settings.table.clone(),
            category_column: settings.category_column.clone(),
            distance_column: settings.distance_column.clone(),
            detection_column: settings.detection_column.clone(),
            domain: settings.domain(),
        }
    }

    /// Percentage of true detections inside one range, aliased to `"start-end"`.
    fn range_template(&self) -> String {
        let distance = &self.distance_column;
        format!(
            "ROUND((SUM(CASE WHEN {distance} BETWEEN {START_TOKEN} AND {END_TOKEN} \
             AND {detection} = TRUE THEN 1 ELSE 0 END) * 100.0 / NULLIF(SUM(CASE \
             WHEN {distance} BETWEEN {START_TOKEN} AND {END_TOKEN} THEN 1 ELSE 0 END), 0)), \
             3) AS \"{START_TOKEN}-{END_TOKEN}\"",
            detection = self.detection_column,
        )
    }

    fn skeleton(&self) -> String {
        let category = &self.category_column;
        format!(
            "SELECT\n    {category},\n    {PLACEHOLDER_TOKEN}\nFROM\n    {table}\nWHERE\n    \
             {distance} BETWEEN {lower} AND {upper}\nGROUP BY\n    {category}\nORDER BY\n    {category};\n",
            table = self.table,
            distance = self.distance_column,
            lower = self.domain.lower,
            upper = self.domain.upper,
        )
    }

    pub fn render_range(&self, range: &Range) -> String {
        self.range_template()
            .replace(START_TOKEN, &range.start.to_string())
            .replace(END_TOKEN, &range.end.to_string())
    }

    /// One expression per range; every line but the last is comma-terminated.
    pub fn render_ranges(&self, ranges: &[Range]) -> String {
        let mut out = String::new();
        for (i, range) in ranges.iter().enumerate() {
            out.push_str(&self.render_range(range));
            if i + 1 < ranges.len() {
                out.push_str(",\n");
            } else {
                out.push('\n');
            }
        }
        out
    }

    pub fn render_query(&self, ranges_text: &str) -> String {
        self.skeleton().replace(PLACEHOLDER_TOKEN, ranges_text)
    }
}
