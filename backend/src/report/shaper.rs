//! Conversion of raw query results into a filtered table.

use polars::prelude::*;
use std::collections::HashSet;

use crate::config::ReportConfig;
use crate::execution::QueryResults;

/// Stored for cells the service left out.
pub const EMPTY_CELL: &str = "";

#[derive(Debug, thiserror::Error)]
pub enum ShapeError {
    #[error("Query result has no header row")]
    EmptyResult,

    #[error("Query result has no '{0}' column")]
    MissingCategoryColumn(String),

    #[error("Query result has more than one '{0}' column")]
    DuplicateColumn(String),

    #[error("Row {row} has {found} cells but the header has {expected}")]
    RowTooWide {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Table error: {0}")]
    Table(#[from] PolarsError),
}

/// Result table of string cells; the first column is the row category.
#[derive(Debug, Clone)]
pub struct ResultTable {
    frame: DataFrame,
    category_column: String,
}

impl ResultTable {
    pub fn data_frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn into_data_frame(self) -> DataFrame {
        self.frame
    }

    pub fn category_column(&self) -> &str {
        &self.category_column
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    fn string_column(&self, name: &str) -> Option<&StringChunked> {
        self.frame
            .column(name)
            .ok()?
            .as_materialized_series()
            .str()
            .ok()
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        self.string_column(column)?.get(row)
    }

    /// Category labels in row order.
    pub fn categories(&self) -> Vec<String> {
        self.string_column(&self.category_column)
            .map(|ca| {
                ca.into_iter()
                    .map(|v| v.unwrap_or(EMPTY_CELL).to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All rows as strings, in column order.
    pub fn rows(&self) -> Vec<Vec<String>> {
        let names = self.column_names();
        (0..self.height())
            .map(|row| {
                names
                    .iter()
                    .map(|name| self.cell(row, name).unwrap_or(EMPTY_CELL).to_string())
                    .collect()
            })
            .collect()
    }
}

/// Turns raw results into a [`ResultTable`], dropping ignored categories.
#[derive(Debug, Clone)]
pub struct ResultShaper {
    category_column: String,
    ignore_label: String,
}

impl Default for ResultShaper {
    fn default() -> Self {
        Self::from_config(&ReportConfig::default())
    }
}

impl ResultShaper {
    pub fn new(category_column: impl Into<String>, ignore_label: impl Into<String>) -> Self {
        Self {
            category_column: category_column.into(),
            ignore_label: ignore_label.into(),
        }
    }

    pub fn from_config(config: &ReportConfig) -> Self {
        Self::new(
            config.query.category_column.clone(),
            config.report.ignore_label.clone(),
        )
    }

    /// The first row supplies column names; every later row is data. Rows
    /// whose category equals the ignore label are removed.
    pub fn shape(&self, raw: &QueryResults) -> Result<ResultTable, ShapeError> {
        log::info!("Start format_output_data");
        let (header_row, data_rows) = raw.rows().split_first().ok_or(ShapeError::EmptyResult)?;

        let header: Vec<String> = header_row
            .values()
            .map(|v| v.unwrap_or(EMPTY_CELL).to_string())
            .collect();
        if !header.iter().any(|name| *name == self.category_column) {
            return Err(ShapeError::MissingCategoryColumn(self.category_column.clone()));
        }
        let mut seen = HashSet::with_capacity(header.len());
        if let Some(name) = header.iter().find(|name| !seen.insert(name.as_str())) {
            return Err(ShapeError::DuplicateColumn(name.clone()));
        }

        let width = header.len();
        let mut columns: Vec<Vec<String>> = vec![Vec::with_capacity(data_rows.len()); width];
        for (idx, row) in data_rows.iter().enumerate() {
            if row.data.len() > width {
                return Err(ShapeError::RowTooWide {
                    row: idx + 1,
                    expected: width,
                    found: row.data.len(),
                });
            }
            let mut cells = row.values();
            for column in columns.iter_mut() {
                let cell = cells.next().flatten().unwrap_or(EMPTY_CELL);
                column.push(cell.to_string());
            }
        }

        let frame = DataFrame::new(
            header
                .iter()
                .zip(columns)
                .map(|(name, values)| Column::from(Series::new(name.as_str().into(), values)))
                .collect(),
        )?;

        // The category column always leads, whatever order the service used.
        let ordered: Vec<Expr> = std::iter::once(self.category_column.as_str())
            .chain(
                header
                    .iter()
                    .map(String::as_str)
                    .filter(|name| *name != self.category_column),
            )
            .map(col)
            .collect();

        let before = frame.height();
        let filtered = frame
            .lazy()
            .filter(col(self.category_column.as_str()).neq(lit(self.ignore_label.as_str())))
            .select(ordered)
            .collect()?;
        log::info!(
            "Done format_output_data: {} rows kept, {} '{}' rows removed",
            filtered.height(),
            before - filtered.height(),
            self.ignore_label
        );

        Ok(ResultTable {
            frame: filtered,
            category_column: self.category_column.clone(),
        })
    }
}
