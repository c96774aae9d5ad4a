//! Grouped bar chart data derived from a [`ResultTable`].
//!
//! The chart is handed to consumers as a serializable DTO (one series per
//! category, one bar group per distance range) rather than a rendered image.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::shaper::{ResultTable, ShapeError};

pub const CHART_TITLE: &str = "Vehicle True Detection Percentage Bar Chart";
pub const X_AXIS_LABEL: &str = "Distance Range";
pub const Y_AXIS_LABEL: &str = "True Detection Percentage";
pub const LEGEND_TITLE: &str = "Vehicle Type";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    pub name: String,
    /// One value per distance range; `None` where the cell was not numeric.
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarChartData {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub legend_title: String,
    pub categories: Vec<String>,
    pub series: Vec<BarSeries>,
}

impl BarChartData {
    /// Coerce every non-category column to a number and pivot the table so
    /// each category becomes a series.
    pub fn from_table(table: &ResultTable) -> Result<Self, ShapeError> {
        let value_columns: Vec<String> = table
            .column_names()
            .into_iter()
            .filter(|name| name != table.category_column())
            .collect();

        let mut numeric: Vec<Vec<Option<f64>>> = Vec::with_capacity(value_columns.len());
        for name in &value_columns {
            let cast = table
                .data_frame()
                .column(name)?
                .as_materialized_series()
                .cast(&DataType::Float64)?;
            numeric.push(cast.f64()?.into_iter().collect());
        }

        let series = table
            .categories()
            .into_iter()
            .enumerate()
            .map(|(row, name)| BarSeries {
                name,
                values: numeric.iter().map(|column| column[row]).collect(),
            })
            .collect();

        Ok(Self {
            title: CHART_TITLE.to_string(),
            x_label: X_AXIS_LABEL.to_string(),
            y_label: Y_AXIS_LABEL.to_string(),
            legend_title: LEGEND_TITLE.to_string(),
            categories: value_columns,
            series,
        })
    }
}
