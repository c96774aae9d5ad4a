//! Result shaping and report artifacts.
//!
//! A fetched [`QueryResults`](crate::execution::QueryResults) is turned into a
//! [`ResultTable`] by [`ResultShaper`], then written by [`ArtifactWriter`]:
//!
//! - `data.json`: the raw result, unfiltered
//! - `data.csv`: the shaped table without ignored categories
//! - `vehicle_type_bar_chart.json`: [`BarChartData`], only when charts are enabled

pub mod artifacts;
pub mod chart;
pub mod shaper;

pub use artifacts::{ArtifactError, ArtifactPaths, ArtifactWriter, CHART_FILE, RAW_RESULT_FILE, TABLE_FILE};
pub use chart::{BarChartData, BarSeries};
pub use shaper::{ResultShaper, ResultTable, ShapeError, EMPTY_CELL};
