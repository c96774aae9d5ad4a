//! Persisting report artifacts to the output directory.

use polars::prelude::*;
use serde::Serialize;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use super::chart::BarChartData;
use super::shaper::ResultTable;
use crate::execution::QueryResults;

pub const RAW_RESULT_FILE: &str = "data.json";
pub const TABLE_FILE: &str = "data.csv";
pub const CHART_FILE: &str = "vehicle_type_bar_chart.json";

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write table {path}: {source}")]
    Table {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },
}

/// Paths of the files produced by one report run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArtifactPaths {
    pub raw: Option<PathBuf>,
    pub table: Option<PathBuf>,
    pub chart: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    output_dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn create(&self, name: &str) -> Result<(PathBuf, File), ArtifactError> {
        let path = self.output_dir.join(name);
        fs::create_dir_all(&self.output_dir).map_err(|source| ArtifactError::Io {
            path: self.output_dir.clone(),
            source,
        })?;
        let file = File::create(&path).map_err(|source| ArtifactError::Io {
            path: path.clone(),
            source,
        })?;
        Ok((path, file))
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<PathBuf, ArtifactError> {
        let (path, file) = self.create(name)?;
        serde_json::to_writer_pretty(BufWriter::new(file), value).map_err(|source| {
            ArtifactError::Json {
                path: path.clone(),
                source,
            }
        })?;
        log::info!("Saved {}", path.display());
        Ok(path)
    }

    /// Store the fetched result exactly as the service returned it.
    pub fn write_raw(&self, raw: &QueryResults) -> Result<PathBuf, ArtifactError> {
        self.write_json(RAW_RESULT_FILE, raw)
    }

    /// Header row plus one line per kept category, no index column.
    pub fn write_table(&self, table: &ResultTable) -> Result<PathBuf, ArtifactError> {
        let (path, mut file) = self.create(TABLE_FILE)?;
        let mut frame = table.data_frame().clone();
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut frame)
            .map_err(|source| ArtifactError::Table {
                path: path.clone(),
                source,
            })?;
        log::info!("Saved {}", path.display());
        Ok(path)
    }

    pub fn write_chart(&self, chart: &BarChartData) -> Result<PathBuf, ArtifactError> {
        self.write_json(CHART_FILE, chart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ResultShaper;

    fn raw() -> QueryResults {
        QueryResults::from_rows(vec![
            vec![Some("vehicle_type"), Some("1-50"), Some("51-100")],
            vec![Some("car"), Some("97.5"), Some("88.0")],
            vec![Some("ignore"), Some("1.0"), Some("2.0")],
            vec![Some("truck"), None, Some("70.0")],
        ])
    }

    #[test]
    fn test_write_raw_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path());

        let path = writer.write_raw(&raw()).unwrap();
        assert_eq!(path, dir.path().join(RAW_RESULT_FILE));

        let stored: QueryResults =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(stored, raw());
    }

    #[test]
    fn test_write_table_excludes_ignored_rows() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path());
        let table = ResultShaper::default().shape(&raw()).unwrap();

        let path = writer.write_table(&table).unwrap();
        let csv = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "vehicle_type,1-50,51-100");
        assert_eq!(lines[1], "car,97.5,88.0");
        assert!(lines[2].starts_with("truck,"));
        assert_eq!(lines.len(), 3);
        assert!(!csv.contains("ignore"));
    }

    #[test]
    fn test_write_chart() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path().join("nested"));
        let table = ResultShaper::default().shape(&raw()).unwrap();
        let chart = BarChartData::from_table(&table).unwrap();

        let path = writer.write_chart(&chart).unwrap();
        assert!(path.ends_with(CHART_FILE));
        let stored: BarChartData =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(stored, chart);
    }
}
