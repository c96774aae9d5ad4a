//! End-to-end report generation.
//!
//! [`VehicleDetectionPercentage`] ties the pieces together:
//!
//! ```text
//! validate → build ranges → render → submit → wait → fetch → shape → write
//! ```
//!
//! [`VehicleDetectionPercentage::run`] reports failures as a typed
//! [`PipelineError`]; [`VehicleDetectionPercentage::generate_true_detection_data`]
//! logs them and returns `None`.

use std::sync::Arc;

use crate::config::{ConfigError, ReportConfig, Settings};
use crate::execution::{
    QueryExecutionClient, QueryRun, QueryService, QueryServiceError, QueryServiceFactory,
};
use crate::query::{BlockSizeInput, RenderedQuery, SqlQueryGenerator};
use crate::report::{
    ArtifactError, ArtifactPaths, ArtifactWriter, BarChartData, ResultShaper, ResultTable,
    ShapeError,
};

pub const DEFAULT_BLOCK_SIZE: i64 = 10;

/// Process exit status after an invalid block size.
pub const EXIT_INVALID_INPUT: u8 = 1;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Invalid block size: {0}")]
    InvalidBlockSize(BlockSizeInput),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Query execution failed: {0}")]
    Remote(#[from] QueryServiceError),

    #[error("Failed to shape query result: {0}")]
    Shape(#[from] ShapeError),

    #[error("Failed to write report: {0}")]
    Artifact(#[from] ArtifactError),
}

impl PipelineError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidBlockSize(_))
    }

    /// Exit status for a command-line run that ended in this error. Only an
    /// invalid block size is fatal; any other failure is an absent result.
    pub fn exit_status(&self) -> u8 {
        if self.is_validation() {
            EXIT_INVALID_INPUT
        } else {
            0
        }
    }
}

/// Everything one successful run produced.
#[derive(Debug, Clone)]
pub struct DetectionReport {
    pub query: RenderedQuery,
    pub run: QueryRun,
    pub table: ResultTable,
    pub chart: Option<BarChartData>,
    pub artifacts: ArtifactPaths,
}

/// True-detection percentages per vehicle type, bucketed by distance.
pub struct VehicleDetectionPercentage {
    block_size: BlockSizeInput,
    chart_enabled: bool,
    generator: SqlQueryGenerator,
    client: QueryExecutionClient,
    shaper: ResultShaper,
    writer: ArtifactWriter,
}

impl VehicleDetectionPercentage {
    pub fn new(
        block_size: impl Into<BlockSizeInput>,
        settings: Settings,
        config: ReportConfig,
        service: Arc<dyn QueryService>,
    ) -> Self {
        Self {
            block_size: block_size.into(),
            chart_enabled: settings.chart_enabled,
            generator: SqlQueryGenerator::from_settings(&config.query),
            client: QueryExecutionClient::new(service, &settings),
            shaper: ResultShaper::from_config(&config),
            writer: ArtifactWriter::new(config.report.output_dir.clone()),
        }
    }

    pub fn with_default_block_size(
        settings: Settings,
        config: ReportConfig,
        service: Arc<dyn QueryService>,
    ) -> Self {
        Self::new(DEFAULT_BLOCK_SIZE, settings, config, service)
    }

    /// Build from the process environment, `vdp.toml` (if present) and the
    /// service type it selects.
    pub fn from_environment(block_size: impl Into<BlockSizeInput>) -> Result<Self, PipelineError> {
        let settings = Settings::from_env();
        let config = ReportConfig::load_or_default()?;
        let service = QueryServiceFactory::from_config(&config, &settings)?;
        Ok(Self::new(block_size, settings, config, service))
    }

    pub fn block_size(&self) -> &BlockSizeInput {
        &self.block_size
    }

    pub fn client(&self) -> &QueryExecutionClient {
        &self.client
    }

    pub fn writer(&self) -> &ArtifactWriter {
        &self.writer
    }

    pub fn render_query(&self) -> Result<RenderedQuery, PipelineError> {
        self.generator
            .create_query_by_range(self.block_size.clone())
            .ok_or_else(|| PipelineError::InvalidBlockSize(self.block_size.clone()))
    }

    pub async fn run(&self) -> Result<DetectionReport, PipelineError> {
        let query = self.render_query()?;
        let (run, raw) = self.client.execute(query.as_str()).await?;

        let mut artifacts = ArtifactPaths {
            raw: Some(self.writer.write_raw(&raw)?),
            ..ArtifactPaths::default()
        };
        let table = self.shaper.shape(&raw)?;
        artifacts.table = Some(self.writer.write_table(&table)?);

        let chart = if self.chart_enabled {
            log::info!("Creating bar chart");
            let chart = BarChartData::from_table(&table)?;
            artifacts.chart = Some(self.writer.write_chart(&chart)?);
            Some(chart)
        } else {
            log::info!("Not creating bar chart, set CREATE_BAR_CHART=\"true\" to get the chart file");
            None
        };

        Ok(DetectionReport {
            query,
            run,
            table,
            chart,
            artifacts,
        })
    }

    /// Run the pipeline and return the filtered table, or `None` after
    /// logging whatever went wrong.
    pub async fn generate_true_detection_data(&self) -> Option<ResultTable> {
        log::info!("Start generate_true_detection_data");
        match self.run().await {
            Ok(report) => {
                log::info!("Done generate_true_detection_data");
                Some(report.table)
            }
            Err(PipelineError::InvalidBlockSize(input)) => {
                log::error!(
                    "create_query_by_range failed for block_size {}, change the block size and re-run",
                    input
                );
                None
            }
            Err(e) => {
                log::error!("generate_true_detection_data failed with error: {}", e);
                None
            }
        }
    }
}
