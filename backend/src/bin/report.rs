//! VDP report binary
//!
//! # Usage
//!
//! ```bash
//! # Full report with block size 30 against the configured service
//! vdp-report report --block-size 30
//!
//! # Offline run serving a stored result (e.g. an earlier data.json)
//! vdp-report report --fixture data.json
//!
//! # Print the generated SQL only
//! vdp-report render --block-size 20
//!
//! # Run an ad-hoc query and store the raw result
//! vdp-report query --sql "SELECT * FROM mobileye_detect_vehicle_db.data limit 10"
//! ```
//!
//! # Environment Variables
//!
//! - `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`, `REGION_NAME`: service credentials
//! - `ATHENA_DATABASE`, `ATHENA_OUTPUT_LOCATION`: query target
//! - `SLEEP_TIME`: seconds between submit and fetch (default: 30, max: 120)
//! - `CREATE_BAR_CHART`: `true` to write the chart data
//! - `RUST_LOG`: log filter (default: info)

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use vdp_rust::execution::{
    LocalQueryService, QueryExecutionClient, QueryService, QueryServiceFactory,
};
use vdp_rust::pipeline::EXIT_INVALID_INPUT;
use vdp_rust::report::ArtifactWriter;
use vdp_rust::{logging, ReportConfig, Settings, SqlQueryGenerator, VehicleDetectionPercentage};

const DEFAULT_CLI_BLOCK_SIZE: i64 = 30;

#[derive(Parser, Debug)]
#[command(name = "vdp-report", version, about = "Vehicle true-detection percentages by distance range")]
struct Cli {
    /// Path to a vdp.toml file (default: search the usual locations)
    #[arg(long, global = true, env = "VDP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate, run and store the detection report
    Report {
        #[arg(long, default_value_t = DEFAULT_CLI_BLOCK_SIZE, allow_negative_numbers = true)]
        block_size: i64,

        /// Serve this stored result from the in-memory service instead of
        /// calling the configured one
        #[arg(long)]
        fixture: Option<PathBuf>,
    },
    /// Print the query for a block size without running it
    Render {
        #[arg(long, allow_negative_numbers = true)]
        block_size: i64,
    },
    /// Submit an arbitrary query and store its raw result
    Query {
        #[arg(long)]
        sql: String,

        #[arg(long)]
        fixture: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<ReportConfig> {
    Ok(match path {
        Some(path) => ReportConfig::from_file(path)?,
        None => ReportConfig::load_or_default()?,
    })
}

fn select_service(
    fixture: Option<&PathBuf>,
    config: &ReportConfig,
    settings: &Settings,
) -> anyhow::Result<Arc<dyn QueryService>> {
    if let Some(path) = fixture {
        return Ok(Arc::new(LocalQueryService::from_fixture(path)?));
    }
    Ok(QueryServiceFactory::from_config(config, settings)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    logging::init(Some(config.report.log_file.as_path()))?;

    match cli.command {
        Command::Render { block_size } => {
            let generator = SqlQueryGenerator::from_settings(&config.query);
            match generator.create_query_by_range(block_size) {
                Some(query) => {
                    print!("{}", query);
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    eprintln!("Invalid block size {}, change it and re-run", block_size);
                    Ok(ExitCode::from(EXIT_INVALID_INPUT))
                }
            }
        }
        Command::Report {
            block_size,
            fixture,
        } => {
            let settings = Settings::from_env();
            let service = select_service(fixture.as_ref(), &config, &settings)?;
            info!("Starting report with block size {} on {}", block_size, service.name());

            let vdp = VehicleDetectionPercentage::new(block_size, settings, config, service);
            match vdp.run().await {
                Ok(report) => {
                    println!("{}", report.table.data_frame());
                    info!("Report written to {}", vdp.writer().output_dir().display());
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    if e.is_validation() {
                        error!("{}", e);
                        eprintln!("{}, change the block size and re-run", e);
                    } else {
                        error!("generate_true_detection_data failed with error: {}", e);
                        eprintln!("No result: {}", e);
                    }
                    Ok(ExitCode::from(e.exit_status()))
                }
            }
        }
        Command::Query { sql, fixture } => {
            let settings = Settings::from_env();
            let service = select_service(fixture.as_ref(), &config, &settings)?;
            let client = QueryExecutionClient::new(service, &settings);

            let (run, raw) = client.execute(&sql).await?;
            let path = ArtifactWriter::new(config.report.output_dir.clone()).write_raw(&raw)?;
            println!("{}", serde_json::to_string_pretty(&run)?);
            info!("Raw result saved to {}", path.display());
            Ok(ExitCode::SUCCESS)
        }
    }
}
