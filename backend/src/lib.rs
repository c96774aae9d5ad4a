//! # VDP Rust
//!
//! Vehicle true-detection percentages per distance range.
//!
//! The crate generates a range-bucketed aggregate query, runs it on a remote
//! query service with a single clamped wait between submit and fetch, and
//! shapes the result into a table plus report artifacts.
//!
//! ## Architecture
//!
//! - [`config`]: environment settings and the optional `vdp.toml`
//! - [`query`]: block-size validation, range partitioning and query rendering
//! - [`execution`]: the [`QueryService`](execution::QueryService) abstraction,
//!   its Athena and in-memory implementations, and the execution client
//! - [`report`]: result shaping and artifact output
//! - [`pipeline`]: the end-to-end orchestration
//! - [`logging`]: subscriber setup for binaries

#![allow(clippy::result_large_err)]

pub mod config;
pub mod execution;
pub mod logging;
pub mod pipeline;
pub mod query;
pub mod report;

pub use config::{ReportConfig, Settings};
pub use pipeline::{DetectionReport, PipelineError, VehicleDetectionPercentage};
pub use query::{RenderedQuery, SqlQueryGenerator};
pub use report::ResultTable;
