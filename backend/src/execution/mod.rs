//! Asynchronous query execution.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  QueryExecutionClient (client.rs)           │
//! │  submit → wait (clamped) → fetch            │
//! └───────────────────┬─────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────┐
//! │  QueryService trait (service.rs)            │
//! └───────────────────┬─────────────────────────┘
//!          ┌──────────┴───────────┐
//!   AthenaQueryService     LocalQueryService
//!   (signed HTTP)          (in-memory)
//! ```
//!
//! The wait is a single fixed sleep; completion is never polled.

pub mod client;
pub mod error;
pub mod factory;
pub mod lifecycle;
pub mod local;
pub mod models;
pub mod service;

#[cfg(feature = "athena")]
pub mod athena;
#[cfg(feature = "athena")]
pub mod sigv4;

pub use client::{resolve_wait_duration, QueryExecutionClient, SleepTime};
pub use error::{ErrorContext, QueryServiceError, QueryServiceResult};
pub use factory::{QueryServiceFactory, QueryServiceType};
pub use lifecycle::{LifecycleEvent, QueryRun, QueryState};
pub use local::LocalQueryService;
pub use models::{Datum, ExecutionHandle, QueryResults, ResultRow, ResultSet, SubmitRequest};
pub use service::QueryService;

#[cfg(feature = "athena")]
pub use athena::AthenaQueryService;
