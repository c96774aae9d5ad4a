//! Submit / wait / fetch against a [`QueryService`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::error::QueryServiceResult;
use super::lifecycle::QueryRun;
use super::models::{ExecutionHandle, QueryResults, SubmitRequest};
use super::service::QueryService;
use crate::config::{Settings, SLEEP_TIME_ENV_VAR};

pub const DEFAULT_SLEEP_TIME: u64 = 30;
pub const MIN_SLEEP_TIME: i64 = 0;
pub const MAX_SLEEP_TIME: u64 = 120;

/// Seconds to wait between submit and fetch, always within `[0, 120]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SleepTime(u64);

impl SleepTime {
    pub const DEFAULT: SleepTime = SleepTime(DEFAULT_SLEEP_TIME);

    pub fn seconds(self) -> u64 {
        self.0
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_secs(self.0)
    }
}

impl Default for SleepTime {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for SleepTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

/// Resolve the raw wait setting into a [`SleepTime`].
///
/// - absent → 30
/// - not an integer → 30, with a warning
/// - negative → 30 (not the floor of 0), with a warning
/// - above 120 → 120, with a warning
pub fn resolve_wait_duration(raw: Option<&str>) -> SleepTime {
    let Some(raw) = raw else {
        return SleepTime::DEFAULT;
    };

    let parsed = match raw.trim().parse::<i64>() {
        Ok(value) => value,
        // Integers too wide for i64 still get the sign-based treatment.
        Err(_) if is_integer_literal(raw.trim()) => {
            if raw.trim().starts_with('-') {
                i64::MIN
            } else {
                i64::MAX
            }
        }
        Err(_) => {
            log::warn!(
                "Invalid {} value: {}, defaulting to {} seconds.",
                SLEEP_TIME_ENV_VAR,
                raw,
                DEFAULT_SLEEP_TIME
            );
            return SleepTime::DEFAULT;
        }
    };

    if parsed < MIN_SLEEP_TIME {
        log::warn!(
            "{} value is less than {}: {}, defaulting to {} seconds.",
            SLEEP_TIME_ENV_VAR,
            MIN_SLEEP_TIME,
            parsed,
            DEFAULT_SLEEP_TIME
        );
        return SleepTime::DEFAULT;
    }

    // Non-negative from here on.
    let seconds = parsed as u64;
    if seconds > MAX_SLEEP_TIME {
        log::warn!(
            "{} value exceeds {} seconds: {}, capping to {} seconds.",
            SLEEP_TIME_ENV_VAR,
            MAX_SLEEP_TIME,
            seconds,
            MAX_SLEEP_TIME
        );
        return SleepTime(MAX_SLEEP_TIME);
    }

    SleepTime(seconds)
}

fn is_integer_literal(s: &str) -> bool {
    let digits = s.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Client for one query service, bound to a database and output location.
pub struct QueryExecutionClient {
    service: Arc<dyn QueryService>,
    database: String,
    output_location: String,
    sleep_time: SleepTime,
}

impl QueryExecutionClient {
    pub fn new(service: Arc<dyn QueryService>, settings: &Settings) -> Self {
        Self {
            service,
            database: settings.database.clone(),
            output_location: settings.output_location.clone(),
            sleep_time: resolve_wait_duration(settings.wait_duration_override.as_deref()),
        }
    }

    pub fn sleep_time(&self) -> SleepTime {
        self.sleep_time
    }

    pub fn service(&self) -> &Arc<dyn QueryService> {
        &self.service
    }

    /// Start `query` on `database`, persisting results under `output_location`.
    pub async fn submit(
        &self,
        query: &str,
        database: &str,
        output_location: &str,
    ) -> QueryServiceResult<ExecutionHandle> {
        let request = SubmitRequest {
            query: query.to_string(),
            database: database.to_string(),
            output_location: output_location.to_string(),
        };
        self.service
            .submit(&request)
            .await
            .map_err(|e| e.with_operation("submit"))
    }

    pub async fn fetch(&self, handle: &ExecutionHandle) -> QueryServiceResult<QueryResults> {
        self.service
            .fetch(handle)
            .await
            .map_err(|e| e.with_operation("fetch"))
    }

    /// Block for the resolved wait duration. Not interruptible.
    pub async fn wait(&self) {
        log::info!(
            "Sleep for {} seconds, waiting for the query execution to finish",
            self.sleep_time.seconds()
        );
        tokio::time::sleep(self.sleep_time.as_duration()).await;
    }

    /// Run the full lifecycle for `query` with the bound database and output
    /// location: submit, wait once, fetch once.
    pub async fn execute(&self, query: &str) -> QueryServiceResult<(QueryRun, QueryResults)> {
        let mut run = QueryRun::new();

        let handle = self
            .submit(query, &self.database, &self.output_location)
            .await?;
        run.mark_submitted(handle)?;

        self.wait().await;
        run.record_wait(self.sleep_time.seconds());

        let results = self.fetch(run.fetchable_handle()?).await?;
        run.mark_fetched(results.rows().len())?;
        Ok((run, results))
    }
}
