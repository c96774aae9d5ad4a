//! Lifecycle record of one submitted query.
//!
//! A run moves `Created → Submitted → Fetched` and never backwards. There is
//! no failed or retrying state: a failing call simply leaves the run where it
//! was and the error travels back to the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{ErrorContext, QueryServiceError, QueryServiceResult};
use super::models::ExecutionHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryState {
    Created,
    Submitted,
    Fetched,
}

/// A single timestamped transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub timestamp: DateTime<Utc>,
    pub state: QueryState,
    pub message: String,
}

/// One query's path through the execution client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRun {
    pub run_id: String,
    pub state: QueryState,
    pub handle: Option<ExecutionHandle>,
    pub created_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub wait_seconds: Option<u64>,
    pub events: Vec<LifecycleEvent>,
}

impl QueryRun {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4().to_string(),
            state: QueryState::Created,
            handle: None,
            created_at: now,
            submitted_at: None,
            fetched_at: None,
            wait_seconds: None,
            events: vec![LifecycleEvent {
                timestamp: now,
                state: QueryState::Created,
                message: "Query created".to_string(),
            }],
        }
    }

    fn push(&mut self, state: QueryState, message: String) {
        self.state = state;
        self.events.push(LifecycleEvent {
            timestamp: Utc::now(),
            state,
            message,
        });
    }

    fn expect_state(&self, expected: QueryState, operation: &str) -> QueryServiceResult<()> {
        if self.state == expected {
            return Ok(());
        }
        let mut context = ErrorContext::new(operation);
        if let Some(ref handle) = self.handle {
            context = context.with_execution_id(handle);
        }
        Err(QueryServiceError::invalid_state(
            format!("run {} is {:?}, expected {:?}", self.run_id, self.state, expected),
            context,
        ))
    }

    pub fn mark_submitted(&mut self, handle: ExecutionHandle) -> QueryServiceResult<()> {
        self.expect_state(QueryState::Created, "submit")?;
        self.submitted_at = Some(Utc::now());
        let message = format!("Submitted as {}", handle);
        self.handle = Some(handle);
        self.push(QueryState::Submitted, message);
        Ok(())
    }

    pub fn record_wait(&mut self, seconds: u64) {
        self.wait_seconds = Some(seconds);
    }

    /// Handle to fetch with; only available once submitted.
    pub fn fetchable_handle(&self) -> QueryServiceResult<&ExecutionHandle> {
        self.expect_state(QueryState::Submitted, "fetch")?;
        self.handle.as_ref().ok_or_else(|| {
            QueryServiceError::invalid_state(
                format!("run {} has no execution handle", self.run_id),
                ErrorContext::new("fetch"),
            )
        })
    }

    pub fn mark_fetched(&mut self, rows: usize) -> QueryServiceResult<()> {
        self.expect_state(QueryState::Submitted, "fetch")?;
        self.fetched_at = Some(Utc::now());
        self.push(QueryState::Fetched, format!("Fetched {} rows", rows));
        Ok(())
    }
}

impl Default for QueryRun {
    fn default() -> Self {
        Self::new()
    }
}
