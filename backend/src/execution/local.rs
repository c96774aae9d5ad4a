//! In-memory query service.
//!
//! Stands in for the remote engine in tests and offline runs. Submissions are
//! recorded in order and every handle serves the configured canned result.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use super::error::{ErrorContext, QueryServiceError, QueryServiceResult};
use super::models::{ExecutionHandle, QueryResults, SubmitRequest};
use super::service::QueryService;

/// In-memory query service.
///
/// # Example
/// ```
/// use vdp_rust::execution::{LocalQueryService, QueryResults};
///
/// let service = LocalQueryService::new()
///     .with_result(QueryResults::from_rows(vec![vec![Some("vehicle_type")]]));
/// assert_eq!(service.submission_count(), 0);
/// ```
#[derive(Clone, Default)]
pub struct LocalQueryService {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    submissions: Vec<(ExecutionHandle, SubmitRequest)>,
    results: HashMap<ExecutionHandle, QueryResults>,
    canned: QueryResults,
    submit_failure: Option<String>,
    fetch_failure: Option<String>,
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            submissions: Vec::new(),
            results: HashMap::new(),
            canned: QueryResults::default(),
            submit_failure: None,
            fetch_failure: None,
            is_healthy: true,
        }
    }
}

impl LocalQueryService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve a stored result, e.g. a `data.json` from an earlier run, for
    /// every submission.
    pub fn from_fixture(path: impl AsRef<Path>) -> QueryServiceResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            QueryServiceError::configuration(format!(
                "Failed to read fixture {}: {}",
                path.display(),
                e
            ))
        })?;
        let results: QueryResults = serde_json::from_str(&text).map_err(|e| {
            QueryServiceError::configuration(format!(
                "Fixture {} is not a query result: {}",
                path.display(),
                e
            ))
        })?;
        Ok(Self::new().with_result(results))
    }

    /// Serve `results` for every submission.
    pub fn with_result(self, results: QueryResults) -> Self {
        self.set_result(results);
        self
    }

    pub fn set_result(&self, results: QueryResults) {
        self.data.write().canned = results;
    }

    /// Serve `results` for one specific handle, overriding the canned result.
    pub fn set_result_for(&self, handle: &ExecutionHandle, results: QueryResults) {
        self.data.write().results.insert(handle.clone(), results);
    }

    /// Make every subsequent submit fail with a service error.
    pub fn fail_submissions(&self, message: impl Into<String>) {
        self.data.write().submit_failure = Some(message.into());
    }

    /// Make every subsequent fetch fail with a service error.
    pub fn fail_fetches(&self, message: impl Into<String>) {
        self.data.write().fetch_failure = Some(message.into());
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    pub fn submission_count(&self) -> usize {
        self.data.read().submissions.len()
    }

    /// Submitted requests in submission order.
    pub fn submitted(&self) -> Vec<SubmitRequest> {
        self.data
            .read()
            .submissions
            .iter()
            .map(|(_, request)| request.clone())
            .collect()
    }

    pub fn handles(&self) -> Vec<ExecutionHandle> {
        self.data
            .read()
            .submissions
            .iter()
            .map(|(handle, _)| handle.clone())
            .collect()
    }
}

#[async_trait]
impl QueryService for LocalQueryService {
    async fn health_check(&self) -> QueryServiceResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn submit(&self, request: &SubmitRequest) -> QueryServiceResult<ExecutionHandle> {
        let mut data = self.data.write();
        if let Some(message) = &data.submit_failure {
            return Err(QueryServiceError::service(
                message.clone(),
                ErrorContext::new("submit").with_details("local failure injection"),
            ));
        }

        let handle = ExecutionHandle::new(Uuid::new_v4().to_string());
        data.submissions.push((handle.clone(), request.clone()));
        Ok(handle)
    }

    async fn fetch(&self, handle: &ExecutionHandle) -> QueryServiceResult<QueryResults> {
        let data = self.data.read();
        if let Some(message) = &data.fetch_failure {
            return Err(QueryServiceError::service(
                message.clone(),
                ErrorContext::new("fetch").with_execution_id(handle),
            ));
        }

        if !data.submissions.iter().any(|(h, _)| h == handle) {
            return Err(QueryServiceError::not_found(
                format!("No execution with id {}", handle),
                ErrorContext::new("fetch").with_execution_id(handle),
            ));
        }

        Ok(data
            .results
            .get(handle)
            .cloned()
            .unwrap_or_else(|| data.canned.clone()))
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(sql: &str) -> SubmitRequest {
        SubmitRequest {
            query: sql.to_string(),
            database: "test_db".to_string(),
            output_location: "s3://test-bucket".to_string(),
        }
    }

    #[tokio::test]
    async fn test_submit_records_request() {
        let service = LocalQueryService::new();
        let handle = service.submit(&request("SELECT 1")).await.unwrap();

        assert!(!handle.as_str().is_empty());
        assert_eq!(service.submission_count(), 1);
        assert_eq!(service.submitted()[0].query, "SELECT 1");
        assert_eq!(service.handles(), vec![handle]);
    }

    #[tokio::test]
    async fn test_handles_are_unique() {
        let service = LocalQueryService::new();
        let a = service.submit(&request("SELECT 1")).await.unwrap();
        let b = service.submit(&request("SELECT 1")).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_fetch_returns_canned_result() {
        let canned = QueryResults::from_rows(vec![vec![Some("vehicle_type")], vec![Some("car")]]);
        let service = LocalQueryService::new().with_result(canned.clone());
        let handle = service.submit(&request("SELECT 1")).await.unwrap();

        assert_eq!(service.fetch(&handle).await.unwrap(), canned);
    }

    #[tokio::test]
    async fn test_fetch_per_handle_override() {
        let service = LocalQueryService::new();
        let handle = service.submit(&request("SELECT 1")).await.unwrap();
        let specific = QueryResults::from_rows(vec![vec![Some("only_me")]]);
        service.set_result_for(&handle, specific.clone());

        assert_eq!(service.fetch(&handle).await.unwrap(), specific);
    }

    #[tokio::test]
    async fn test_fetch_unknown_handle() {
        let service = LocalQueryService::new();
        let err = service
            .fetch(&ExecutionHandle::new("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, QueryServiceError::NotFound { .. }));
        assert_eq!(err.context().execution_id.as_deref(), Some("missing"));
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let service = LocalQueryService::new();
        service.fail_submissions("AccessDenied");
        let err = service.submit(&request("SELECT 1")).await.unwrap_err();
        assert!(err.to_string().contains("AccessDenied"));
        assert_eq!(service.submission_count(), 0);
    }

    #[tokio::test]
    async fn test_health_toggle() {
        let service = LocalQueryService::new();
        assert!(service.health_check().await.unwrap());
        service.set_healthy(false);
        assert!(!service.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_from_fixture_serves_stored_result() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        let stored = QueryResults::from_rows(vec![vec![Some("vehicle_type")], vec![Some("bus")]]);
        fs::write(&path, serde_json::to_string_pretty(&stored).unwrap()).unwrap();

        let service = LocalQueryService::from_fixture(&path).unwrap();
        let handle = service.submit(&request("SELECT 1")).await.unwrap();
        assert_eq!(service.fetch(&handle).await.unwrap(), stored);
    }

    #[test]
    fn test_from_fixture_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = LocalQueryService::from_fixture(dir.path().join("absent.json"));
        assert!(matches!(missing, Err(QueryServiceError::Configuration { .. })));

        let path = dir.path().join("bad.json");
        fs::write(&path, "[1, 2").unwrap();
        let err = LocalQueryService::from_fixture(&path).err().unwrap();
        assert!(err.to_string().contains("is not a query result"));
    }
}
