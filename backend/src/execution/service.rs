//! Query service trait.
//!
//! The remote query engine is an opaque capability: it accepts a query and
//! returns a handle immediately, and later hands back whatever result is
//! stored under that handle. Implementations can target a real service or an
//! in-memory stand-in and are swapped via [`super::QueryServiceFactory`].

use async_trait::async_trait;

use super::error::QueryServiceResult;
use super::models::{ExecutionHandle, QueryResults, SubmitRequest};

/// Asynchronous query execution backend.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` so they can be shared behind an `Arc`.
#[async_trait]
pub trait QueryService: Send + Sync {
    /// Check that the backend is reachable and configured.
    async fn health_check(&self) -> QueryServiceResult<bool>;

    /// Start executing `request` and return its handle without waiting for
    /// completion.
    async fn submit(&self, request: &SubmitRequest) -> QueryServiceResult<ExecutionHandle>;

    /// Retrieve the result currently stored for `handle`. No completion check
    /// is made; the caller decides how long to wait beforehand.
    async fn fetch(&self, handle: &ExecutionHandle) -> QueryServiceResult<QueryResults>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}
