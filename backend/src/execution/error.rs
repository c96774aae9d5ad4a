//! Error types for query service operations.
//!
//! Every failure crossing the submit/fetch boundary is a [`QueryServiceError`]
//! carrying an [`ErrorContext`], so the orchestration layer can log it in full
//! before turning it into an absent result.

use std::fmt;

/// Result type for query service operations
pub type QueryServiceResult<T> = Result<T, QueryServiceError>;

/// Structured context for query service errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// The operation being performed (e.g., "submit", "fetch")
    pub operation: Option<String>,
    /// The execution handle involved, if any
    pub execution_id: Option<String>,
    /// HTTP status or service error code reported by the remote side
    pub status: Option<String>,
    /// Additional details about the error
    pub details: Option<String>,
    /// Whether the remote side reported the failure as transient
    pub retryable: bool,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: Some(operation.into()),
            ..Default::default()
        }
    }

    pub fn with_execution_id(mut self, id: impl ToString) -> Self {
        self.execution_id = Some(id.to_string());
        self
    }

    pub fn with_status(mut self, status: impl ToString) -> Self {
        self.status = Some(status.to_string());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(ref op) = self.operation {
            parts.push(format!("operation={}", op));
        }
        if let Some(ref id) = self.execution_id {
            parts.push(format!("execution_id={}", id));
        }
        if let Some(ref status) = self.status {
            parts.push(format!("status={}", status));
        }
        if let Some(ref details) = self.details {
            parts.push(format!("details={}", details));
        }
        if self.retryable {
            parts.push("retryable=true".to_string());
        }
        write!(f, "[{}]", parts.join(", "))
    }
}

/// Error type for query service operations
#[derive(Debug, thiserror::Error)]
pub enum QueryServiceError {
    /// Transport failures: DNS, TLS, connection reset, client timeouts.
    #[error("Connection error: {message} {context}")]
    Connection {
        message: String,
        context: ErrorContext,
    },

    /// The service refused or failed the request.
    #[error("Service error: {message} {context}")]
    Service {
        message: String,
        context: ErrorContext,
    },

    /// No execution is known under the given handle.
    #[error("Not found: {message} {context}")]
    NotFound {
        message: String,
        context: ErrorContext,
    },

    /// The response could not be decoded.
    #[error("Malformed response: {message} {context}")]
    MalformedResponse {
        message: String,
        context: ErrorContext,
    },

    /// The client was used out of order (e.g. fetch before submit).
    #[error("Invalid state: {message} {context}")]
    InvalidState {
        message: String,
        context: ErrorContext,
    },

    /// Missing or unusable client configuration.
    #[error("Configuration error: {message} {context}")]
    Configuration {
        message: String,
        context: ErrorContext,
    },
}

impl QueryServiceError {
    pub fn connection(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::Connection {
            message: message.into(),
            context: context.retryable(),
        }
    }

    pub fn service(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::Service {
            message: message.into(),
            context,
        }
    }

    pub fn not_found(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::NotFound {
            message: message.into(),
            context,
        }
    }

    pub fn malformed(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::MalformedResponse {
            message: message.into(),
            context,
        }
    }

    pub fn invalid_state(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::InvalidState {
            message: message.into(),
            context,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::Connection { context, .. }
            | Self::Service { context, .. }
            | Self::NotFound { context, .. }
            | Self::MalformedResponse { context, .. }
            | Self::InvalidState { context, .. }
            | Self::Configuration { context, .. } => context,
        }
    }

    /// Whether the failure was transient. Informational only: the pipeline
    /// never retries.
    pub fn is_retryable(&self) -> bool {
        self.context().retryable
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        match &mut self {
            Self::Connection { context, .. }
            | Self::Service { context, .. }
            | Self::NotFound { context, .. }
            | Self::MalformedResponse { context, .. }
            | Self::InvalidState { context, .. }
            | Self::Configuration { context, .. } => {
                context.operation = Some(operation.into());
            }
        }
        self
    }
}

#[cfg(feature = "athena")]
impl From<reqwest::Error> for QueryServiceError {
    fn from(err: reqwest::Error) -> Self {
        let mut context = ErrorContext::default();
        if let Some(status) = err.status() {
            context = context.with_status(status.as_u16());
        }
        if err.is_decode() {
            QueryServiceError::malformed(err.to_string(), context)
        } else {
            QueryServiceError::connection(err.to_string(), context)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_display() {
        let ctx = ErrorContext::new("fetch")
            .with_execution_id("abc-123")
            .with_status(400)
            .with_details("InvalidRequestException");
        let display = ctx.to_string();
        assert!(display.contains("operation=fetch"));
        assert!(display.contains("execution_id=abc-123"));
        assert!(display.contains("status=400"));
        assert!(display.contains("details=InvalidRequestException"));
        assert!(!display.contains("retryable"));
    }

    #[test]
    fn test_empty_context_display() {
        assert_eq!(ErrorContext::default().to_string(), "[]");
    }

    #[test]
    fn test_connection_errors_are_retryable() {
        let err = QueryServiceError::connection("reset by peer", ErrorContext::new("submit"));
        assert!(err.is_retryable());
        assert!(err.to_string().starts_with("Connection error: reset by peer"));
    }

    #[test]
    fn test_service_errors_keep_context() {
        let err = QueryServiceError::service("denied", ErrorContext::new("submit").with_status(403));
        assert!(!err.is_retryable());
        assert_eq!(err.context().status.as_deref(), Some("403"));
    }

    #[test]
    fn test_with_operation_overrides() {
        let err = QueryServiceError::configuration("no region").with_operation("submit");
        assert_eq!(err.context().operation.as_deref(), Some("submit"));
        assert!(err.to_string().contains("operation=submit"));
    }
}
