//! Athena backend over the JSON 1.1 HTTP protocol.
//!
//! Two actions are used: `StartQueryExecution` to submit and
//! `GetQueryResults` to fetch the first result page. Requests are signed with
//! SigV4 from the configured credentials.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::error::{ErrorContext, QueryServiceError, QueryServiceResult};
use super::models::{ExecutionHandle, QueryResults, SubmitRequest};
use super::service::QueryService;
use super::sigv4::{self, Credentials, SigningRequest};
use crate::config::Settings;

const SERVICE: &str = "athena";
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";
const TARGET_START: &str = "AmazonAthena.StartQueryExecution";
const TARGET_RESULTS: &str = "AmazonAthena.GetQueryResults";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct StartQueryExecutionInput<'a> {
    query_string: &'a str,
    query_execution_context: QueryExecutionContext<'a>,
    result_configuration: ResultConfiguration<'a>,
    client_request_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct QueryExecutionContext<'a> {
    database: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ResultConfiguration<'a> {
    output_location: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StartQueryExecutionOutput {
    query_execution_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct GetQueryResultsInput<'a> {
    query_execution_id: &'a str,
}

/// Error document returned with non-2xx responses.
#[derive(Debug, Default, Deserialize)]
struct ServiceErrorBody {
    #[serde(rename = "__type", default)]
    error_type: Option<String>,
    #[serde(rename = "Message", alias = "message", default)]
    message: Option<String>,
}

/// Athena query service.
pub struct AthenaQueryService {
    http: reqwest::Client,
    endpoint: reqwest::Url,
    host: String,
    region: String,
    credentials: Option<Credentials>,
}

impl AthenaQueryService {
    /// Build a client for `settings.region`, or for `endpoint` when given.
    pub fn new(settings: &Settings, endpoint: Option<&str>) -> QueryServiceResult<Self> {
        let raw_endpoint = endpoint
            .map(str::to_string)
            .unwrap_or_else(|| default_endpoint(&settings.region));
        let endpoint = reqwest::Url::parse(&raw_endpoint).map_err(|e| {
            QueryServiceError::configuration(format!("Invalid endpoint '{}': {}", raw_endpoint, e))
        })?;
        let host = host_header(&endpoint).ok_or_else(|| {
            QueryServiceError::configuration(format!("Endpoint '{}' has no host", raw_endpoint))
        })?;

        let credentials = match (&settings.access_key_id, &settings.secret_access_key) {
            (Some(id), Some(secret)) => Some(Credentials {
                access_key_id: id.clone(),
                secret_access_key: secret.clone(),
            }),
            _ => None,
        };

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                QueryServiceError::configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            http,
            endpoint,
            host,
            region: settings.region.clone(),
            credentials,
        })
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    async fn call<I, O>(&self, target: &str, input: &I, context: ErrorContext) -> QueryServiceResult<O>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            QueryServiceError::Configuration {
                message: "AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY must be set".to_string(),
                context: context.clone(),
            }
        })?;

        let payload = serde_json::to_vec(input).map_err(|e| {
            QueryServiceError::malformed(format!("Failed to encode request: {}", e), context.clone())
        })?;

        let signed = sigv4::sign(
            credentials,
            &SigningRequest {
                host: &self.host,
                region: &self.region,
                service: SERVICE,
                content_type: CONTENT_TYPE,
                target,
                payload: &payload,
            },
            chrono::Utc::now(),
        );

        let response = self
            .http
            .post(self.endpoint.clone())
            .header("Content-Type", CONTENT_TYPE)
            .header("X-Amz-Target", target)
            .header("X-Amz-Date", &signed.amz_date)
            .header("X-Amz-Content-Sha256", &signed.payload_sha256)
            .header("Authorization", &signed.authorization)
            .body(payload)
            .send()
            .await
            .map_err(|e| transport_error(e, &context))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(e, &context))?;

        if !status.is_success() {
            return Err(service_error(status.as_u16(), &body, context));
        }

        serde_json::from_str(&body).map_err(|e| {
            QueryServiceError::malformed(
                format!("Failed to parse {} response: {}", target, e),
                context,
            )
        })
    }
}

fn transport_error(err: reqwest::Error, context: &ErrorContext) -> QueryServiceError {
    let op = context.operation.clone().unwrap_or_default();
    QueryServiceError::from(err).with_operation(op)
}

fn default_endpoint(region: &str) -> String {
    format!("https://athena.{}.amazonaws.com/", region)
}

fn host_header(url: &reqwest::Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

fn service_error(status: u16, body: &str, context: ErrorContext) -> QueryServiceError {
    let parsed: ServiceErrorBody = serde_json::from_str(body).unwrap_or_default();
    let error_type = parsed
        .error_type
        .as_deref()
        .map(|t| t.rsplit('#').next().unwrap_or(t).to_string());
    let message = parsed
        .message
        .unwrap_or_else(|| body.trim().to_string());

    let mut context = context.with_status(status);
    if let Some(ref kind) = error_type {
        context = context.with_details(kind.clone());
    }
    let throttled = matches!(
        error_type.as_deref(),
        Some("ThrottlingException") | Some("TooManyRequestsException")
    );
    if status >= 500 || throttled {
        context = context.retryable();
    }

    QueryServiceError::service(message, context)
}

#[async_trait]
impl QueryService for AthenaQueryService {
    async fn health_check(&self) -> QueryServiceResult<bool> {
        Ok(self.credentials.is_some())
    }

    async fn submit(&self, request: &SubmitRequest) -> QueryServiceResult<ExecutionHandle> {
        log::info!("Start run SQL query on database '{}'", request.database);
        let input = StartQueryExecutionInput {
            query_string: &request.query,
            query_execution_context: QueryExecutionContext {
                database: &request.database,
            },
            result_configuration: ResultConfiguration {
                output_location: &request.output_location,
            },
            client_request_token: uuid::Uuid::new_v4().to_string(),
        };

        let output: StartQueryExecutionOutput = self
            .call(TARGET_START, &input, ErrorContext::new("submit"))
            .await?;
        log::info!("Started query with execution ID: {}", output.query_execution_id);
        Ok(ExecutionHandle::new(output.query_execution_id))
    }

    async fn fetch(&self, handle: &ExecutionHandle) -> QueryServiceResult<QueryResults> {
        log::info!("Start get SQL query result data for {}", handle);
        let input = GetQueryResultsInput {
            query_execution_id: handle.as_str(),
        };
        let results: QueryResults = self
            .call(
                TARGET_RESULTS,
                &input,
                ErrorContext::new("fetch").with_execution_id(handle),
            )
            .await?;
        log::info!("Done get SQL query result data ({} rows)", results.rows().len());
        Ok(results)
    }

    fn name(&self) -> &'static str {
        "athena"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings::from_lookup(|key| match key {
            "AWS_ACCESS_KEY_ID" => Some("AKID".to_string()),
            "AWS_SECRET_ACCESS_KEY" => Some("secret".to_string()),
            "REGION_NAME" => Some("eu-central-1".to_string()),
            _ => None,
        })
    }

    #[test]
    fn test_default_endpoint_follows_region() {
        let service = AthenaQueryService::new(&settings(), None).unwrap();
        assert_eq!(service.endpoint(), "https://athena.eu-central-1.amazonaws.com/");
        assert_eq!(service.host, "athena.eu-central-1.amazonaws.com");
    }

    #[test]
    fn test_endpoint_override_keeps_port() {
        let service = AthenaQueryService::new(&settings(), Some("http://localhost:4566/")).unwrap();
        assert_eq!(service.host, "localhost:4566");
    }

    #[test]
    fn test_invalid_endpoint() {
        let err = AthenaQueryService::new(&settings(), Some("not a url"))
            .err()
            .unwrap();
        assert!(matches!(err, QueryServiceError::Configuration { .. }));
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_before_sending() {
        let service = AthenaQueryService::new(&Settings::from_lookup(|_| None), None).unwrap();
        assert!(!service.health_check().await.unwrap());

        let err = service
            .submit(&SubmitRequest {
                query: "SELECT 1".to_string(),
                database: "db".to_string(),
                output_location: "s3://bucket/".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, QueryServiceError::Configuration { .. }));
        assert_eq!(err.context().operation.as_deref(), Some("submit"));
    }

    #[tokio::test]
    async fn test_truncated_response_body_is_transport_error() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.ends_with(b"}") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            // Promise 100 bytes, send a few, then hang up.
            socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\nContent-Type: application/x-amz-json-1.1\r\n\
                      Content-Length: 100\r\n\r\n{\"ResultSet\"",
                )
                .await
                .unwrap();
        });

        let endpoint = format!("http://{}/", addr);
        let service = AthenaQueryService::new(&settings(), Some(&endpoint)).unwrap();
        let err = service
            .fetch(&ExecutionHandle::new("923e6aed"))
            .await
            .unwrap_err();

        assert_eq!(err.context().operation.as_deref(), Some("fetch"));
        assert!(!err.to_string().contains("Failed to parse"), "{err}");
    }

    #[test]
    fn test_start_request_body() {
        let input = StartQueryExecutionInput {
            query_string: "SELECT 1",
            query_execution_context: QueryExecutionContext { database: "db" },
            result_configuration: ResultConfiguration {
                output_location: "s3://bucket/out/",
            },
            client_request_token: "token".to_string(),
        };
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["QueryString"], "SELECT 1");
        assert_eq!(json["QueryExecutionContext"]["Database"], "db");
        assert_eq!(json["ResultConfiguration"]["OutputLocation"], "s3://bucket/out/");
        assert_eq!(json["ClientRequestToken"], "token");
    }

    #[test]
    fn test_service_error_parsing() {
        let body = r#"{"__type":"com.amazonaws.athena#InvalidRequestException","Message":"Query has not yet finished"}"#;
        let err = service_error(400, body, ErrorContext::new("fetch"));
        assert_eq!(
            err.to_string(),
            "Service error: Query has not yet finished \
             [operation=fetch, status=400, details=InvalidRequestException]"
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_service_error_retryable_cases() {
        let throttled = service_error(
            400,
            r#"{"__type":"ThrottlingException","message":"slow down"}"#,
            ErrorContext::new("submit"),
        );
        assert!(throttled.is_retryable());

        let unavailable = service_error(503, "Service Unavailable", ErrorContext::new("submit"));
        assert!(unavailable.is_retryable());
        assert!(unavailable.to_string().contains("Service Unavailable"));
    }
}
