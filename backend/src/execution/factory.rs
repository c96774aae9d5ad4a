//! Query service factory.
//!
//! Picks the backend named in the report configuration and builds it from the
//! run settings.

use std::str::FromStr;
use std::sync::Arc;

use super::error::{QueryServiceError, QueryServiceResult};
use super::local::LocalQueryService;
use super::service::QueryService;
use crate::config::{ReportConfig, Settings};

/// Query service backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryServiceType {
    /// Remote Athena over HTTP
    Athena,
    /// In-memory stand-in
    Local,
}

impl FromStr for QueryServiceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "athena" | "aws" => Ok(Self::Athena),
            "local" | "memory" => Ok(Self::Local),
            _ => Err(format!("Unknown query service type: {}", s)),
        }
    }
}

pub struct QueryServiceFactory;

impl QueryServiceFactory {
    /// Create a service of the given type.
    ///
    /// `endpoint` overrides the regional endpoint of remote backends and is
    /// ignored by the local one.
    pub fn create(
        service_type: QueryServiceType,
        settings: &Settings,
        endpoint: Option<&str>,
    ) -> QueryServiceResult<Arc<dyn QueryService>> {
        match service_type {
            QueryServiceType::Athena => {
                #[cfg(feature = "athena")]
                {
                    let service = super::athena::AthenaQueryService::new(settings, endpoint)?;
                    Ok(Arc::new(service))
                }
                #[cfg(not(feature = "athena"))]
                {
                    let _ = (settings, endpoint);
                    Err(QueryServiceError::configuration(
                        "Athena query service feature not enabled",
                    ))
                }
            }
            QueryServiceType::Local => Ok(Self::create_local()),
        }
    }

    pub fn create_local() -> Arc<dyn QueryService> {
        Arc::new(LocalQueryService::new())
    }

    /// Create the service selected by `config.service`.
    pub fn from_config(
        config: &ReportConfig,
        settings: &Settings,
    ) -> QueryServiceResult<Arc<dyn QueryService>> {
        let service_type = QueryServiceType::from_str(&config.service.service_type)
            .map_err(|e| QueryServiceError::configuration(e))?;
        Self::create(service_type, settings, config.service.endpoint.as_deref())
    }
}
