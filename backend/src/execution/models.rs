//! Wire types exchanged with the query service.
//!
//! Field names follow the service's JSON protocol (`ResultSet.Rows[].Data[].VarCharValue`)
//! so a fetched result can be persisted verbatim.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a submitted query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionHandle(String);

impl ExecutionHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExecutionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything needed to start one execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRequest {
    pub query: String,
    pub database: String,
    pub output_location: String,
}

/// Raw result of a fetch, as returned by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryResults {
    #[serde(default)]
    pub result_set: ResultSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_count: Option<i64>,
    /// Response fields not modeled above, kept so the stored result matches
    /// what the service sent.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResultSet {
    #[serde(default)]
    pub rows: Vec<ResultRow>,
    /// Column metadata is kept untyped; only the row cells are interpreted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_set_metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResultRow {
    #[serde(default)]
    pub data: Vec<Datum>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Datum {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub var_char_value: Option<String>,
}

impl ResultRow {
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self {
            data: values
                .into_iter()
                .map(|v| Datum {
                    var_char_value: v.map(Into::into),
                })
                .collect(),
        }
    }

    pub fn values(&self) -> impl Iterator<Item = Option<&str>> {
        self.data.iter().map(|d| d.var_char_value.as_deref())
    }
}

impl QueryResults {
    /// Build a result from plain rows; the first row is the header.
    pub fn from_rows<R, I, S>(rows: R) -> Self
    where
        R: IntoIterator<Item = I>,
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self {
            result_set: ResultSet {
                rows: rows.into_iter().map(ResultRow::from_values).collect(),
                result_set_metadata: None,
            },
            next_token: None,
            update_count: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.result_set.rows
    }
}
