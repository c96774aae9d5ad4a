//! Block-size validation.
//!
//! Block sizes may arrive from typed callers, JSON payloads or TOML files. Only
//! a genuine integer inside the distance domain is accepted; textual numbers
//! such as `"10"` are rejected even though they would parse.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ranges::DistanceDomain;

/// A block size as supplied by a caller, before validation.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockSizeInput {
    Integer(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    Missing,
}

impl fmt::Display for BlockSizeInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Text(v) => write!(f, "{:?}", v),
            Self::Bool(v) => write!(f, "{}", v),
            Self::Missing => f.write_str("None"),
        }
    }
}

impl BlockSizeInput {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Integer(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "str",
            Self::Bool(_) => "bool",
            Self::Missing => "none",
        }
    }
}

impl From<i64> for BlockSizeInput {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for BlockSizeInput {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<f64> for BlockSizeInput {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for BlockSizeInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for BlockSizeInput {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<BlockSizeInput>> From<Option<T>> for BlockSizeInput {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Missing, Into::into)
    }
}

impl From<&serde_json::Value> for BlockSizeInput {
    fn from(value: &serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Self::Text(s.clone()),
            Value::Bool(b) => Self::Bool(*b),
            Value::Null => Self::Missing,
            other => Self::Text(other.to_string()),
        }
    }
}

impl From<&toml::Value> for BlockSizeInput {
    fn from(value: &toml::Value) -> Self {
        match value {
            toml::Value::Integer(i) => Self::Integer(*i),
            toml::Value::Float(f) => Self::Float(*f),
            toml::Value::String(s) => Self::Text(s.clone()),
            toml::Value::Boolean(b) => Self::Bool(*b),
            other => Self::Text(other.to_string()),
        }
    }
}

/// A block size known to lie inside its domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockSize(i64);

impl BlockSize {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for BlockSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Checks block sizes against the distance domain.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryValidator {
    domain: DistanceDomain,
}

impl QueryValidator {
    pub fn new(domain: DistanceDomain) -> Self {
        Self { domain }
    }

    pub fn domain(&self) -> DistanceDomain {
        self.domain
    }

    /// Returns `true` when `input` is an integer within the domain. Failures
    /// are logged, never raised.
    pub fn validate(&self, input: &BlockSizeInput) -> bool {
        self.check(input).is_some()
    }

    /// Validate and convert in one step.
    pub fn check(&self, input: &BlockSizeInput) -> Option<BlockSize> {
        let BlockSizeInput::Integer(value) = input else {
            log::error!(
                "block_size: {} should be of type int, got {}",
                input,
                input.type_name()
            );
            return None;
        };

        if !self.domain.contains(*value) {
            log::error!(
                "block_size: {} is out of range, should be between {} and {}",
                value,
                self.domain.lower,
                self.domain.upper
            );
            return None;
        }

        Some(BlockSize(*value))
    }
}
