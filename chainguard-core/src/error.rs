//! Error types shared across ChainGuard crates.
//!
//! Two families: `QueryError` is a normal, per-request negative outcome;
//! `ConfigError` is fatal and stops the process before it serves traffic.

use std::path::PathBuf;
use thiserror::Error;

/// Recoverable errors surfaced to callers of the query layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The requested identifier is unknown to the dataset.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request was malformed and rejected before any index access.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl QueryError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn invalid(what: impl Into<String>) -> Self {
        Self::InvalidInput(what.into())
    }
}

/// Startup failures. None of these are recoverable at request time.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Dataset {dataset} is missing required column '{field}'")]
    MissingField {
        dataset: &'static str,
        field: &'static str,
    },

    #[error("Row count mismatch: {expected} risk records but {actual} identifier pairs")]
    RowCountMismatch { expected: usize, actual: usize },

    #[error("Identifier hash collision between ids {first} and {second}")]
    IdentifierCollision { first: i64, second: i64 },

    #[error("No pseudonymisation salt configured")]
    MissingSalt,

    #[error("Invalid row at line {line} in {dataset}: {reason}")]
    InvalidRow {
        dataset: &'static str,
        line: u64,
        reason: String,
    },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ConfigError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_do_not_leak_structure() {
        let err = QueryError::not_found("public id abc123");
        assert_eq!(err.to_string(), "Not found: public id abc123");

        let err = ConfigError::MissingField {
            dataset: "risk",
            field: "risk_score",
        };
        assert!(err.to_string().contains("risk_score"));
    }
}
