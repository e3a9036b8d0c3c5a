//! JSON-RPC 2.0 message types for the ChainGuard protocol.

use chainguard_core::QueryError;
use chainguard_graph::IdMode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error codes used on the wire.
pub mod codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
    /// The requested entity is unknown.
    pub const NOT_FOUND: i32 = -32001;
}

/// An incoming request.
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    pub id: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

/// An outgoing response. Exactly one of `result` and `error` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    pub id: Option<Value>,
}

impl Response {
    pub fn success<T: Serialize>(id: Option<Value>, result: T) -> Self {
        match serde_json::to_value(result) {
            Ok(value) => Self {
                jsonrpc: "2.0".to_string(),
                result: Some(value),
                error: None,
                id,
            },
            Err(e) => Self::error(id, codes::INTERNAL_ERROR, e.to_string()),
        }
    }

    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
            }),
            id,
        }
    }

    pub fn parse_error() -> Self {
        Self::error(None, codes::PARSE_ERROR, "Parse error")
    }

    pub fn invalid_request(id: Option<Value>, message: impl Into<String>) -> Self {
        Self::error(id, codes::INVALID_REQUEST, message)
    }

    pub fn invalid_params(id: Option<Value>, message: impl Into<String>) -> Self {
        Self::error(id, codes::INVALID_PARAMS, message)
    }

    pub fn method_not_found(id: Option<Value>, method: &str) -> Self {
        Self::error(
            id,
            codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", method),
        )
    }

    /// Maps a query failure onto its wire code.
    pub fn from_query_error(id: Option<Value>, err: QueryError) -> Self {
        match err {
            QueryError::NotFound(_) => Self::error(id, codes::NOT_FOUND, err.to_string()),
            QueryError::InvalidInput(_) => Self::invalid_params(id, err.to_string()),
        }
    }
}

fn default_limit() -> usize {
    10
}

fn default_depth() -> usize {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct LookupParams {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchParams {
    pub ids: Vec<String>,
    #[serde(default)]
    pub mode: IdMode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopParams {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphParams {
    pub id: String,
    #[serde(default = "default_depth")]
    pub depth: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportParams {
    pub id: String,
}
