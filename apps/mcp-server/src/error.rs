//! # Tool Errors
//!
//! A failed tool call is still a successful JSON-RPC response: the error is
//! rendered as text content and flagged with `isError`.
//!
//! ```json
//! {
//!   "error": "Query rejected: stacked statements are not allowed",
//!   "tool": "execute_custom_query",
//!   "timestamp": "2024-06-15T12:00:00+00:00"
//! }
//! ```

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use thiserror::Error;
use ventas_core::{CoreError, ErrorClass};
use ventas_db::ServiceError;

#[derive(Debug, Error)]
pub enum ToolError {
    /// No tool with this name.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Arguments did not match the tool's input schema.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The underlying report failed.
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl ToolError {
    /// Caller-facing message. Store failures keep their detail out.
    pub fn message(&self) -> String {
        match self {
            ToolError::Service(err) if err.class() == ErrorClass::Internal => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn payload(&self, tool: &str, at: DateTime<Utc>) -> Value {
        json!({
            "error": self.message(),
            "tool": tool,
            "timestamp": at.to_rfc3339(),
        })
    }
}

impl From<CoreError> for ToolError {
    fn from(err: CoreError) -> Self {
        ToolError::Service(err.into())
    }
}

impl From<ventas_core::ValidationError> for ToolError {
    fn from(err: ventas_core::ValidationError) -> Self {
        ToolError::Service(err.into())
    }
}

impl From<ventas_db::DbError> for ToolError {
    fn from(err: ventas_db::DbError) -> Self {
        ToolError::Service(err.into())
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        ToolError::InvalidArguments(err.to_string())
    }
}
