//! Tool handlers for the MCP server.

use crate::processing::ProcessingError;
use rmcp::{ErrorData as McpError, model::JsonObject};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

pub mod documents;
pub mod metrics;
pub mod query;
pub mod summary;

/// Parse structured arguments supplied to a tool invocation.
pub(crate) fn parse_arguments<T: DeserializeOwned>(
    arguments: Option<JsonObject>,
) -> Result<T, McpError> {
    let value = arguments
        .map(Value::Object)
        .unwrap_or_else(|| Value::Object(JsonObject::new()));
    parse_arguments_value(value)
}

/// Deserialize arguments represented as a JSON value into the target type.
pub(crate) fn parse_arguments_value<T: DeserializeOwned>(value: Value) -> Result<T, McpError> {
    serde_json::from_value(value)
        .map_err(|err| McpError::invalid_params(format!("Invalid arguments: {err}"), None))
}

/// Map pipeline failures onto MCP errors, keeping the kind in the error data.
pub(crate) fn map_processing_error(error: ProcessingError) -> McpError {
    let kind = error.kind();
    let data = Some(json!({ "kind": kind.as_str() }));
    if kind.is_client_error() {
        McpError::invalid_params(error.to_string(), data)
    } else {
        tracing::warn!(error = %error, kind = kind.as_str(), "MCP tool failed");
        McpError::internal_error(error.to_string(), data)
    }
}
