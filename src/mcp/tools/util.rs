//! Shared plumbing for MCP tool handlers.

use rmcp::model::CallToolResult;
use serde::de::DeserializeOwned;

use crate::AppError;

/// Deserialize tool arguments into a typed input struct.
///
/// # Errors
///
/// Returns `rmcp::ErrorData::invalid_params` if the arguments do not
/// match the tool's contract.
pub fn parse_args<T: DeserializeOwned>(
    arguments: Option<serde_json::Map<String, serde_json::Value>>,
) -> Result<T, rmcp::ErrorData> {
    let args = arguments.unwrap_or_default();
    serde_json::from_value(serde_json::Value::Object(args))
        .map_err(|err| rmcp::ErrorData::invalid_params(format!("invalid parameters: {err}"), None))
}

/// Wrap a serializable payload as a successful JSON tool result.
///
/// # Errors
///
/// Returns `rmcp::ErrorData::internal_error` if serialization fails.
pub fn json_result(value: serde_json::Value) -> Result<CallToolResult, rmcp::ErrorData> {
    Ok(CallToolResult::success(vec![rmcp::model::Content::json(
        value,
    )
    .map_err(|err| {
        rmcp::ErrorData::internal_error(format!("failed to serialize response: {err}"), None)
    })?]))
}

/// Map a domain error onto the MCP error surface.
///
/// Caller mistakes (missing rows, invalid input, state conflicts) come
/// back as `invalid_params` so the calling agent can correct itself;
/// everything else is an internal error.
#[must_use]
pub fn map_err(err: AppError) -> rmcp::ErrorData {
    match err {
        AppError::NotFound(_) | AppError::Validation(_) | AppError::Conflict(_) => {
            rmcp::ErrorData::invalid_params(err.to_string(), None)
        }
        other => rmcp::ErrorData::internal_error(other.to_string(), None),
    }
}
