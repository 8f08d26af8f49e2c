//! MCP method handlers.

use serde::Deserialize;
use serde_json::json;

use crate::error::McpError;
use crate::tools::ToolDispatcher;

const PROTOCOL_VERSION: &str = "2024-11-05";

#[derive(Debug, Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

pub fn handle_initialize() -> Result<serde_json::Value, McpError> {
    Ok(json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": { "listChanged": false }
        },
        "serverInfo": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION")
        }
    }))
}

pub fn handle_ping() -> Result<serde_json::Value, McpError> {
    Ok(json!({}))
}

pub fn handle_tools_list(dispatcher: &ToolDispatcher) -> Result<serde_json::Value, McpError> {
    Ok(json!({ "tools": dispatcher.list_tools() }))
}

/// Run a tool. Tool failures are reported in the result, not as a JSON-RPC error.
pub async fn handle_tool_call(
    dispatcher: &ToolDispatcher,
    params: Option<serde_json::Value>,
) -> Result<serde_json::Value, McpError> {
    let params = params.ok_or_else(|| McpError::invalid_params("Missing params"))?;
    let params: ToolCallParams = serde_json::from_value(params)
        .map_err(|e| McpError::invalid_params(format!("Invalid params: {e}")))?;

    let output = dispatcher.call(&params.name, &params.arguments).await;

    Ok(json!({
        "content": [{ "type": "text", "text": output.text }],
        "isError": output.is_error
    }))
}
