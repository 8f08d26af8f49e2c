//! MCP server over stdio.
//!
//! One JSON-RPC 2.0 message per line on stdin, one response per line on
//! stdout. Requests are handled strictly in arrival order.

mod handlers;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::McpError;
use crate::tools::ToolDispatcher;

#[derive(Debug, Deserialize)]
struct McpRequest {
    jsonrpc: String,
    /// Absent for notifications
    #[serde(default)]
    id: Option<serde_json::Value>,
    method: String,
    #[serde(default)]
    params: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct McpResponse {
    jsonrpc: String,
    id: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<McpError>,
}

impl McpResponse {
    fn new(id: serde_json::Value, result: Result<serde_json::Value, McpError>) -> Self {
        match result {
            Ok(data) => Self {
                jsonrpc: "2.0".to_string(),
                id,
                result: Some(data),
                error: None,
            },
            Err(error) => Self {
                jsonrpc: "2.0".to_string(),
                id,
                result: None,
                error: Some(error),
            },
        }
    }
}

pub struct McpServer {
    dispatcher: ToolDispatcher,
}

impl McpServer {
    pub fn new(dispatcher: ToolDispatcher) -> Self {
        Self { dispatcher }
    }

    /// Serve requests until EOF on `reader` or cancellation.
    pub async fn serve<R, W>(
        &self,
        reader: R,
        mut writer: W,
        cancel: CancellationToken,
    ) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();

        loop {
            let line = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("MCP server cancelled");
                    break;
                }
                line = lines.next_line() => line?,
            };

            let Some(line) = line else {
                info!("MCP input closed");
                break;
            };

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(response) = self.handle_line(line).await {
                let mut out = serde_json::to_vec(&response)?;
                out.push(b'\n');
                writer.write_all(&out).await?;
                writer.flush().await?;
            }
        }

        Ok(())
    }

    /// Handle a single line, returning the response to write, if any
    async fn handle_line(&self, line: &str) -> Option<McpResponse> {
        let value: serde_json::Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Malformed MCP message");
                return Some(McpResponse::new(
                    serde_json::Value::Null,
                    Err(McpError::parse_error(&e)),
                ));
            }
        };

        let request: McpRequest = match serde_json::from_value(value.clone()) {
            Ok(request) => request,
            Err(e) => {
                let id = value.get("id").cloned().unwrap_or(serde_json::Value::Null);
                return Some(McpResponse::new(
                    id,
                    Err(McpError::invalid_request(format!("Invalid request: {e}"))),
                ));
            }
        };

        if request.jsonrpc != "2.0" {
            return Some(McpResponse::new(
                request.id.unwrap_or(serde_json::Value::Null),
                Err(McpError::invalid_request(format!(
                    "Unsupported jsonrpc version: {}",
                    request.jsonrpc
                ))),
            ));
        }

        let Some(id) = request.id else {
            debug!(method = %request.method, "MCP notification received");
            return None;
        };

        debug!(method = %request.method, "MCP request received");

        let result = match request.method.as_str() {
            "initialize" => handlers::handle_initialize(),
            "ping" => handlers::handle_ping(),
            "tools/list" => handlers::handle_tools_list(&self.dispatcher),
            "tools/call" => handlers::handle_tool_call(&self.dispatcher, request.params).await,
            _ => Err(McpError::method_not_found(&request.method)),
        };

        Some(McpResponse::new(id, result))
    }
}
