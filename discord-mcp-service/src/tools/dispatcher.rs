//! Tool dispatch boundary.
//!
//! Every outcome, including failures, comes back as a [`ToolOutput`]; nothing
//! raised by a tool escapes to the protocol layer.

use std::sync::Arc;

use tracing::{info, warn};

use super::call::ToolCall;
use super::registry::{McpToolDefinition, REGISTRY};
use crate::context::AppContext;
use crate::error::DispatchError;

/// Text result of a tool call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub text: String,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(err: &DispatchError) -> Self {
        Self {
            text: format!("Error: {err}"),
            is_error: true,
        }
    }
}

#[derive(Clone)]
pub struct ToolDispatcher {
    ctx: Arc<AppContext>,
}

impl ToolDispatcher {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }

    pub fn list_tools(&self) -> Vec<McpToolDefinition> {
        REGISTRY.mcp_definitions()
    }

    pub async fn call(&self, name: &str, args: &serde_json::Value) -> ToolOutput {
        let category = REGISTRY.get_by_str(name).map_or("unknown", |t| t.category);
        match self.try_call(name, args).await {
            Ok(text) => {
                info!(tool = %name, category, "Tool call succeeded");
                ToolOutput::success(text)
            }
            Err(e) => {
                warn!(tool = %name, category, error = %e, "Tool call failed");
                ToolOutput::error(&e)
            }
        }
    }

    async fn try_call(&self, name: &str, args: &serde_json::Value) -> Result<String, DispatchError> {
        // Readiness is checked before anything else, including the tool name
        if !self.ctx.upstream.is_ready() {
            return Err(DispatchError::NotReady);
        }

        let call = ToolCall::parse(name, args)?;
        call.execute(self.ctx.platform.as_ref()).await
    }
}
