use serde::Serialize;
use thiserror::Error;

use crate::discord::Snowflake;

/// Startup configuration errors. These are the only errors that abort the process.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required configuration value: {key}")]
    Missing { key: String },

    #[error("Invalid configuration value for {key}: {message}")]
    Invalid { key: String, message: String },

    #[error("Failed to build configuration")]
    Build(#[from] config::ConfigError),
}

/// Errors returned by the chat platform collaborator
#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Discord API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid response from Discord")]
    InvalidResponse(#[source] serde_json::Error),

    #[error("Gateway error: {message}")]
    Gateway { message: String },
}

impl PlatformError {
    pub fn is_forbidden(&self) -> bool {
        matches!(self, PlatformError::Forbidden { .. })
    }
}

/// Session registry errors
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("A session is already active in room {room_id}")]
    AlreadyActive { room_id: Snowflake },

    #[error("No active session in room {room_id}")]
    NoActiveSession { room_id: Snowflake },

    #[error("Failed to publish session status")]
    Publish(#[source] PlatformError),
}

/// Relay channel errors
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Relay client is not connected")]
    NotConnected,

    #[error("Relay connection {connection_id} is gone")]
    SendFailed { connection_id: uuid::Uuid },

    #[error("Failed to serialize relay message")]
    Serialize(#[from] serde_json::Error),
}

/// Tool dispatch errors.
///
/// Never propagated past the dispatcher; rendered into the tool result text.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Discord client not ready")]
    NotReady,

    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("{0}")]
    Platform(#[from] PlatformError),

    #[error("Added {} of {total} reactions ({}) before failing on {failed}: {source}", .added.len(), .added.join(", "))]
    PartialReactions {
        added: Vec<String>,
        failed: String,
        total: usize,
        #[source]
        source: PlatformError,
    },
}

/// JSON-RPC error object returned on the MCP stream
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{message} ({code})")]
pub struct McpError {
    pub code: i32,
    pub message: String,
}

impl McpError {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;

    pub fn parse_error(err: &serde_json::Error) -> Self {
        Self {
            code: Self::PARSE_ERROR,
            message: format!("Parse error: {err}"),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            code: Self::INVALID_REQUEST,
            message: message.into(),
        }
    }

    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: Self::METHOD_NOT_FOUND,
            message: format!("Method not found: {method}"),
        }
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            code: Self::INVALID_PARAMS,
            message: message.into(),
        }
    }
}

pub type PlatformResult<T> = Result<T, PlatformError>;
