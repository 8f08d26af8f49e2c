//! Tool catalogue exposed over MCP.
//!
//! Tool names are derived from enum variants via strum, so the name a client
//! sends, the catalogue entry and the executed handler cannot drift apart.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::LazyLock;

use serde::Serialize;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// All tool names.
///
/// Adding a tool requires a variant here, its metadata in `tool_defs`, and a
/// `ToolCall` variant (the parse and execute matches are exhaustive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum ToolName {
    // Messages
    SendMessage,
    ReadMessages,
    EditMessage,
    ModerateMessage,

    // Servers and users
    GetServerInfo,
    GetChannels,
    ListMembers,
    ListServers,
    GetUserInfo,

    // Roles
    AddRole,
    RemoveRole,

    // Channels
    CreateTextChannel,
    DeleteChannel,

    // Reactions
    AddReaction,
    AddMultipleReactions,
    RemoveReaction,
}

/// Metadata for a tool definition
#[derive(Debug, Clone)]
pub struct ToolMetadata {
    pub name: ToolName,

    pub description: &'static str,

    /// Grouping used in logs (e.g. "messages", "roles")
    pub category: &'static str,

    /// JSON Schema for the arguments (built lazily)
    pub parameters: fn() -> serde_json::Value,
}

pub struct ToolRegistry {
    tools: HashMap<ToolName, ToolMetadata>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        let mut tools = HashMap::new();
        super::tool_defs::register_all_tools(&mut tools);
        Self { tools }
    }

    /// MCP definitions in declaration order
    pub fn mcp_definitions(&self) -> Vec<McpToolDefinition> {
        ToolName::iter()
            .filter_map(|name| self.tools.get(&name))
            .map(|t| McpToolDefinition {
                name: t.name.to_string(),
                description: t.description.to_string(),
                input_schema: (t.parameters)(),
            })
            .collect()
    }

    #[cfg(test)]
    pub fn get(&self, name: ToolName) -> Option<&ToolMetadata> {
        self.tools.get(&name)
    }

    pub fn get_by_str(&self, name: &str) -> Option<&ToolMetadata> {
        ToolName::from_str(name)
            .ok()
            .and_then(|n| self.tools.get(&n))
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Global registry instance
pub static REGISTRY: LazyLock<ToolRegistry> = LazyLock::new(ToolRegistry::new);

/// Tool entry in a `tools/list` response
#[derive(Debug, Clone, Serialize)]
pub struct McpToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}
