//! Server, channel listing and user lookup tool definitions.

use std::collections::HashMap;

use crate::tools::registry::{ToolMetadata, ToolName};

pub fn register(registry: &mut HashMap<ToolName, ToolMetadata>) {
    let tools = [
        get_server_info(),
        get_channels(),
        list_members(),
        list_servers(),
        get_user_info(),
    ];
    for tool in tools {
        registry.insert(tool.name, tool);
    }
}

fn server_id_only() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "server_id": {
                "type": "string",
                "description": "Discord server (guild) ID"
            }
        },
        "required": ["server_id"]
    })
}

fn get_server_info() -> ToolMetadata {
    ToolMetadata {
        name: ToolName::GetServerInfo,
        description: "Get information about a Discord server",
        category: "servers",
        parameters: server_id_only,
    }
}

fn get_channels() -> ToolMetadata {
    ToolMetadata {
        name: ToolName::GetChannels,
        description: "Get a list of all channels in a Discord server",
        category: "servers",
        parameters: server_id_only,
    }
}

fn list_members() -> ToolMetadata {
    ToolMetadata {
        name: ToolName::ListMembers,
        description: "Get a list of members in a server",
        category: "servers",
        parameters: || {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "server_id": {
                        "type": "string",
                        "description": "Discord server (guild) ID"
                    },
                    "limit": {
                        "type": "number",
                        "description": "Maximum number of members to fetch (default 100)",
                        "minimum": 1,
                        "maximum": 1000
                    }
                },
                "required": ["server_id"]
            })
        },
    }
}

fn list_servers() -> ToolMetadata {
    ToolMetadata {
        name: ToolName::ListServers,
        description: "Get a list of all Discord servers the bot has access to with their details such as name, id and member count.",
        category: "servers",
        parameters: || {
            serde_json::json!({
                "type": "object",
                "properties": {},
                "required": []
            })
        },
    }
}

fn get_user_info() -> ToolMetadata {
    ToolMetadata {
        name: ToolName::GetUserInfo,
        description: "Get information about a Discord user",
        category: "servers",
        parameters: || {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "user_id": {
                        "type": "string",
                        "description": "Discord user ID"
                    }
                },
                "required": ["user_id"]
            })
        },
    }
}
