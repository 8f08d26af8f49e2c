//! Role management tool definitions.

use std::collections::HashMap;

use crate::tools::registry::{ToolMetadata, ToolName};

pub fn register(registry: &mut HashMap<ToolName, ToolMetadata>) {
    for tool in [add_role(), remove_role()] {
        registry.insert(tool.name, tool);
    }
}

fn add_role() -> ToolMetadata {
    ToolMetadata {
        name: ToolName::AddRole,
        description: "Add a role to a user",
        category: "roles",
        parameters: || {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "server_id": {
                        "type": "string",
                        "description": "Discord server ID"
                    },
                    "user_id": {
                        "type": "string",
                        "description": "User to add role to"
                    },
                    "role_id": {
                        "type": "string",
                        "description": "Role ID to add"
                    }
                },
                "required": ["server_id", "user_id", "role_id"]
            })
        },
    }
}

fn remove_role() -> ToolMetadata {
    ToolMetadata {
        name: ToolName::RemoveRole,
        description: "Remove a role from a user",
        category: "roles",
        parameters: || {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "server_id": {
                        "type": "string",
                        "description": "Discord server ID"
                    },
                    "user_id": {
                        "type": "string",
                        "description": "User to remove role from"
                    },
                    "role_id": {
                        "type": "string",
                        "description": "Role ID to remove"
                    }
                },
                "required": ["server_id", "user_id", "role_id"]
            })
        },
    }
}
