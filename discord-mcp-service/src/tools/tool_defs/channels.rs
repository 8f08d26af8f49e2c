//! Channel management tool definitions.

use std::collections::HashMap;

use crate::tools::registry::{ToolMetadata, ToolName};

pub fn register(registry: &mut HashMap<ToolName, ToolMetadata>) {
    for tool in [create_text_channel(), delete_channel()] {
        registry.insert(tool.name, tool);
    }
}

fn create_text_channel() -> ToolMetadata {
    ToolMetadata {
        name: ToolName::CreateTextChannel,
        description: "Create a new text channel",
        category: "channels",
        parameters: || {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "server_id": {
                        "type": "string",
                        "description": "Discord server ID"
                    },
                    "name": {
                        "type": "string",
                        "description": "Channel name"
                    },
                    "category_id": {
                        "type": "string",
                        "description": "Optional category ID to place channel in"
                    },
                    "topic": {
                        "type": "string",
                        "description": "Optional channel topic"
                    }
                },
                "required": ["server_id", "name"]
            })
        },
    }
}

fn delete_channel() -> ToolMetadata {
    ToolMetadata {
        name: ToolName::DeleteChannel,
        description: "Delete a channel",
        category: "channels",
        parameters: || {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "channel_id": {
                        "type": "string",
                        "description": "ID of channel to delete"
                    },
                    "reason": {
                        "type": "string",
                        "description": "Reason for deletion"
                    }
                },
                "required": ["channel_id"]
            })
        },
    }
}
