//! Message tool definitions.

use std::collections::HashMap;

use crate::tools::registry::{ToolMetadata, ToolName};

pub fn register(registry: &mut HashMap<ToolName, ToolMetadata>) {
    let tools = [
        send_message(),
        read_messages(),
        edit_message(),
        moderate_message(),
    ];
    for tool in tools {
        registry.insert(tool.name, tool);
    }
}

fn send_message() -> ToolMetadata {
    ToolMetadata {
        name: ToolName::SendMessage,
        description: "Send a message to a specific channel",
        category: "messages",
        parameters: || {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "channel_id": {
                        "type": "string",
                        "description": "Discord channel ID"
                    },
                    "content": {
                        "type": "string",
                        "description": "Message content"
                    }
                },
                "required": ["channel_id", "content"]
            })
        },
    }
}

fn read_messages() -> ToolMetadata {
    ToolMetadata {
        name: ToolName::ReadMessages,
        description: "Read recent messages from a channel",
        category: "messages",
        parameters: || {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "channel_id": {
                        "type": "string",
                        "description": "Discord channel ID"
                    },
                    "limit": {
                        "type": "number",
                        "description": "Number of messages to fetch (max 100, default 10)",
                        "minimum": 1,
                        "maximum": 100
                    }
                },
                "required": ["channel_id"]
            })
        },
    }
}

fn edit_message() -> ToolMetadata {
    ToolMetadata {
        name: ToolName::EditMessage,
        description: "Edit an existing message in a Discord channel.",
        category: "messages",
        parameters: || {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "channel_id": {
                        "type": "string",
                        "description": "ID of the channel containing the message"
                    },
                    "message_id": {
                        "type": "string",
                        "description": "ID of the message to edit"
                    },
                    "content": {
                        "type": "string",
                        "description": "New content for the message"
                    }
                },
                "required": ["channel_id", "message_id", "content"]
            })
        },
    }
}

fn moderate_message() -> ToolMetadata {
    ToolMetadata {
        name: ToolName::ModerateMessage,
        description: "Delete a message and optionally timeout the user",
        category: "messages",
        parameters: || {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "channel_id": {
                        "type": "string",
                        "description": "Channel ID containing the message"
                    },
                    "message_id": {
                        "type": "string",
                        "description": "ID of message to moderate"
                    },
                    "reason": {
                        "type": "string",
                        "description": "Reason for moderation"
                    },
                    "timeout_minutes": {
                        "type": "number",
                        "description": "Optional timeout duration in minutes (max 4 weeks)",
                        "minimum": 0,
                        "maximum": 40320
                    }
                },
                "required": ["channel_id", "message_id", "reason"]
            })
        },
    }
}
