//! Reaction tool definitions.

use std::collections::HashMap;

use crate::tools::registry::{ToolMetadata, ToolName};

pub fn register(registry: &mut HashMap<ToolName, ToolMetadata>) {
    let tools = [add_reaction(), add_multiple_reactions(), remove_reaction()];
    for tool in tools {
        registry.insert(tool.name, tool);
    }
}

fn add_reaction() -> ToolMetadata {
    ToolMetadata {
        name: ToolName::AddReaction,
        description: "Add a reaction to a message",
        category: "reactions",
        parameters: || {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "channel_id": {
                        "type": "string",
                        "description": "Channel containing the message"
                    },
                    "message_id": {
                        "type": "string",
                        "description": "Message to react to"
                    },
                    "emoji": {
                        "type": "string",
                        "description": "Emoji to react with (Unicode or name:id for custom emoji)"
                    }
                },
                "required": ["channel_id", "message_id", "emoji"]
            })
        },
    }
}

fn add_multiple_reactions() -> ToolMetadata {
    ToolMetadata {
        name: ToolName::AddMultipleReactions,
        description: "Add multiple reactions to a message, in order",
        category: "reactions",
        parameters: || {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "channel_id": {
                        "type": "string",
                        "description": "Channel containing the message"
                    },
                    "message_id": {
                        "type": "string",
                        "description": "Message to react to"
                    },
                    "emojis": {
                        "type": "array",
                        "items": {
                            "type": "string",
                            "description": "Emoji to react with (Unicode or name:id for custom emoji)"
                        },
                        "description": "List of emojis to add as reactions"
                    }
                },
                "required": ["channel_id", "message_id", "emojis"]
            })
        },
    }
}

fn remove_reaction() -> ToolMetadata {
    ToolMetadata {
        name: ToolName::RemoveReaction,
        description: "Remove the bot's own reaction from a message",
        category: "reactions",
        parameters: || {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "channel_id": {
                        "type": "string",
                        "description": "Channel containing the message"
                    },
                    "message_id": {
                        "type": "string",
                        "description": "Message to remove reaction from"
                    },
                    "emoji": {
                        "type": "string",
                        "description": "Emoji to remove (Unicode or name:id for custom emoji)"
                    }
                },
                "required": ["channel_id", "message_id", "emoji"]
            })
        },
    }
}
