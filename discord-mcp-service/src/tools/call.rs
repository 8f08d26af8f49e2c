//! Typed tool invocations.
//!
//! Raw MCP arguments are deserialized into one struct per tool and checked
//! against the declared bounds before anything touches Discord.

use std::str::FromStr;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::registry::ToolName;
use crate::discord::Snowflake;
use crate::error::DispatchError;

const DEFAULT_READ_LIMIT: u64 = 10;
const MAX_READ_LIMIT: u64 = 100;
const DEFAULT_MEMBER_LIMIT: u64 = 100;
const MAX_MEMBER_LIMIT: u64 = 1000;
/// Four weeks, the longest timeout Discord allows
const MAX_TIMEOUT_MINUTES: u64 = 40_320;

pub(crate) const ROLE_ADDED_REASON: &str = "Role added via MCP";
pub(crate) const ROLE_REMOVED_REASON: &str = "Role removed via MCP";
pub(crate) const CHANNEL_CREATED_REASON: &str = "Channel created via MCP";
const CHANNEL_DELETED_REASON: &str = "Channel deleted via MCP";

#[derive(Debug, Deserialize)]
struct ServerArgs {
    server_id: Snowflake,
}

#[derive(Debug, Deserialize)]
struct SendMessageArgs {
    channel_id: Snowflake,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ReadMessagesArgs {
    channel_id: Snowflake,
    #[serde(default)]
    limit: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct EditMessageArgs {
    channel_id: Snowflake,
    message_id: Snowflake,
    content: String,
}

#[derive(Debug, Deserialize)]
struct UserArgs {
    user_id: Snowflake,
}

#[derive(Debug, Deserialize)]
struct ModerateMessageArgs {
    channel_id: Snowflake,
    message_id: Snowflake,
    reason: String,
    #[serde(default)]
    timeout_minutes: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ListMembersArgs {
    server_id: Snowflake,
    #[serde(default)]
    limit: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RoleArgs {
    server_id: Snowflake,
    user_id: Snowflake,
    role_id: Snowflake,
}

#[derive(Debug, Deserialize)]
struct CreateTextChannelArgs {
    server_id: Snowflake,
    name: String,
    #[serde(default)]
    category_id: Option<Snowflake>,
    #[serde(default)]
    topic: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeleteChannelArgs {
    channel_id: Snowflake,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReactionArgs {
    channel_id: Snowflake,
    message_id: Snowflake,
    emoji: String,
}

#[derive(Debug, Deserialize)]
struct MultipleReactionsArgs {
    channel_id: Snowflake,
    message_id: Snowflake,
    emojis: Vec<String>,
}

/// A validated tool invocation, one variant per catalogue entry
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    SendMessage {
        channel_id: Snowflake,
        content: String,
    },
    ReadMessages {
        channel_id: Snowflake,
        limit: u8,
    },
    EditMessage {
        channel_id: Snowflake,
        message_id: Snowflake,
        content: String,
    },
    ModerateMessage {
        channel_id: Snowflake,
        message_id: Snowflake,
        reason: String,
        timeout_minutes: u32,
    },
    GetServerInfo {
        server_id: Snowflake,
    },
    GetChannels {
        server_id: Snowflake,
    },
    ListMembers {
        server_id: Snowflake,
        limit: u16,
    },
    ListServers,
    GetUserInfo {
        user_id: Snowflake,
    },
    AddRole {
        server_id: Snowflake,
        user_id: Snowflake,
        role_id: Snowflake,
    },
    RemoveRole {
        server_id: Snowflake,
        user_id: Snowflake,
        role_id: Snowflake,
    },
    CreateTextChannel {
        server_id: Snowflake,
        name: String,
        category_id: Option<Snowflake>,
        topic: Option<String>,
    },
    DeleteChannel {
        channel_id: Snowflake,
        reason: String,
    },
    AddReaction {
        channel_id: Snowflake,
        message_id: Snowflake,
        emoji: String,
    },
    AddMultipleReactions {
        channel_id: Snowflake,
        message_id: Snowflake,
        emojis: Vec<String>,
    },
    RemoveReaction {
        channel_id: Snowflake,
        message_id: Snowflake,
        emoji: String,
    },
}

impl ToolCall {
    /// Resolve a tool name and validate its arguments
    pub fn parse(name: &str, args: &serde_json::Value) -> Result<Self, DispatchError> {
        let tool = ToolName::from_str(name).map_err(|_| DispatchError::UnknownTool {
            name: name.to_string(),
        })?;
        Self::from_args(tool, args)
    }

    pub fn from_args(tool: ToolName, args: &serde_json::Value) -> Result<Self, DispatchError> {
        let call = match tool {
            ToolName::SendMessage => {
                let a: SendMessageArgs = decode(tool, args)?;
                ToolCall::SendMessage {
                    channel_id: a.channel_id,
                    content: a.content,
                }
            }
            ToolName::ReadMessages => {
                let a: ReadMessagesArgs = decode(tool, args)?;
                let limit = bounded(tool, "limit", a.limit, DEFAULT_READ_LIMIT, 1, MAX_READ_LIMIT)?;
                ToolCall::ReadMessages {
                    channel_id: a.channel_id,
                    limit: limit as u8,
                }
            }
            ToolName::EditMessage => {
                let a: EditMessageArgs = decode(tool, args)?;
                ToolCall::EditMessage {
                    channel_id: a.channel_id,
                    message_id: a.message_id,
                    content: a.content,
                }
            }
            ToolName::ModerateMessage => {
                let a: ModerateMessageArgs = decode(tool, args)?;
                let minutes = bounded(
                    tool,
                    "timeout_minutes",
                    a.timeout_minutes,
                    0,
                    0,
                    MAX_TIMEOUT_MINUTES,
                )?;
                ToolCall::ModerateMessage {
                    channel_id: a.channel_id,
                    message_id: a.message_id,
                    reason: a.reason,
                    timeout_minutes: minutes as u32,
                }
            }
            ToolName::GetServerInfo => {
                let a: ServerArgs = decode(tool, args)?;
                ToolCall::GetServerInfo {
                    server_id: a.server_id,
                }
            }
            ToolName::GetChannels => {
                let a: ServerArgs = decode(tool, args)?;
                ToolCall::GetChannels {
                    server_id: a.server_id,
                }
            }
            ToolName::ListMembers => {
                let a: ListMembersArgs = decode(tool, args)?;
                let limit = bounded(
                    tool,
                    "limit",
                    a.limit,
                    DEFAULT_MEMBER_LIMIT,
                    1,
                    MAX_MEMBER_LIMIT,
                )?;
                ToolCall::ListMembers {
                    server_id: a.server_id,
                    limit: limit as u16,
                }
            }
            ToolName::ListServers => ToolCall::ListServers,
            ToolName::GetUserInfo => {
                let a: UserArgs = decode(tool, args)?;
                ToolCall::GetUserInfo { user_id: a.user_id }
            }
            ToolName::AddRole => {
                let a: RoleArgs = decode(tool, args)?;
                ToolCall::AddRole {
                    server_id: a.server_id,
                    user_id: a.user_id,
                    role_id: a.role_id,
                }
            }
            ToolName::RemoveRole => {
                let a: RoleArgs = decode(tool, args)?;
                ToolCall::RemoveRole {
                    server_id: a.server_id,
                    user_id: a.user_id,
                    role_id: a.role_id,
                }
            }
            ToolName::CreateTextChannel => {
                let a: CreateTextChannelArgs = decode(tool, args)?;
                let name = a.name.trim().to_string();
                if name.is_empty() {
                    return Err(invalid(tool, "name must not be empty"));
                }
                ToolCall::CreateTextChannel {
                    server_id: a.server_id,
                    name,
                    category_id: a.category_id,
                    topic: a.topic.filter(|t| !t.is_empty()),
                }
            }
            ToolName::DeleteChannel => {
                let a: DeleteChannelArgs = decode(tool, args)?;
                ToolCall::DeleteChannel {
                    channel_id: a.channel_id,
                    reason: a
                        .reason
                        .filter(|r| !r.is_empty())
                        .unwrap_or_else(|| CHANNEL_DELETED_REASON.to_string()),
                }
            }
            ToolName::AddReaction => {
                let a: ReactionArgs = decode(tool, args)?;
                ToolCall::AddReaction {
                    channel_id: a.channel_id,
                    message_id: a.message_id,
                    emoji: non_empty_emoji(tool, a.emoji)?,
                }
            }
            ToolName::AddMultipleReactions => {
                let a: MultipleReactionsArgs = decode(tool, args)?;
                if a.emojis.is_empty() {
                    return Err(invalid(tool, "emojis must not be empty"));
                }
                let emojis = a
                    .emojis
                    .into_iter()
                    .map(|e| non_empty_emoji(tool, e))
                    .collect::<Result<Vec<_>, _>>()?;
                ToolCall::AddMultipleReactions {
                    channel_id: a.channel_id,
                    message_id: a.message_id,
                    emojis,
                }
            }
            ToolName::RemoveReaction => {
                let a: ReactionArgs = decode(tool, args)?;
                ToolCall::RemoveReaction {
                    channel_id: a.channel_id,
                    message_id: a.message_id,
                    emoji: non_empty_emoji(tool, a.emoji)?,
                }
            }
        };
        Ok(call)
    }

    pub fn name(&self) -> ToolName {
        match self {
            ToolCall::SendMessage { .. } => ToolName::SendMessage,
            ToolCall::ReadMessages { .. } => ToolName::ReadMessages,
            ToolCall::EditMessage { .. } => ToolName::EditMessage,
            ToolCall::ModerateMessage { .. } => ToolName::ModerateMessage,
            ToolCall::GetServerInfo { .. } => ToolName::GetServerInfo,
            ToolCall::GetChannels { .. } => ToolName::GetChannels,
            ToolCall::ListMembers { .. } => ToolName::ListMembers,
            ToolCall::ListServers => ToolName::ListServers,
            ToolCall::GetUserInfo { .. } => ToolName::GetUserInfo,
            ToolCall::AddRole { .. } => ToolName::AddRole,
            ToolCall::RemoveRole { .. } => ToolName::RemoveRole,
            ToolCall::CreateTextChannel { .. } => ToolName::CreateTextChannel,
            ToolCall::DeleteChannel { .. } => ToolName::DeleteChannel,
            ToolCall::AddReaction { .. } => ToolName::AddReaction,
            ToolCall::AddMultipleReactions { .. } => ToolName::AddMultipleReactions,
            ToolCall::RemoveReaction { .. } => ToolName::RemoveReaction,
        }
    }
}

fn invalid(tool: ToolName, message: impl Into<String>) -> DispatchError {
    DispatchError::InvalidArguments {
        tool: tool.to_string(),
        message: message.into(),
    }
}

fn decode<T: DeserializeOwned>(tool: ToolName, args: &serde_json::Value) -> Result<T, DispatchError> {
    // Clients may omit arguments entirely for tools without required fields
    let args = if args.is_null() {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        args.clone()
    };
    serde_json::from_value(args).map_err(|e| invalid(tool, e.to_string()))
}

/// Whole number within `min..=max`; JSON numbers may arrive as floats
fn bounded(
    tool: ToolName,
    field: &str,
    value: Option<f64>,
    default: u64,
    min: u64,
    max: u64,
) -> Result<u64, DispatchError> {
    let Some(value) = value else {
        return Ok(default);
    };
    if !value.is_finite() || value.fract() != 0.0 {
        return Err(invalid(tool, format!("{field} must be a whole number")));
    }
    if value < min as f64 || value > max as f64 {
        return Err(invalid(
            tool,
            format!("{field} must be between {min} and {max}"),
        ));
    }
    Ok(value as u64)
}

fn non_empty_emoji(tool: ToolName, emoji: String) -> Result<String, DispatchError> {
    let emoji = emoji.trim().to_string();
    if emoji.is_empty() {
        Err(invalid(tool, "emoji must not be empty"))
    } else {
        Ok(emoji)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use strum::IntoEnumIterator;

    #[test]
    fn test_unknown_tool() {
        let err = ToolCall::parse("launch_rockets", &json!({})).unwrap_err();
        assert_eq!(err.to_string(), "Unknown tool: launch_rockets");
    }

    #[test]
    fn test_ids_accept_strings_and_numbers() {
        let from_string =
            ToolCall::parse("send_message", &json!({"channel_id": "42", "content": "hi"})).unwrap();
        let from_number =
            ToolCall::parse("send_message", &json!({"channel_id": 42, "content": "hi"})).unwrap();
        assert_eq!(from_string, from_number);
    }

    #[test]
    fn test_missing_required_argument() {
        let err = ToolCall::parse("send_message", &json!({"channel_id": "42"})).unwrap_err();
        match err {
            DispatchError::InvalidArguments { tool, message } => {
                assert_eq!(tool, "send_message");
                assert!(message.contains("content"), "{message}");
            }
            other => panic!("Expected InvalidArguments, got {other:?}"),
        }
    }

    #[test]
    fn test_read_limit_default_and_bounds() {
        let call = ToolCall::parse("read_messages", &json!({"channel_id": "1"})).unwrap();
        assert!(matches!(call, ToolCall::ReadMessages { limit: 10, .. }));

        let call =
            ToolCall::parse("read_messages", &json!({"channel_id": "1", "limit": 100.0})).unwrap();
        assert!(matches!(call, ToolCall::ReadMessages { limit: 100, .. }));

        for bad in [json!(0), json!(101), json!(2.5)] {
            let args = json!({"channel_id": "1", "limit": bad});
            assert!(matches!(
                ToolCall::parse("read_messages", &args),
                Err(DispatchError::InvalidArguments { .. })
            ));
        }
    }

    #[test]
    fn test_member_limit_bounds() {
        let call = ToolCall::parse("list_members", &json!({"server_id": "1", "limit": 1000})).unwrap();
        assert!(matches!(call, ToolCall::ListMembers { limit: 1000, .. }));
        assert!(ToolCall::parse("list_members", &json!({"server_id": "1", "limit": 1001})).is_err());
    }

    #[test]
    fn test_timeout_bounds() {
        let args = json!({"channel_id": "1", "message_id": "2", "reason": "spam"});
        let call = ToolCall::parse("moderate_message", &args).unwrap();
        assert!(matches!(call, ToolCall::ModerateMessage { timeout_minutes: 0, .. }));

        let args = json!({"channel_id": "1", "message_id": "2", "reason": "spam", "timeout_minutes": 40321});
        assert!(ToolCall::parse("moderate_message", &args).is_err());
    }

    #[test]
    fn test_delete_channel_default_reason() {
        let call = ToolCall::parse("delete_channel", &json!({"channel_id": "5"})).unwrap();
        assert_eq!(
            call,
            ToolCall::DeleteChannel {
                channel_id: Snowflake::new(5),
                reason: "Channel deleted via MCP".to_string(),
            }
        );
    }

    #[test]
    fn test_empty_emoji_list_rejected() {
        let args = json!({"channel_id": "1", "message_id": "2", "emojis": []});
        assert!(ToolCall::parse("add_multiple_reactions", &args).is_err());
    }

    #[test]
    fn test_list_servers_accepts_null_arguments() {
        assert_eq!(
            ToolCall::parse("list_servers", &serde_json::Value::Null).unwrap(),
            ToolCall::ListServers
        );
    }

    #[test]
    fn test_name_round_trips_through_catalogue() {
        // Every tool rejects an argument bag of the wrong shape without panicking,
        // and any successful parse reports its own name.
        for tool in ToolName::iter() {
            match ToolCall::from_args(tool, &json!({})) {
                Ok(call) => assert_eq!(call.name(), tool),
                Err(e) => assert!(matches!(e, DispatchError::InvalidArguments { .. })),
            }
        }
    }
}
