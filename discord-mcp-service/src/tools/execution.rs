//! Tool execution against the chat platform.
//!
//! Each call performs its Discord requests and renders a plain-text result.

use chrono::{Duration, Utc};
use tracing::debug;

use super::call::{CHANNEL_CREATED_REASON, ROLE_ADDED_REASON, ROLE_REMOVED_REASON, ToolCall};
use crate::discord::{ChatPlatform, CreateTextChannel, Message, Snowflake};
use crate::error::{DispatchError, PlatformError};

impl ToolCall {
    pub async fn execute(&self, platform: &dyn ChatPlatform) -> Result<String, DispatchError> {
        debug!(tool = %self.name(), "Executing tool");

        let text = match self {
            // ==================== Messages ====================
            ToolCall::SendMessage {
                channel_id,
                content,
            } => {
                let message = platform.send_message(*channel_id, content).await?;
                format!("Message sent successfully. Message ID: {}", message.id)
            }
            ToolCall::ReadMessages { channel_id, limit } => {
                let messages = platform.fetch_messages(*channel_id, *limit).await?;
                format_messages(&messages)
            }
            ToolCall::EditMessage {
                channel_id,
                message_id,
                content,
            } => {
                let message = platform
                    .edit_message(*channel_id, *message_id, content)
                    .await?;
                format!(
                    "Message {} in channel {} edited successfully.",
                    message.id, channel_id
                )
            }
            ToolCall::ModerateMessage {
                channel_id,
                message_id,
                reason,
                timeout_minutes,
            } => {
                moderate_message(platform, *channel_id, *message_id, reason, *timeout_minutes)
                    .await?
            }

            // ==================== Servers ====================
            ToolCall::GetServerInfo { server_id } => {
                let guild = platform.fetch_guild(*server_id).await?;
                let lines = [
                    format!("name: {}", guild.name),
                    format!("id: {}", guild.id),
                    format!("owner_id: {}", display_or_unknown(guild.owner_id)),
                    format!(
                        "member_count: {}",
                        display_or_unknown(guild.approximate_member_count)
                    ),
                    format!("created_at: {}", guild.id.created_at().to_rfc3339()),
                    format!(
                        "description: {}",
                        guild.description.as_deref().unwrap_or("none")
                    ),
                    format!("premium_tier: {}", guild.premium_tier),
                    format!("explicit_content_filter: {}", guild.content_filter_name()),
                ];
                format!("Server Information:\n{}", lines.join("\n"))
            }
            ToolCall::GetChannels { server_id } => {
                let guild = platform.fetch_guild(*server_id).await?;
                let channels = platform.fetch_guild_channels(*server_id).await?;
                let lines: Vec<String> = channels
                    .iter()
                    .map(|c| {
                        format!(
                            "#{} (ID: {}) - {}",
                            c.name.as_deref().unwrap_or("unnamed"),
                            c.id,
                            c.kind_name()
                        )
                    })
                    .collect();
                format!("Channels in {}:\n{}", guild.name, lines.join("\n"))
            }
            ToolCall::ListMembers { server_id, limit } => {
                let members = platform.list_members(*server_id, *limit).await?;
                let lines: Vec<String> = members
                    .iter()
                    .map(|m| {
                        let id = m.user.as_ref().map(|u| u.id.to_string()).unwrap_or_default();
                        let roles: Vec<String> = m.roles.iter().map(Snowflake::to_string).collect();
                        format!(
                            "{} (ID: {}, Roles: {})",
                            m.username(),
                            id,
                            roles.join(", ")
                        )
                    })
                    .collect();
                format!("Server Members ({}):\n{}", members.len(), lines.join("\n"))
            }
            ToolCall::ListServers => {
                let guilds = platform.current_user_guilds().await?;
                let lines: Vec<String> = guilds
                    .iter()
                    .map(|g| {
                        format!(
                            "{} (ID: {}, Members: {})",
                            g.name,
                            g.id,
                            display_or_unknown(g.approximate_member_count)
                        )
                    })
                    .collect();
                format!("Available Servers ({}):\n{}", guilds.len(), lines.join("\n"))
            }
            ToolCall::GetUserInfo { user_id } => {
                let user = platform.fetch_user(*user_id).await?;
                format!(
                    "User information:\nName: {}\nID: {}\nBot: {}\nCreated: {}",
                    user.tag(),
                    user.id,
                    user.bot,
                    user.id.created_at().to_rfc3339()
                )
            }

            // ==================== Roles ====================
            ToolCall::AddRole {
                server_id,
                user_id,
                role_id,
            } => {
                let (member_name, role_name) =
                    resolve_member_and_role(platform, *server_id, *user_id, *role_id).await?;
                platform
                    .add_member_role(*server_id, *user_id, *role_id, ROLE_ADDED_REASON)
                    .await?;
                format!("Added role {role_name} to user {member_name}")
            }
            ToolCall::RemoveRole {
                server_id,
                user_id,
                role_id,
            } => {
                let (member_name, role_name) =
                    resolve_member_and_role(platform, *server_id, *user_id, *role_id).await?;
                platform
                    .remove_member_role(*server_id, *user_id, *role_id, ROLE_REMOVED_REASON)
                    .await?;
                format!("Removed role {role_name} from user {member_name}")
            }

            // ==================== Channels ====================
            ToolCall::CreateTextChannel {
                server_id,
                name,
                category_id,
                topic,
            } => {
                let mut request = CreateTextChannel::new(name.as_str());
                request.parent_id = *category_id;
                request.topic = topic.clone();
                let channel = platform
                    .create_text_channel(*server_id, &request, CHANNEL_CREATED_REASON)
                    .await?;
                format!(
                    "Created text channel #{} (ID: {})",
                    channel.name.as_deref().unwrap_or(name),
                    channel.id
                )
            }
            ToolCall::DeleteChannel { channel_id, reason } => {
                platform.delete_channel(*channel_id, reason).await?;
                "Deleted channel successfully".to_string()
            }

            // ==================== Reactions ====================
            ToolCall::AddReaction {
                channel_id,
                message_id,
                emoji,
            } => {
                platform.add_reaction(*channel_id, *message_id, emoji).await?;
                format!("Added reaction {emoji} to message")
            }
            ToolCall::AddMultipleReactions {
                channel_id,
                message_id,
                emojis,
            } => add_reactions(platform, *channel_id, *message_id, emojis).await?,
            ToolCall::RemoveReaction {
                channel_id,
                message_id,
                emoji,
            } => {
                platform
                    .remove_own_reaction(*channel_id, *message_id, emoji)
                    .await?;
                format!("Removed reaction {emoji} from message")
            }
        };

        Ok(text)
    }
}

fn display_or_unknown<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "unknown".to_string(), |v| v.to_string())
}

fn format_messages(messages: &[Message]) -> String {
    let entries: Vec<String> = messages
        .iter()
        .map(|m| {
            let reactions = if m.reactions.is_empty() {
                "No reactions".to_string()
            } else {
                m.reactions
                    .iter()
                    .map(|r| format!("{}({})", r.emoji, r.count))
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            format!(
                "{} ({}): {}\nReactions: {}",
                m.author.tag(),
                m.timestamp.to_rfc3339(),
                m.content,
                reactions
            )
        })
        .collect();

    format!(
        "Retrieved {} messages:\n\n{}",
        messages.len(),
        entries.join("\n")
    )
}

async fn moderate_message(
    platform: &dyn ChatPlatform,
    channel_id: Snowflake,
    message_id: Snowflake,
    reason: &str,
    timeout_minutes: u32,
) -> Result<String, DispatchError> {
    let channel = platform.fetch_channel(channel_id).await?;
    let message = platform.fetch_message(channel_id, message_id).await?;

    platform
        .delete_message(channel_id, message_id, Some(reason))
        .await?;

    // Timeouts only exist for guild members
    if timeout_minutes > 0
        && let Some(guild_id) = channel.guild_id.or(message.guild_id)
    {
        let until = Utc::now() + Duration::minutes(i64::from(timeout_minutes));
        platform
            .timeout_member(guild_id, message.author.id, until, reason)
            .await?;
        return Ok(format!(
            "Message deleted and user timed out for {timeout_minutes} minutes."
        ));
    }

    Ok("Message deleted successfully.".to_string())
}

async fn resolve_member_and_role(
    platform: &dyn ChatPlatform,
    server_id: Snowflake,
    user_id: Snowflake,
    role_id: Snowflake,
) -> Result<(String, String), DispatchError> {
    let member = platform.fetch_member(server_id, user_id).await?;
    let role = platform
        .fetch_roles(server_id)
        .await?
        .into_iter()
        .find(|r| r.id == role_id)
        .ok_or_else(|| PlatformError::NotFound {
            resource: format!("role {role_id}"),
        })?;
    Ok((member.username().to_string(), role.name))
}

/// Add reactions in order. Stops at the first failure; earlier reactions stay.
async fn add_reactions(
    platform: &dyn ChatPlatform,
    channel_id: Snowflake,
    message_id: Snowflake,
    emojis: &[String],
) -> Result<String, DispatchError> {
    let mut added = Vec::with_capacity(emojis.len());

    for emoji in emojis {
        if let Err(source) = platform.add_reaction(channel_id, message_id, emoji).await {
            if added.is_empty() {
                return Err(source.into());
            }
            return Err(DispatchError::PartialReactions {
                added,
                failed: emoji.clone(),
                total: emojis.len(),
                source,
            });
        }
        added.push(emoji.clone());
    }

    Ok(format!("Added reactions: {} to message", added.join(", ")))
}
