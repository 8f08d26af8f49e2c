//! Discord chat-platform collaborator.
//!
//! The rest of the service only talks to Discord through the [`ChatPlatform`]
//! trait: the REST client implements it for production, and tests substitute
//! an in-memory fake. Inbound events arrive separately through the
//! [`GatewayListener`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::PlatformResult;

pub mod gateway;
pub mod models;
pub mod rest;

#[cfg(test)]
pub(crate) mod testing;

pub use gateway::{GatewayEvent, GatewayListener};
pub use models::{
    Channel, CreateTextChannel, Guild, Member, Message, PartialGuild, Role, Snowflake, User,
};
pub use rest::DiscordRestClient;

/// Remote capabilities consumed by the event router and the tool dispatcher.
///
/// Every call is a single request/response against the platform; failures are
/// typed (not found, forbidden, rate limited) so callers can decide whether to
/// log or report them.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    async fn send_message(&self, channel_id: Snowflake, content: &str) -> PlatformResult<Message>;

    async fn edit_message(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        content: &str,
    ) -> PlatformResult<Message>;

    async fn delete_message(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        reason: Option<&str>,
    ) -> PlatformResult<()>;

    async fn fetch_message(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
    ) -> PlatformResult<Message>;

    /// Most recent messages first
    async fn fetch_messages(&self, channel_id: Snowflake, limit: u8)
    -> PlatformResult<Vec<Message>>;

    async fn fetch_channel(&self, channel_id: Snowflake) -> PlatformResult<Channel>;

    async fn delete_channel(&self, channel_id: Snowflake, reason: &str) -> PlatformResult<()>;

    async fn fetch_user(&self, user_id: Snowflake) -> PlatformResult<User>;

    async fn fetch_guild(&self, guild_id: Snowflake) -> PlatformResult<Guild>;

    async fn fetch_guild_channels(&self, guild_id: Snowflake) -> PlatformResult<Vec<Channel>>;

    async fn create_text_channel(
        &self,
        guild_id: Snowflake,
        request: &CreateTextChannel,
        reason: &str,
    ) -> PlatformResult<Channel>;

    async fn list_members(&self, guild_id: Snowflake, limit: u16) -> PlatformResult<Vec<Member>>;

    async fn fetch_member(&self, guild_id: Snowflake, user_id: Snowflake)
    -> PlatformResult<Member>;

    async fn fetch_roles(&self, guild_id: Snowflake) -> PlatformResult<Vec<Role>>;

    async fn add_member_role(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        role_id: Snowflake,
        reason: &str,
    ) -> PlatformResult<()>;

    async fn remove_member_role(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        role_id: Snowflake,
        reason: &str,
    ) -> PlatformResult<()>;

    async fn timeout_member(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        until: DateTime<Utc>,
        reason: &str,
    ) -> PlatformResult<()>;

    async fn add_reaction(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        emoji: &str,
    ) -> PlatformResult<()>;

    /// Remove the bot's own reaction
    async fn remove_own_reaction(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        emoji: &str,
    ) -> PlatformResult<()>;

    /// Guilds the bot user belongs to
    async fn current_user_guilds(&self) -> PlatformResult<Vec<PartialGuild>>;
}
