//! Discord REST API client (v10).

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, header};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use super::ChatPlatform;
use super::models::{
    Channel, CreateTextChannel, Guild, Member, Message, PartialGuild, Role, Snowflake, User,
};
use crate::config::DiscordConfig;
use crate::error::{PlatformError, PlatformResult};

const AUDIT_LOG_REASON: &str = "X-Audit-Log-Reason";

/// Encode an emoji for a reaction route.
///
/// Custom emoji arrive in message form (`<:name:id>`, `<a:name:id>`) but the
/// route takes `name:id`; unicode emoji are used as-is.
fn reaction_path_segment(emoji: &str) -> String {
    let emoji = emoji.trim();
    let custom = emoji
        .strip_prefix('<')
        .and_then(|e| e.strip_suffix('>'))
        .map(|e| e.strip_prefix("a:").unwrap_or(e))
        .map(|e| e.strip_prefix(':').unwrap_or(e));

    match custom {
        Some(name_and_id) => urlencoding::encode(name_and_id).into_owned(),
        None => urlencoding::encode(emoji).into_owned(),
    }
}

/// Body of a 429 response
#[derive(Debug, Deserialize)]
struct RateLimitBody {
    #[serde(default)]
    retry_after: f64,
}

/// Discord REST client authenticated as a bot
#[derive(Clone)]
pub struct DiscordRestClient {
    client: Client,
    base_url: String,
    token: String,
}

impl DiscordRestClient {
    pub fn new(config: &DiscordConfig) -> PlatformResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!(
                "DiscordBot (discord-mcp-service, ",
                env!("CARGO_PKG_VERSION"),
                ")"
            ))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header(header::AUTHORIZATION, format!("Bot {}", self.token))
    }

    fn with_reason(builder: RequestBuilder, reason: Option<&str>) -> RequestBuilder {
        match reason {
            Some(reason) if !reason.is_empty() => {
                builder.header(AUDIT_LOG_REASON, urlencoding::encode(reason).into_owned())
            }
            _ => builder,
        }
    }

    /// Send a request and decode the JSON body
    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        resource: &str,
    ) -> PlatformResult<T> {
        let response = Self::check(builder.send().await?, resource).await?;
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(PlatformError::InvalidResponse)
    }

    /// Send a request whose body is irrelevant (usually 204 No Content)
    async fn send_empty(&self, builder: RequestBuilder, resource: &str) -> PlatformResult<()> {
        Self::check(builder.send().await?, resource).await?;
        Ok(())
    }

    /// Map non-success statuses onto typed platform errors
    async fn check(response: Response, resource: &str) -> PlatformResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        debug!(status = status.as_u16(), resource = %resource, "Discord API request failed");

        match status {
            StatusCode::NOT_FOUND => Err(PlatformError::NotFound {
                resource: resource.to_string(),
            }),
            StatusCode::FORBIDDEN => Err(PlatformError::Forbidden {
                message: format!(
                    "missing permissions for {}: {}",
                    resource,
                    response.text().await.unwrap_or_default()
                ),
            }),
            StatusCode::TOO_MANY_REQUESTS => {
                let body: RateLimitBody = response.json().await.unwrap_or(RateLimitBody {
                    retry_after: 1.0,
                });
                Err(PlatformError::RateLimited {
                    retry_after_secs: body.retry_after.ceil().max(0.0) as u64,
                })
            }
            _ => Err(PlatformError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            }),
        }
    }
}

#[async_trait]
impl ChatPlatform for DiscordRestClient {
    async fn send_message(&self, channel_id: Snowflake, content: &str) -> PlatformResult<Message> {
        let builder = self
            .request(Method::POST, &format!("/channels/{channel_id}/messages"))
            .json(&serde_json::json!({ "content": content }));
        self.send_json(builder, &format!("channel {channel_id}"))
            .await
    }

    async fn edit_message(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        content: &str,
    ) -> PlatformResult<Message> {
        let builder = self
            .request(
                Method::PATCH,
                &format!("/channels/{channel_id}/messages/{message_id}"),
            )
            .json(&serde_json::json!({ "content": content }));
        self.send_json(builder, &format!("message {message_id}"))
            .await
    }

    async fn delete_message(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        reason: Option<&str>,
    ) -> PlatformResult<()> {
        let builder = self.request(
            Method::DELETE,
            &format!("/channels/{channel_id}/messages/{message_id}"),
        );
        self.send_empty(
            Self::with_reason(builder, reason),
            &format!("message {message_id}"),
        )
        .await
    }

    async fn fetch_message(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
    ) -> PlatformResult<Message> {
        let builder = self.request(
            Method::GET,
            &format!("/channels/{channel_id}/messages/{message_id}"),
        );
        self.send_json(builder, &format!("message {message_id}"))
            .await
    }

    async fn fetch_messages(
        &self,
        channel_id: Snowflake,
        limit: u8,
    ) -> PlatformResult<Vec<Message>> {
        let builder = self.request(
            Method::GET,
            &format!("/channels/{channel_id}/messages?limit={limit}"),
        );
        self.send_json(builder, &format!("channel {channel_id}"))
            .await
    }

    async fn fetch_channel(&self, channel_id: Snowflake) -> PlatformResult<Channel> {
        let builder = self.request(Method::GET, &format!("/channels/{channel_id}"));
        self.send_json(builder, &format!("channel {channel_id}"))
            .await
    }

    async fn delete_channel(&self, channel_id: Snowflake, reason: &str) -> PlatformResult<()> {
        let builder = self.request(Method::DELETE, &format!("/channels/{channel_id}"));
        self.send_empty(
            Self::with_reason(builder, Some(reason)),
            &format!("channel {channel_id}"),
        )
        .await
    }

    async fn fetch_user(&self, user_id: Snowflake) -> PlatformResult<User> {
        let builder = self.request(Method::GET, &format!("/users/{user_id}"));
        self.send_json(builder, &format!("user {user_id}")).await
    }

    async fn fetch_guild(&self, guild_id: Snowflake) -> PlatformResult<Guild> {
        let builder = self.request(
            Method::GET,
            &format!("/guilds/{guild_id}?with_counts=true"),
        );
        self.send_json(builder, &format!("guild {guild_id}")).await
    }

    async fn fetch_guild_channels(&self, guild_id: Snowflake) -> PlatformResult<Vec<Channel>> {
        let builder = self.request(Method::GET, &format!("/guilds/{guild_id}/channels"));
        self.send_json(builder, &format!("guild {guild_id}")).await
    }

    async fn create_text_channel(
        &self,
        guild_id: Snowflake,
        request: &CreateTextChannel,
        reason: &str,
    ) -> PlatformResult<Channel> {
        let builder = self
            .request(Method::POST, &format!("/guilds/{guild_id}/channels"))
            .json(request);
        self.send_json(
            Self::with_reason(builder, Some(reason)),
            &format!("guild {guild_id}"),
        )
        .await
    }

    async fn list_members(&self, guild_id: Snowflake, limit: u16) -> PlatformResult<Vec<Member>> {
        let builder = self.request(
            Method::GET,
            &format!("/guilds/{guild_id}/members?limit={limit}"),
        );
        self.send_json(builder, &format!("guild {guild_id}")).await
    }

    async fn fetch_member(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> PlatformResult<Member> {
        let builder = self.request(
            Method::GET,
            &format!("/guilds/{guild_id}/members/{user_id}"),
        );
        self.send_json(builder, &format!("member {user_id}")).await
    }

    async fn fetch_roles(&self, guild_id: Snowflake) -> PlatformResult<Vec<Role>> {
        let builder = self.request(Method::GET, &format!("/guilds/{guild_id}/roles"));
        self.send_json(builder, &format!("guild {guild_id}")).await
    }

    async fn add_member_role(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        role_id: Snowflake,
        reason: &str,
    ) -> PlatformResult<()> {
        let builder = self.request(
            Method::PUT,
            &format!("/guilds/{guild_id}/members/{user_id}/roles/{role_id}"),
        );
        self.send_empty(
            Self::with_reason(builder, Some(reason)),
            &format!("role {role_id}"),
        )
        .await
    }

    async fn remove_member_role(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        role_id: Snowflake,
        reason: &str,
    ) -> PlatformResult<()> {
        let builder = self.request(
            Method::DELETE,
            &format!("/guilds/{guild_id}/members/{user_id}/roles/{role_id}"),
        );
        self.send_empty(
            Self::with_reason(builder, Some(reason)),
            &format!("role {role_id}"),
        )
        .await
    }

    async fn timeout_member(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        until: DateTime<Utc>,
        reason: &str,
    ) -> PlatformResult<()> {
        let builder = self
            .request(
                Method::PATCH,
                &format!("/guilds/{guild_id}/members/{user_id}"),
            )
            .json(&serde_json::json!({
                "communication_disabled_until": until.to_rfc3339_opts(SecondsFormat::Secs, true)
            }));
        self.send_empty(
            Self::with_reason(builder, Some(reason)),
            &format!("member {user_id}"),
        )
        .await
    }

    async fn add_reaction(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        emoji: &str,
    ) -> PlatformResult<()> {
        let builder = self.request(
            Method::PUT,
            &format!(
                "/channels/{channel_id}/messages/{message_id}/reactions/{}/@me",
                reaction_path_segment(emoji)
            ),
        );
        self.send_empty(builder, &format!("message {message_id}"))
            .await
    }

    async fn remove_own_reaction(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        emoji: &str,
    ) -> PlatformResult<()> {
        let builder = self.request(
            Method::DELETE,
            &format!(
                "/channels/{channel_id}/messages/{message_id}/reactions/{}/@me",
                reaction_path_segment(emoji)
            ),
        );
        self.send_empty(builder, &format!("message {message_id}"))
            .await
    }

    async fn current_user_guilds(&self) -> PlatformResult<Vec<PartialGuild>> {
        let builder = self.request(Method::GET, "/users/@me/guilds?with_counts=true");
        self.send_json(builder, "current user guilds").await
    }
}
