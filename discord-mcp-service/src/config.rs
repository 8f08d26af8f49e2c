//! Service configuration.
//!
//! Everything is resolved once at startup; there is no runtime reload. A
//! missing or malformed required value is fatal.

mod loader;

pub use loader::{Cli, load};

use crate::discord::Snowflake;

/// Fully resolved startup configuration
#[derive(Debug, Clone)]
pub struct StaticConfig {
    pub relay: RelayConfig,
    pub discord: DiscordConfig,
    pub bot: BotConfig,
}

/// Relay WebSocket endpoint
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
}

impl RelayConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Discord API access
#[derive(Clone)]
pub struct DiscordConfig {
    pub token: String,
    pub api_base_url: String,
    pub gateway_url: String,
    pub request_timeout_secs: u64,
}

// Keep the token out of debug output
impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("token", &"<redacted>")
            .field("api_base_url", &self.api_base_url)
            .field("gateway_url", &self.gateway_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// Chat-side behaviour of the bot
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub command_prefix: String,
    /// Text of the placeholder posted before a message is forwarded
    pub placeholder_text: String,
    /// Name of the environment variable the room id was read from
    pub channel_var: String,
    /// The only room the bot listens to
    pub channel_id: Snowflake,
}

pub(crate) fn default_host() -> String {
    "127.0.0.1".to_string()
}

pub(crate) fn default_api_base_url() -> String {
    "https://discord.com/api/v10".to_string()
}

pub(crate) fn default_gateway_url() -> String {
    "wss://gateway.discord.gg/?v=10&encoding=json".to_string()
}

pub(crate) fn default_request_timeout_secs() -> u64 {
    30
}

pub(crate) fn default_command_prefix() -> String {
    "!".to_string()
}

pub(crate) fn default_placeholder_text() -> String {
    ">🤔Thinking...".to_string()
}
