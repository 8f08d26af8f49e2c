//! Configuration loading from CLI flags, files and environment variables.

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;

use super::{
    BotConfig, DiscordConfig, RelayConfig, StaticConfig, default_api_base_url,
    default_command_prefix, default_gateway_url, default_host, default_placeholder_text,
    default_request_timeout_secs,
};
use crate::error::ConfigError;

const TOKEN_VAR: &str = "DISCORD_TOKEN";

/// Command-line arguments
#[derive(Debug, Clone, Parser)]
#[command(
    name = "discord-mcp-service",
    version,
    about = "Discord bot exposing an MCP tool server and a local WebSocket relay"
)]
pub struct Cli {
    /// Port for the relay WebSocket endpoint
    #[arg(long, env = "DISCORD_MCP_PORT")]
    pub port: u16,

    /// Name of the environment variable holding the channel id to listen in
    #[arg(long = "channel-var", env = "DISCORD_MCP_CHANNEL_VAR")]
    pub channel_var: String,
}

/// Values read from the config file and `DISCORD_MCP__*` variables
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    relay: RelaySection,

    #[serde(default)]
    discord: DiscordSection,

    #[serde(default)]
    bot: BotSection,
}

#[derive(Debug, Deserialize)]
struct RelaySection {
    #[serde(default = "default_host")]
    host: String,
}

impl Default for RelaySection {
    fn default() -> Self {
        Self {
            host: default_host(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DiscordSection {
    #[serde(default)]
    token: Option<String>,

    #[serde(default = "default_api_base_url")]
    api_base_url: String,

    #[serde(default = "default_gateway_url")]
    gateway_url: String,

    #[serde(default = "default_request_timeout_secs")]
    request_timeout_secs: u64,
}

impl Default for DiscordSection {
    fn default() -> Self {
        Self {
            token: None,
            api_base_url: default_api_base_url(),
            gateway_url: default_gateway_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BotSection {
    #[serde(default = "default_command_prefix")]
    command_prefix: String,

    #[serde(default = "default_placeholder_text")]
    placeholder_text: String,
}

impl Default for BotSection {
    fn default() -> Self {
        Self {
            command_prefix: default_command_prefix(),
            placeholder_text: default_placeholder_text(),
        }
    }
}

/// Load configuration: optional `config.*` file, then `DISCORD_MCP__*`
/// environment variables, then the CLI flags.
pub fn load(cli: &Cli) -> Result<StaticConfig, ConfigError> {
    let file: FileConfig = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(
            Environment::with_prefix("DISCORD_MCP")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()?;

    resolve(file, cli, |key| std::env::var(key).ok())
}

/// Combine the layered values with the CLI and the process environment
fn resolve(
    file: FileConfig,
    cli: &Cli,
    env: impl Fn(&str) -> Option<String>,
) -> Result<StaticConfig, ConfigError> {
    let token = file
        .discord
        .token
        .filter(|t| !t.trim().is_empty())
        .or_else(|| env(TOKEN_VAR).filter(|t| !t.trim().is_empty()))
        .ok_or_else(|| ConfigError::Missing {
            key: TOKEN_VAR.to_string(),
        })?;

    let channel_var = cli.channel_var.trim();
    if channel_var.is_empty() {
        return Err(ConfigError::Invalid {
            key: "channel-var".to_string(),
            message: "must name an environment variable".to_string(),
        });
    }

    let raw_channel = env(channel_var)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::Missing {
            key: channel_var.to_string(),
        })?;

    let channel_id = raw_channel.parse().map_err(|e| ConfigError::Invalid {
        key: channel_var.to_string(),
        message: format!("{raw_channel:?} is not a channel id ({e})"),
    })?;

    if file.discord.request_timeout_secs == 0 {
        return Err(ConfigError::Invalid {
            key: "discord.request_timeout_secs".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }

    Ok(StaticConfig {
        relay: RelayConfig {
            host: file.relay.host,
            port: cli.port,
        },
        discord: DiscordConfig {
            token: token.trim().to_string(),
            api_base_url: file.discord.api_base_url,
            gateway_url: file.discord.gateway_url,
            request_timeout_secs: file.discord.request_timeout_secs,
        },
        bot: BotConfig {
            command_prefix: file.bot.command_prefix,
            placeholder_text: file.bot.placeholder_text,
            channel_var: channel_var.to_string(),
            channel_id,
        },
    })
}
