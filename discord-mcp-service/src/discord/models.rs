//! Discord REST and gateway object types.
//!
//! Only the fields the bridge reads are modelled; everything else in the
//! payloads is ignored during deserialization.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Milliseconds between the Unix epoch and the Discord epoch (2015-01-01).
const DISCORD_EPOCH_MS: u64 = 1_420_070_400_000;

/// Discord snowflake identifier.
///
/// Serialized as a string (as Discord does); deserializes from either a
/// string or a bare integer so tool arguments can use both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Snowflake(u64);

impl Snowflake {
    #[cfg(test)]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[cfg(test)]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Creation time encoded in the upper bits of the id
    pub fn created_at(self) -> DateTime<Utc> {
        let millis = (self.0 >> 22) + DISCORD_EPOCH_MS;
        DateTime::from_timestamp_millis(millis as i64).unwrap_or_default()
    }
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Snowflake {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<u64> for Snowflake {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl Serialize for Snowflake {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Snowflake {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Number(u64),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Text(text) => text
                .parse()
                .map_err(|_| serde::de::Error::custom(format!("invalid snowflake: {text:?}"))),
            Repr::Number(id) => Ok(Self(id)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Snowflake,
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
    #[serde(default = "default_discriminator")]
    pub discriminator: String,
    #[serde(default)]
    pub bot: bool,
}

impl User {
    /// `name#1234` for legacy accounts, plain username otherwise
    pub fn tag(&self) -> String {
        if self.discriminator == "0" {
            self.username.clone()
        } else {
            format!("{}#{}", self.username, self.discriminator)
        }
    }
}

fn default_discriminator() -> String {
    "0".to_string()
}

/// Guild-specific member data attached to gateway message events
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartialMember {
    #[serde(default)]
    pub nick: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    #[serde(default)]
    pub guild_id: Option<Snowflake>,
    pub author: User,
    #[serde(default)]
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
    #[serde(default)]
    pub member: Option<PartialMember>,
}

impl Message {
    /// Name shown in the channel: server nickname, then global name, then username
    pub fn author_display_name(&self) -> &str {
        self.member
            .as_ref()
            .and_then(|m| m.nick.as_deref())
            .or(self.author.global_name.as_deref())
            .unwrap_or(&self.author.username)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reaction {
    pub count: u32,
    pub emoji: Emoji,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Emoji {
    #[serde(default)]
    pub id: Option<Snowflake>,
    #[serde(default)]
    pub name: Option<String>,
}

impl fmt::Display for Emoji {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.name, self.id) {
            (Some(name), _) if !name.is_empty() => write!(f, "{name}"),
            (_, Some(id)) => write!(f, "{id}"),
            _ => write!(f, "?"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Guild {
    pub id: Snowflake,
    pub name: String,
    #[serde(default)]
    pub owner_id: Option<Snowflake>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub premium_tier: u8,
    #[serde(default)]
    pub explicit_content_filter: u8,
    #[serde(default)]
    pub approximate_member_count: Option<u64>,
}

impl Guild {
    pub fn content_filter_name(&self) -> &'static str {
        match self.explicit_content_filter {
            0 => "disabled",
            1 => "members_without_roles",
            2 => "all_members",
            _ => "unknown",
        }
    }
}

/// Guild summary as returned by `/users/@me/guilds`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartialGuild {
    pub id: Snowflake,
    pub name: String,
    #[serde(default)]
    pub approximate_member_count: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: Snowflake,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub guild_id: Option<Snowflake>,
    #[serde(default)]
    pub parent_id: Option<Snowflake>,
    #[serde(default)]
    pub topic: Option<String>,
}

impl Channel {
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            0 => "text",
            1 => "private",
            2 => "voice",
            3 => "group",
            4 => "category",
            5 => "news",
            10..=12 => "thread",
            13 => "stage_voice",
            15 => "forum",
            16 => "media",
            _ => "unknown",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub nick: Option<String>,
    #[serde(default)]
    pub roles: Vec<Snowflake>,
    #[serde(default)]
    pub joined_at: Option<DateTime<Utc>>,
}

impl Member {
    pub fn username(&self) -> &str {
        self.user.as_ref().map_or("unknown", |u| u.username.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: Snowflake,
    pub name: String,
}

/// Request body for creating a guild text channel
#[derive(Debug, Clone, Serialize)]
pub struct CreateTextChannel {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Snowflake>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

impl CreateTextChannel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: 0,
            parent_id: None,
            topic: None,
        }
    }
}
