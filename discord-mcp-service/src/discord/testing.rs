//! In-memory [`ChatPlatform`] used by unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::ChatPlatform;
use super::models::{
    Channel, CreateTextChannel, Guild, Member, Message, PartialGuild, Role, Snowflake, User,
};
use crate::error::{PlatformError, PlatformResult};

/// Ids handed out by the fake start here so they never collide with fixtures
const FIRST_GENERATED_ID: u64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    NotFound,
    Forbidden,
}

impl Failure {
    fn into_error(self, op: &str) -> PlatformError {
        match self {
            Failure::NotFound => PlatformError::NotFound {
                resource: op.to_string(),
            },
            Failure::Forbidden => PlatformError::Forbidden {
                message: format!("missing permissions for {op}"),
            },
        }
    }
}

/// Calls observed by the fake, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Send { channel_id: Snowflake, content: String },
    Edit { message_id: Snowflake, content: String },
    Delete { message_id: Snowflake },
    DeleteChannel { channel_id: Snowflake, reason: String },
    CreateChannel { guild_id: Snowflake, name: String },
    AddRole { user_id: Snowflake, role_id: Snowflake },
    RemoveRole { user_id: Snowflake, role_id: Snowflake },
    Timeout { user_id: Snowflake, until: DateTime<Utc> },
    React { message_id: Snowflake, emoji: String },
    Unreact { message_id: Snowflake, emoji: String },
}

#[derive(Default)]
struct FakeState {
    next_id: u64,
    calls: Vec<Call>,
    messages: HashMap<Snowflake, Message>,
    channels: HashMap<Snowflake, Channel>,
    guilds: HashMap<Snowflake, Guild>,
    users: HashMap<Snowflake, User>,
    members: HashMap<(Snowflake, Snowflake), Member>,
    roles: HashMap<Snowflake, Vec<Role>>,
    failures: HashMap<&'static str, Failure>,
    failing_emojis: HashSet<String>,
    /// Suspend once inside `send_message` so other tasks can interleave
    yield_on_send: bool,
}

#[derive(Default)]
pub struct FakePlatform {
    state: Mutex<FakeState>,
}

pub fn user(id: u64, username: &str) -> User {
    User {
        id: Snowflake::new(id),
        username: username.to_string(),
        global_name: None,
        discriminator: "0".to_string(),
        bot: false,
    }
}

pub fn message(id: u64, channel_id: u64, author: User, content: &str) -> Message {
    Message {
        id: Snowflake::new(id),
        channel_id: Snowflake::new(channel_id),
        guild_id: None,
        author,
        content: content.to_string(),
        timestamp: DateTime::from_timestamp(1_704_110_400, 0).unwrap_or_default(),
        reactions: Vec::new(),
        member: None,
    }
}

pub fn text_channel(id: u64, guild_id: u64, name: &str) -> Channel {
    Channel {
        id: Snowflake::new(id),
        kind: 0,
        name: Some(name.to_string()),
        guild_id: Some(Snowflake::new(guild_id)),
        parent_id: None,
        topic: None,
    }
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Make every call of `op` (the trait method name) fail
    pub fn fail(&self, op: &'static str, failure: Failure) {
        self.lock().failures.insert(op, failure);
    }

    pub fn yield_on_send(&self) {
        self.lock().yield_on_send = true;
    }

    pub fn fail_emoji(&self, emoji: &str) {
        self.lock().failing_emojis.insert(emoji.to_string());
    }

    pub fn add_message(&self, message: Message) {
        self.lock().messages.insert(message.id, message);
    }

    pub fn add_channel(&self, channel: Channel) {
        self.lock().channels.insert(channel.id, channel);
    }

    pub fn add_guild(&self, guild: Guild) {
        self.lock().guilds.insert(guild.id, guild);
    }

    pub fn add_user(&self, user: User) {
        self.lock().users.insert(user.id, user);
    }

    pub fn add_member(&self, guild_id: Snowflake, member: Member) {
        if let Some(user) = &member.user {
            let key = (guild_id, user.id);
            self.lock().members.insert(key, member);
        }
    }

    pub fn set_roles(&self, guild_id: Snowflake, roles: Vec<Role>) {
        self.lock().roles.insert(guild_id, roles);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Content of every message sent, in order
    pub fn sent(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Send { content, .. } => Some(content),
                _ => None,
            })
            .collect()
    }

    pub fn edits(&self) -> Vec<(Snowflake, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Edit {
                    message_id,
                    content,
                } => Some((message_id, content)),
                _ => None,
            })
            .collect()
    }

    pub fn deleted(&self) -> Vec<Snowflake> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Delete { message_id } => Some(message_id),
                _ => None,
            })
            .collect()
    }

    pub fn message(&self, id: Snowflake) -> Option<Message> {
        self.lock().messages.get(&id).cloned()
    }

    fn check(&self, op: &'static str) -> PlatformResult<()> {
        match self.lock().failures.get(op) {
            Some(failure) => Err(failure.into_error(op)),
            None => Ok(()),
        }
    }

    fn record(&self, call: Call) {
        self.lock().calls.push(call);
    }

    fn not_found(resource: impl std::fmt::Display) -> PlatformError {
        PlatformError::NotFound {
            resource: resource.to_string(),
        }
    }
}

#[async_trait]
impl ChatPlatform for FakePlatform {
    async fn send_message(&self, channel_id: Snowflake, content: &str) -> PlatformResult<Message> {
        let yield_first = self.lock().yield_on_send;
        if yield_first {
            tokio::task::yield_now().await;
        }
        self.check("send_message")?;
        self.record(Call::Send {
            channel_id,
            content: content.to_string(),
        });

        let mut state = self.lock();
        state.next_id += 1;
        let id = FIRST_GENERATED_ID + state.next_id;
        let sent = message(id, channel_id.get(), user(1, "bot"), content);
        state.messages.insert(sent.id, sent.clone());
        Ok(sent)
    }

    async fn edit_message(
        &self,
        _channel_id: Snowflake,
        message_id: Snowflake,
        content: &str,
    ) -> PlatformResult<Message> {
        self.check("edit_message")?;
        self.record(Call::Edit {
            message_id,
            content: content.to_string(),
        });

        let mut state = self.lock();
        let stored = state
            .messages
            .get_mut(&message_id)
            .ok_or_else(|| Self::not_found(format!("message {message_id}")))?;
        stored.content = content.to_string();
        Ok(stored.clone())
    }

    async fn delete_message(
        &self,
        _channel_id: Snowflake,
        message_id: Snowflake,
        _reason: Option<&str>,
    ) -> PlatformResult<()> {
        self.check("delete_message")?;
        self.record(Call::Delete { message_id });
        self.lock().messages.remove(&message_id);
        Ok(())
    }

    async fn fetch_message(
        &self,
        _channel_id: Snowflake,
        message_id: Snowflake,
    ) -> PlatformResult<Message> {
        self.check("fetch_message")?;
        self.message(message_id)
            .ok_or_else(|| Self::not_found(format!("message {message_id}")))
    }

    async fn fetch_messages(
        &self,
        channel_id: Snowflake,
        limit: u8,
    ) -> PlatformResult<Vec<Message>> {
        self.check("fetch_messages")?;
        let mut messages: Vec<Message> = self
            .lock()
            .messages
            .values()
            .filter(|m| m.channel_id == channel_id)
            .cloned()
            .collect();
        messages.sort_by(|a, b| b.id.cmp(&a.id));
        messages.truncate(usize::from(limit));
        Ok(messages)
    }

    async fn fetch_channel(&self, channel_id: Snowflake) -> PlatformResult<Channel> {
        self.check("fetch_channel")?;
        self.lock()
            .channels
            .get(&channel_id)
            .cloned()
            .ok_or_else(|| Self::not_found(format!("channel {channel_id}")))
    }

    async fn delete_channel(&self, channel_id: Snowflake, reason: &str) -> PlatformResult<()> {
        self.check("delete_channel")?;
        self.record(Call::DeleteChannel {
            channel_id,
            reason: reason.to_string(),
        });
        self.lock()
            .channels
            .remove(&channel_id)
            .map(|_| ())
            .ok_or_else(|| Self::not_found(format!("channel {channel_id}")))
    }

    async fn fetch_user(&self, user_id: Snowflake) -> PlatformResult<User> {
        self.check("fetch_user")?;
        self.lock()
            .users
            .get(&user_id)
            .cloned()
            .ok_or_else(|| Self::not_found(format!("user {user_id}")))
    }

    async fn fetch_guild(&self, guild_id: Snowflake) -> PlatformResult<Guild> {
        self.check("fetch_guild")?;
        self.lock()
            .guilds
            .get(&guild_id)
            .cloned()
            .ok_or_else(|| Self::not_found(format!("guild {guild_id}")))
    }

    async fn fetch_guild_channels(&self, guild_id: Snowflake) -> PlatformResult<Vec<Channel>> {
        self.check("fetch_guild_channels")?;
        let mut channels: Vec<Channel> = self
            .lock()
            .channels
            .values()
            .filter(|c| c.guild_id == Some(guild_id))
            .cloned()
            .collect();
        channels.sort_by_key(|c| c.id);
        Ok(channels)
    }

    async fn create_text_channel(
        &self,
        guild_id: Snowflake,
        request: &CreateTextChannel,
        _reason: &str,
    ) -> PlatformResult<Channel> {
        self.check("create_text_channel")?;
        self.record(Call::CreateChannel {
            guild_id,
            name: request.name.clone(),
        });

        let mut state = self.lock();
        state.next_id += 1;
        let channel = Channel {
            id: Snowflake::new(FIRST_GENERATED_ID + state.next_id),
            kind: request.kind,
            name: Some(request.name.clone()),
            guild_id: Some(guild_id),
            parent_id: request.parent_id,
            topic: request.topic.clone(),
        };
        state.channels.insert(channel.id, channel.clone());
        Ok(channel)
    }

    async fn list_members(&self, guild_id: Snowflake, limit: u16) -> PlatformResult<Vec<Member>> {
        self.check("list_members")?;
        let mut members: Vec<(Snowflake, Member)> = self
            .lock()
            .members
            .iter()
            .filter(|((g, _), _)| *g == guild_id)
            .map(|((_, u), m)| (*u, m.clone()))
            .collect();
        members.sort_by_key(|(u, _)| *u);
        Ok(members
            .into_iter()
            .map(|(_, m)| m)
            .take(usize::from(limit))
            .collect())
    }

    async fn fetch_member(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> PlatformResult<Member> {
        self.check("fetch_member")?;
        self.lock()
            .members
            .get(&(guild_id, user_id))
            .cloned()
            .ok_or_else(|| Self::not_found(format!("member {user_id}")))
    }

    async fn fetch_roles(&self, guild_id: Snowflake) -> PlatformResult<Vec<Role>> {
        self.check("fetch_roles")?;
        Ok(self.lock().roles.get(&guild_id).cloned().unwrap_or_default())
    }

    async fn add_member_role(
        &self,
        _guild_id: Snowflake,
        user_id: Snowflake,
        role_id: Snowflake,
        _reason: &str,
    ) -> PlatformResult<()> {
        self.check("add_member_role")?;
        self.record(Call::AddRole { user_id, role_id });
        Ok(())
    }

    async fn remove_member_role(
        &self,
        _guild_id: Snowflake,
        user_id: Snowflake,
        role_id: Snowflake,
        _reason: &str,
    ) -> PlatformResult<()> {
        self.check("remove_member_role")?;
        self.record(Call::RemoveRole { user_id, role_id });
        Ok(())
    }

    async fn timeout_member(
        &self,
        _guild_id: Snowflake,
        user_id: Snowflake,
        until: DateTime<Utc>,
        _reason: &str,
    ) -> PlatformResult<()> {
        self.check("timeout_member")?;
        self.record(Call::Timeout { user_id, until });
        Ok(())
    }

    async fn add_reaction(
        &self,
        _channel_id: Snowflake,
        message_id: Snowflake,
        emoji: &str,
    ) -> PlatformResult<()> {
        self.check("add_reaction")?;
        if self.lock().failing_emojis.contains(emoji) {
            return Err(Self::not_found(format!("emoji {emoji}")));
        }
        self.record(Call::React {
            message_id,
            emoji: emoji.to_string(),
        });
        Ok(())
    }

    async fn remove_own_reaction(
        &self,
        _channel_id: Snowflake,
        message_id: Snowflake,
        emoji: &str,
    ) -> PlatformResult<()> {
        self.check("remove_own_reaction")?;
        self.record(Call::Unreact {
            message_id,
            emoji: emoji.to_string(),
        });
        Ok(())
    }

    async fn current_user_guilds(&self) -> PlatformResult<Vec<PartialGuild>> {
        self.check("current_user_guilds")?;
        let mut guilds: Vec<PartialGuild> = self
            .lock()
            .guilds
            .values()
            .map(|g| PartialGuild {
                id: g.id,
                name: g.name.clone(),
                approximate_member_count: g.approximate_member_count,
            })
            .collect();
        guilds.sort_by_key(|g| g.id);
        Ok(guilds)
    }
}
