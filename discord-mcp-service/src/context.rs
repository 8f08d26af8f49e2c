//! Shared application state.
//!
//! Built once in `main` and handed to the event router, the tool dispatcher
//! and the relay endpoint. Each piece of mutable state is only changed
//! through its owner's methods.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tracing::info;

use crate::config::StaticConfig;
use crate::discord::{ChatPlatform, User};
use crate::game::SessionRegistry;
use crate::relay::RelayChannel;

/// Upstream chat client state, set when the gateway reports READY
#[derive(Default)]
pub struct UpstreamState {
    user: ArcSwapOption<User>,
}

impl UpstreamState {
    pub fn mark_ready(&self, user: User) {
        info!(user_id = %user.id, username = %user.username, "Discord client ready");
        self.user.store(Some(Arc::new(user)));
    }

    pub fn is_ready(&self) -> bool {
        self.user.load().is_some()
    }

    /// The bot's own user, once ready
    pub fn current_user(&self) -> Option<Arc<User>> {
        self.user.load_full()
    }
}

pub struct AppContext {
    pub config: StaticConfig,
    pub platform: Arc<dyn ChatPlatform>,
    pub sessions: SessionRegistry,
    pub relay: Arc<RelayChannel>,
    pub upstream: UpstreamState,
}

impl AppContext {
    pub fn new(config: StaticConfig, platform: Arc<dyn ChatPlatform>) -> Self {
        Self {
            config,
            platform,
            sessions: SessionRegistry::new(),
            relay: Arc::new(RelayChannel::new()),
            upstream: UpstreamState::default(),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::config::{BotConfig, DiscordConfig, RelayConfig};
    use crate::discord::Snowflake;
    use crate::discord::testing::FakePlatform;

    pub const ROOM: Snowflake = Snowflake::new(42);
    pub const BOT_ID: Snowflake = Snowflake::new(1);

    pub fn test_config() -> StaticConfig {
        StaticConfig {
            relay: RelayConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            discord: DiscordConfig {
                token: "test-token".to_string(),
                api_base_url: "http://127.0.0.1:9/api/v10".to_string(),
                gateway_url: "ws://127.0.0.1:9/".to_string(),
                request_timeout_secs: 1,
            },
            bot: BotConfig {
                command_prefix: "!".to_string(),
                placeholder_text: ">🤔Thinking...".to_string(),
                channel_var: "TEST_CHANNEL".to_string(),
                channel_id: ROOM,
            },
        }
    }

    /// Context over a fake platform; the returned handle inspects its calls
    pub fn test_context() -> (Arc<AppContext>, Arc<FakePlatform>) {
        let platform = Arc::new(FakePlatform::new());
        let ctx = AppContext::new(test_config(), platform.clone());
        (Arc::new(ctx), platform)
    }

    pub fn ready_context() -> (Arc<AppContext>, Arc<FakePlatform>) {
        let (ctx, platform) = test_context();
        let mut bot = crate::discord::testing::user(BOT_ID.get(), "bridge-bot");
        bot.bot = true;
        ctx.upstream.mark_ready(bot);
        (ctx, platform)
    }
}
