//! Routes gateway events to commands, the word game, or the relay client.
//!
//! Events are handled one at a time in arrival order, so guesses in a room
//! are applied in the order they were posted.

mod commands;

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::context::AppContext;
use crate::discord::{GatewayEvent, Message};
use crate::game::parse_guess;
use crate::relay::RelayMessage;

pub use commands::Command;

/// What happened to an inbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// From the bot itself, another bot, or another channel
    Ignored,
    Command,
    /// Prefixed text that is not a known command
    UnknownCommand,
    Guess,
    Forwarded,
    /// No relay client was available; the placeholder was withdrawn
    Dropped,
}

pub struct EventRouter {
    ctx: Arc<AppContext>,
}

impl EventRouter {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }

    pub async fn run(self, mut events: mpsc::Receiver<GatewayEvent>, cancel: CancellationToken) {
        info!("Event router started");
        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => break,
                event = events.recv() => event,
            };

            match event {
                Some(event) => self.handle_event(event).await,
                None => break,
            }
        }
        info!("Event router stopped");
    }

    pub async fn handle_event(&self, event: GatewayEvent) {
        match event {
            GatewayEvent::Ready(user) => self.ctx.upstream.mark_ready(user),
            GatewayEvent::MessageCreate(message) => {
                let route = self.handle_message(&message).await;
                debug!(message_id = %message.id, ?route, "Routed message");
            }
        }
    }

    pub async fn handle_message(&self, message: &Message) -> Route {
        if !self.is_relevant(message) {
            return Route::Ignored;
        }

        let room_id = message.channel_id;
        let prefix = self.ctx.config.bot.command_prefix.as_str();

        if let Some(body) = message.content.strip_prefix(prefix) {
            return match Command::parse(body) {
                Some(command) => {
                    commands::execute(&self.ctx, command, room_id).await;
                    Route::Command
                }
                None => {
                    debug!(room_id = %room_id, content = %message.content, "Ignoring unknown command");
                    Route::UnknownCommand
                }
            };
        }

        if self.ctx.sessions.is_active(room_id) && parse_guess(&message.content).is_some() {
            self.ctx
                .sessions
                .apply_guess(room_id, &message.content, self.ctx.platform.as_ref())
                .await;
            self.remove_guess(message).await;
            return Route::Guess;
        }

        self.forward(message).await
    }

    /// Bots (including this one) and other channels are not routed
    fn is_relevant(&self, message: &Message) -> bool {
        if message.author.bot {
            return false;
        }
        if let Some(me) = self.ctx.upstream.current_user()
            && me.id == message.author.id
        {
            return false;
        }
        message.channel_id == self.ctx.config.bot.channel_id
    }

    /// Delete a guess to keep the channel clean
    async fn remove_guess(&self, message: &Message) {
        if let Err(e) = self
            .ctx
            .platform
            .delete_message(message.channel_id, message.id, None)
            .await
        {
            if e.is_forbidden() {
                warn!(room_id = %message.channel_id, "Missing permission to delete guess");
            } else {
                warn!(room_id = %message.channel_id, error = %e, "Failed to delete guess");
            }
        }
    }

    async fn forward(&self, message: &Message) -> Route {
        let room_id = message.channel_id;
        let author = message.author_display_name();
        info!(room_id = %room_id, author = %author, "Forwarding message to relay client");

        let platform = self.ctx.platform.as_ref();
        let placeholder = match platform
            .send_message(room_id, &self.ctx.config.bot.placeholder_text)
            .await
        {
            Ok(placeholder) => placeholder,
            Err(e) => {
                warn!(room_id = %room_id, error = %e, "Failed to post placeholder");
                return Route::Dropped;
            }
        };

        let payload = RelayMessage::forwarded(author, room_id, &message.content, placeholder.id);
        match self.ctx.relay.send(&payload) {
            Ok(()) => Route::Forwarded,
            Err(e) => {
                warn!(room_id = %room_id, error = %e, "Cannot forward message");
                if let Err(e) = platform
                    .delete_message(room_id, placeholder.id, None)
                    .await
                {
                    warn!(room_id = %room_id, error = %e, "Failed to withdraw placeholder");
                }
                Route::Dropped
            }
        }
    }
}
