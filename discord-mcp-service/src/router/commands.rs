//! Prefixed chat commands.

use tracing::{debug, warn};

use crate::context::AppContext;
use crate::discord::Snowflake;
use crate::error::RegistryError;

pub const ALREADY_ACTIVE_REPLY: &str =
    "A game is already in progress in this channel! Use `!hangman stop` to end it.";
pub const STOPPED_REPLY: &str = "Hangman game stopped.";
pub const NOTHING_TO_STOP_REPLY: &str = "No active game to stop in this channel.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    StartGame,
    StopGame,
}

impl Command {
    /// Parse the text following the command prefix
    pub fn parse(body: &str) -> Option<Self> {
        let mut words = body.split_whitespace();
        let name = words.next()?;
        if !name.eq_ignore_ascii_case("hangman") {
            return None;
        }

        match words.next().map(str::to_ascii_lowercase).as_deref() {
            None | Some("start") => Some(Command::StartGame),
            Some("stop") => Some(Command::StopGame),
            Some(_) => None,
        }
    }
}

pub async fn execute(ctx: &AppContext, command: Command, room_id: Snowflake) {
    let platform = ctx.platform.as_ref();

    let reply = match command {
        Command::StartGame => match ctx.sessions.start(room_id, platform).await {
            Ok(_) => None,
            Err(RegistryError::AlreadyActive { .. }) => Some(ALREADY_ACTIVE_REPLY),
            Err(e) => {
                warn!(room_id = %room_id, error = %e, "Could not start word game");
                None
            }
        },
        Command::StopGame => match ctx.sessions.stop(room_id) {
            Ok(()) => Some(STOPPED_REPLY),
            Err(_) => Some(NOTHING_TO_STOP_REPLY),
        },
    };

    if let Some(reply) = reply {
        debug!(room_id = %room_id, ?command, "Replying to command");
        if let Err(e) = platform.send_message(room_id, reply).await {
            warn!(room_id = %room_id, error = %e, "Failed to reply to command");
        }
    }
}
