//! Per-room game sessions.
//!
//! A room has at most one session. Slots are claimed through the map's entry
//! API so concurrent starts cannot both succeed, and no map guard is held
//! while awaiting the chat platform.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

use super::session::{GameStatus, WordGuess, parse_guess};
use crate::discord::{ChatPlatform, Snowflake};
use crate::error::RegistryError;

/// Where a session's status board was posted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusHandle {
    pub channel_id: Snowflake,
    pub message_id: Snowflake,
}

struct SessionEntry {
    game: WordGuess,
    status: Option<StatusHandle>,
    /// Distinguishes this entry from a later session in the same room
    generation: u64,
}

#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<Snowflake, SessionEntry>,
    next_generation: AtomicU64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a round with a random word and post its board
    pub async fn start(
        &self,
        room_id: Snowflake,
        platform: &dyn ChatPlatform,
    ) -> Result<StatusHandle, RegistryError> {
        self.start_with_game(room_id, WordGuess::new(), platform)
            .await
    }

    pub async fn start_with_game(
        &self,
        room_id: Snowflake,
        game: WordGuess,
        platform: &dyn ChatPlatform,
    ) -> Result<StatusHandle, RegistryError> {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let board = match self.sessions.entry(room_id) {
            Entry::Occupied(_) => return Err(RegistryError::AlreadyActive { room_id }),
            Entry::Vacant(slot) => {
                let board = game.render();
                slot.insert(SessionEntry {
                    game,
                    status: None,
                    generation,
                });
                board
            }
        };

        let posted = match platform.send_message(room_id, &board).await {
            Ok(message) => message,
            Err(e) => {
                self.sessions
                    .remove_if(&room_id, |_, entry| entry.generation == generation);
                return Err(RegistryError::Publish(e));
            }
        };

        let handle = StatusHandle {
            channel_id: posted.channel_id,
            message_id: posted.id,
        };
        if let Some(mut entry) = self.sessions.get_mut(&room_id)
            && entry.generation == generation
        {
            entry.status = Some(handle);
        }

        info!(room_id = %room_id, "Started word game");
        Ok(handle)
    }

    pub fn stop(&self, room_id: Snowflake) -> Result<(), RegistryError> {
        match self.sessions.remove(&room_id) {
            Some(_) => {
                info!(room_id = %room_id, "Stopped word game");
                Ok(())
            }
            None => Err(RegistryError::NoActiveSession { room_id }),
        }
    }

    /// Apply a guess and refresh the board.
    ///
    /// Returns `None` without side effects when the room has no session or the
    /// text is not a single letter. A finished round is removed before the
    /// board edit is awaited.
    pub async fn apply_guess(
        &self,
        room_id: Snowflake,
        text: &str,
        platform: &dyn ChatPlatform,
    ) -> Option<GameStatus> {
        let letter = parse_guess(text)?;

        let (board, handle, status, generation) = {
            let mut entry = self.sessions.get_mut(&room_id)?;
            let outcome = entry.game.guess(letter);
            debug!(room_id = %room_id, letter = %letter, ?outcome, "Applied guess");
            (
                entry.game.render(),
                entry.status,
                entry.game.status(),
                entry.generation,
            )
        };

        if status.is_terminal() {
            self.sessions
                .remove_if(&room_id, |_, entry| entry.generation == generation);
            info!(room_id = %room_id, ?status, "Word game finished");
        }

        if let Some(handle) = handle
            && let Err(e) = platform
                .edit_message(handle.channel_id, handle.message_id, &board)
                .await
        {
            warn!(room_id = %room_id, error = %e, "Failed to update game board");
        }

        Some(status)
    }

    pub fn is_active(&self, room_id: Snowflake) -> bool {
        self.sessions.contains_key(&room_id)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn game(&self, room_id: Snowflake) -> Option<WordGuess> {
        self.sessions.get(&room_id).map(|entry| entry.game.clone())
    }
}
