//! Hangman-style word game played in the bridged channel.
//!
//! [`WordGuess`] is the pure per-round state machine; [`SessionRegistry`]
//! owns the rounds, one per room, and keeps their status boards up to date.

pub mod registry;
pub mod session;
pub mod words;

pub use registry::SessionRegistry;
pub use session::parse_guess;
