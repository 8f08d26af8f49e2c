//! Local WebSocket relay to the automation client.
//!
//! Exactly one client is served at a time. Chat messages that are neither
//! commands nor guesses are forwarded to it, tagged with the id of a
//! placeholder message the client is expected to edit with its answer.

pub mod channel;
pub mod messages;
pub mod server;

pub use channel::RelayChannel;
pub use messages::RelayMessage;
pub use server::serve;
