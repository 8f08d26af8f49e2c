//! Relay wire messages.
//!
//! JSON objects discriminated by a `type` field. Ids are sent as strings.

use serde::{Deserialize, Serialize};

use crate::discord::Snowflake;

/// Messages sent to the relay client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelayMessage {
    /// Sent once when a client is accepted
    Connection {
        #[serde(rename = "isActive")]
        is_active: bool,
    },
    /// A chat message forwarded for handling
    Message {
        content: String,
        #[serde(rename = "channelId")]
        channel_id: String,
        #[serde(rename = "thinkingMessageId")]
        thinking_message_id: String,
        #[serde(rename = "authorName")]
        author_name: String,
    },
    /// Reply to a client ping
    Pong { timestamp: u64 },
}

impl RelayMessage {
    /// Build the forwarded payload for a chat message.
    ///
    /// The instruction text tells the automation client to answer by editing
    /// the placeholder rather than replying in its own UI.
    pub fn forwarded(
        author_name: &str,
        channel_id: Snowflake,
        text: &str,
        placeholder_id: Snowflake,
    ) -> Self {
        let content = format!(
            "MESSAGE FROM DISCORD_USER '{author_name}' in DISCORD_CHANNEL '{channel_id}' \
             MSG: \"{text}\"\n\n\
             IMPORTANT: You must communicate your response by using the 'edit_message' tool \
             on the placeholder message with ID: {placeholder_id}. \
             Do not use 'ask_followup_question' or 'attempt_completion'. \
             The user is on Discord and will only see the edited message."
        );

        RelayMessage::Message {
            content,
            channel_id: channel_id.to_string(),
            thinking_message_id: placeholder_id.to_string(),
            author_name: author_name.to_string(),
        }
    }
}

/// Messages received from the relay client
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Keepalive ping
    Ping,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_message_json() {
        let json = serde_json::to_value(RelayMessage::Connection { is_active: true }).unwrap();
        assert_eq!(json, serde_json::json!({"type": "connection", "isActive": true}));
    }

    #[test]
    fn test_forwarded_message_json() {
        let msg = RelayMessage::forwarded(
            "alice",
            Snowflake::new(42),
            "hello there",
            Snowflake::new(99),
        );
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["type"], "message");
        assert_eq!(json["channelId"], "42");
        assert_eq!(json["thinkingMessageId"], "99");
        assert_eq!(json["authorName"], "alice");

        let content = json["content"].as_str().unwrap();
        assert!(content.starts_with(
            "MESSAGE FROM DISCORD_USER 'alice' in DISCORD_CHANNEL '42' MSG: \"hello there\"\n\n"
        ));
        assert!(content.contains("placeholder message with ID: 99."));
        assert!(content.ends_with("will only see the edited message."));
    }

    #[test]
    fn test_client_ping_parses() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Ping));
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"bogus"}"#).is_err());
    }
}
