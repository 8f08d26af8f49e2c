//! Minimal Discord gateway consumer.
//!
//! Keeps one gateway session alive (HELLO, IDENTIFY, heartbeats) and turns the
//! two dispatches the bridge cares about, READY and MESSAGE_CREATE, into
//! [`GatewayEvent`]s on an mpsc channel. Sessions are not resumed: any drop
//! results in a fresh IDENTIFY after a backoff delay.

use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::{Instant, interval_at};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::models::{Message, User};
use crate::config::DiscordConfig;
use crate::error::PlatformError;

const OP_DISPATCH: u8 = 0;
const OP_HEARTBEAT: u8 = 1;
const OP_IDENTIFY: u8 = 2;
const OP_RECONNECT: u8 = 7;
const OP_INVALID_SESSION: u8 = 9;
const OP_HELLO: u8 = 10;
const OP_HEARTBEAT_ACK: u8 = 11;

const INTENT_GUILDS: u64 = 1 << 0;
const INTENT_GUILD_MEMBERS: u64 = 1 << 1;
const INTENT_GUILD_MESSAGES: u64 = 1 << 9;
const INTENT_GUILD_MESSAGE_REACTIONS: u64 = 1 << 10;
const INTENT_MESSAGE_CONTENT: u64 = 1 << 15;

/// Intents requested on IDENTIFY
pub const INTENTS: u64 = INTENT_GUILDS
    | INTENT_GUILD_MEMBERS
    | INTENT_GUILD_MESSAGES
    | INTENT_GUILD_MESSAGE_REACTIONS
    | INTENT_MESSAGE_CONTENT;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Events delivered to the event router
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    /// Session established; carries the bot's own user
    Ready(User),
    MessageCreate(Box<Message>),
}

#[derive(Debug, Deserialize)]
struct GatewayPayload {
    op: u8,
    #[serde(default)]
    d: serde_json::Value,
    #[serde(default)]
    s: Option<u64>,
    #[serde(default)]
    t: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Hello {
    heartbeat_interval: u64,
}

#[derive(Debug, Deserialize)]
struct Ready {
    user: User,
}

/// How a gateway session ended
#[derive(Debug, PartialEq, Eq)]
enum SessionEnd {
    /// Reconnect with a fresh session
    Reconnect,
    /// Event receiver dropped; nothing left to deliver to
    ReceiverClosed,
    /// Unrecoverable close code (bad token, disallowed intents)
    Fatal(u16),
}

pub struct GatewayListener {
    url: String,
    token: String,
}

impl GatewayListener {
    pub fn new(config: &DiscordConfig) -> Self {
        Self {
            url: config.gateway_url.clone(),
            token: config.token.clone(),
        }
    }

    /// Run gateway sessions until cancelled, reconnecting with backoff.
    pub async fn run(self, events: mpsc::Sender<GatewayEvent>, cancel: CancellationToken) {
        let mut backoff = INITIAL_BACKOFF;

        loop {
            let result = tokio::select! {
                _ = cancel.cancelled() => break,
                result = self.run_session(&events) => result,
            };

            match result {
                Ok(SessionEnd::Reconnect) => {
                    info!("Gateway requested reconnect");
                    backoff = INITIAL_BACKOFF;
                }
                Ok(SessionEnd::ReceiverClosed) => {
                    debug!("Gateway event receiver closed");
                    break;
                }
                Ok(SessionEnd::Fatal(code)) => {
                    error!(code, "Gateway closed with an unrecoverable code");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, backoff_secs = backoff.as_secs(), "Gateway session failed");
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(backoff) => {}
            }
            backoff = (backoff * 2).min(MAX_BACKOFF);
        }

        info!("Gateway listener stopped");
    }

    async fn run_session(
        &self,
        events: &mpsc::Sender<GatewayEvent>,
    ) -> Result<SessionEnd, PlatformError> {
        let (socket, _) = tokio_tungstenite::connect_async(self.url.as_str())
            .await
            .map_err(gateway_error)?;
        let (mut sink, mut stream) = socket.split();

        // First frame on a new connection is always HELLO
        let hello = loop {
            match stream.next().await {
                Some(Ok(WsMessage::Text(text))) => {
                    let payload: GatewayPayload =
                        serde_json::from_str(&text).map_err(PlatformError::InvalidResponse)?;
                    if payload.op != OP_HELLO {
                        return Err(PlatformError::Gateway {
                            message: format!("expected HELLO, got op {}", payload.op),
                        });
                    }
                    break serde_json::from_value::<Hello>(payload.d)
                        .map_err(PlatformError::InvalidResponse)?;
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(gateway_error(e)),
                None => return Ok(SessionEnd::Reconnect),
            }
        };

        let period = Duration::from_millis(hello.heartbeat_interval.max(1));
        debug!(interval_ms = hello.heartbeat_interval, "Gateway HELLO received");

        sink.send(WsMessage::Text(identify_payload(&self.token).to_string()))
            .await
            .map_err(gateway_error)?;

        let mut heartbeat = interval_at(Instant::now() + period, period);
        let mut sequence: Option<u64> = None;
        let mut acked = true;

        loop {
            tokio::select! {
                _ = heartbeat.tick() => {
                    if !acked {
                        warn!("Gateway heartbeat not acknowledged, reconnecting");
                        return Ok(SessionEnd::Reconnect);
                    }
                    acked = false;
                    sink.send(WsMessage::Text(heartbeat_payload(sequence).to_string()))
                        .await
                        .map_err(gateway_error)?;
                }
                frame = stream.next() => {
                    let text = match frame {
                        Some(Ok(WsMessage::Text(text))) => text,
                        Some(Ok(WsMessage::Close(close))) => {
                            let code = close.map(|c| u16::from(c.code)).unwrap_or(1000);
                            if is_fatal_close(code) {
                                return Ok(SessionEnd::Fatal(code));
                            }
                            info!(code, "Gateway connection closed");
                            return Ok(SessionEnd::Reconnect);
                        }
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => return Err(gateway_error(e)),
                        None => return Ok(SessionEnd::Reconnect),
                    };

                    let payload: GatewayPayload = match serde_json::from_str(&text) {
                        Ok(payload) => payload,
                        Err(e) => {
                            warn!(error = %e, "Failed to parse gateway payload");
                            continue;
                        }
                    };

                    if payload.s.is_some() {
                        sequence = payload.s;
                    }

                    match payload.op {
                        OP_DISPATCH => {
                            let Some(event) = parse_dispatch(payload.t.as_deref(), payload.d) else {
                                continue;
                            };
                            if !forward_event(events, event) {
                                return Ok(SessionEnd::ReceiverClosed);
                            }
                        }
                        OP_HEARTBEAT => {
                            sink.send(WsMessage::Text(heartbeat_payload(sequence).to_string()))
                                .await
                                .map_err(gateway_error)?;
                        }
                        OP_HEARTBEAT_ACK => acked = true,
                        OP_RECONNECT | OP_INVALID_SESSION => {
                            let _ = sink.send(WsMessage::Close(None)).await;
                            return Ok(SessionEnd::Reconnect);
                        }
                        other => debug!(op = other, "Ignoring gateway opcode"),
                    }
                }
            }
        }
    }
}

/// Convert a dispatch payload into a router event, if it is one we consume
fn parse_dispatch(event_type: Option<&str>, data: serde_json::Value) -> Option<GatewayEvent> {
    match event_type? {
        "READY" => match serde_json::from_value::<Ready>(data) {
            Ok(ready) => Some(GatewayEvent::Ready(ready.user)),
            Err(e) => {
                warn!(error = %e, "Failed to parse READY payload");
                None
            }
        },
        "MESSAGE_CREATE" => match serde_json::from_value::<Message>(data) {
            Ok(message) => Some(GatewayEvent::MessageCreate(Box::new(message))),
            Err(e) => {
                warn!(error = %e, "Failed to parse MESSAGE_CREATE payload");
                None
            }
        },
        _ => None,
    }
}

fn identify_payload(token: &str) -> serde_json::Value {
    serde_json::json!({
        "op": OP_IDENTIFY,
        "d": {
            "token": token,
            "intents": INTENTS,
            "properties": {
                "os": std::env::consts::OS,
                "browser": "discord-mcp-service",
                "device": "discord-mcp-service"
            }
        }
    })
}

fn heartbeat_payload(sequence: Option<u64>) -> serde_json::Value {
    serde_json::json!({ "op": OP_HEARTBEAT, "d": sequence })
}

/// Close codes after which reconnecting cannot succeed
fn is_fatal_close(code: u16) -> bool {
    matches!(code, 4004 | 4010..=4014)
}

fn gateway_error(e: tokio_tungstenite::tungstenite::Error) -> PlatformError {
    PlatformError::Gateway {
        message: e.to_string(),
    }
}

/// Hand an event to the router without stalling heartbeats. A full buffer
/// drops the event; returns false once the router is gone.
fn forward_event(events: &mpsc::Sender<GatewayEvent>, event: GatewayEvent) -> bool {
    match events.try_send(event) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            warn!("Event router is behind; dropping gateway event");
            true
        }
        Err(TrySendError::Closed(_)) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intents_include_message_content() {
        assert_ne!(INTENTS & INTENT_MESSAGE_CONTENT, 0);
        assert_ne!(INTENTS & INTENT_GUILD_MEMBERS, 0);
        assert_eq!(INTENTS, 34307);
    }

    #[test]
    fn test_identify_payload_shape() {
        let payload = identify_payload("secret");
        assert_eq!(payload["op"], 2);
        assert_eq!(payload["d"]["token"], "secret");
        assert_eq!(payload["d"]["intents"], INTENTS);
    }

    #[test]
    fn test_heartbeat_payload_sequence() {
        let first = heartbeat_payload(None);
        assert_eq!(first["op"], 1);
        assert!(first["d"].is_null());
        assert_eq!(heartbeat_payload(Some(7))["d"], 7);
    }

    #[test]
    fn test_parse_ready_dispatch() {
        let data = serde_json::json!({
            "v": 10,
            "session_id": "abc",
            "user": {"id": "100", "username": "bridge-bot", "bot": true}
        });
        match parse_dispatch(Some("READY"), data) {
            Some(GatewayEvent::Ready(user)) => {
                assert_eq!(user.id.get(), 100);
                assert!(user.bot);
            }
            other => panic!("Expected Ready, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_message_create_dispatch() {
        let data = serde_json::json!({
            "id": "5", "channel_id": "42", "guild_id": "9",
            "content": "hello",
            "timestamp": "2024-01-01T12:00:00.000000+00:00",
            "author": {"id": "7", "username": "alice"},
            "member": {"nick": "Al"}
        });
        match parse_dispatch(Some("MESSAGE_CREATE"), data) {
            Some(GatewayEvent::MessageCreate(message)) => {
                assert_eq!(message.channel_id.get(), 42);
                assert_eq!(message.content, "hello");
                assert_eq!(message.author_display_name(), "Al");
            }
            other => panic!("Expected MessageCreate, got {other:?}"),
        }
    }

    #[test]
    fn test_unhandled_dispatch_is_ignored() {
        assert!(parse_dispatch(Some("TYPING_START"), serde_json::json!({})).is_none());
        assert!(parse_dispatch(None, serde_json::json!({})).is_none());
    }

    #[test]
    fn test_fatal_close_codes() {
        assert!(is_fatal_close(4004));
        assert!(is_fatal_close(4014));
        assert!(!is_fatal_close(4000));
        assert!(!is_fatal_close(1000));
    }

    fn ready_event(id: u64) -> GatewayEvent {
        GatewayEvent::Ready(crate::discord::testing::user(id, "bridge-bot"))
    }

    #[test]
    fn test_full_buffer_drops_event_without_blocking() {
        let (tx, mut rx) = mpsc::channel(1);
        assert!(forward_event(&tx, ready_event(1)));
        assert!(forward_event(&tx, ready_event(2)));

        match rx.try_recv() {
            Ok(GatewayEvent::Ready(user)) => assert_eq!(user.id.get(), 1),
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_closed_router_ends_session() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        assert!(!forward_event(&tx, ready_event(1)));
    }
}
