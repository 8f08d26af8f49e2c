//! The single live relay connection.

use std::sync::{Mutex, MutexGuard};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::messages::RelayMessage;
use crate::error::RelayError;

/// Outbound half of an accepted connection
struct RelayConnection {
    id: Uuid,
    tx: mpsc::UnboundedSender<String>,
}

/// Holds at most one relay connection. A newly accepted client replaces the
/// current one; the replaced client's outbound queue is closed.
#[derive(Default)]
pub struct RelayChannel {
    current: Mutex<Option<RelayConnection>>,
}

impl RelayChannel {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<RelayConnection>> {
        self.current.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Install a new connection and greet it. Returns the connection id.
    pub fn accept(&self, tx: mpsc::UnboundedSender<String>) -> Uuid {
        let id = Uuid::new_v4();
        let greeting = RelayMessage::Connection { is_active: true };

        match serde_json::to_string(&greeting) {
            Ok(json) => {
                if tx.send(json).is_err() {
                    warn!(connection_id = %id, "Relay client went away before greeting");
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize relay greeting"),
        }

        if let Some(previous) = self.lock().replace(RelayConnection { id, tx }) {
            info!(
                previous = %previous.id,
                connection_id = %id,
                "Relay client replaced"
            );
        } else {
            info!(connection_id = %id, "Relay client connected");
        }
        id
    }

    /// Queue a message for the current client
    pub fn send(&self, message: &RelayMessage) -> Result<(), RelayError> {
        let json = serde_json::to_string(message)?;

        let mut current = self.lock();
        let connection = current.as_ref().ok_or(RelayError::NotConnected)?;
        let connection_id = connection.id;

        if connection.tx.send(json).is_err() {
            *current = None;
            return Err(RelayError::SendFailed { connection_id });
        }
        debug!(connection_id = %connection_id, "Queued relay message");
        Ok(())
    }

    /// Clear the handle if it still belongs to `id`. Returns whether it did.
    pub fn on_disconnect(&self, id: Uuid) -> bool {
        let mut current = self.lock();
        if current.as_ref().is_some_and(|c| c.id == id) {
            *current = None;
            info!(connection_id = %id, "Relay client disconnected");
            true
        } else {
            debug!(connection_id = %id, "Stale relay connection closed");
            false
        }
    }

    #[cfg(test)]
    pub fn is_connected(&self) -> bool {
        self.lock().is_some()
    }

    /// Drop the current connection, closing its outbound queue
    pub fn close(&self) {
        self.lock().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ping_message() -> RelayMessage {
        RelayMessage::Pong { timestamp: 1 }
    }

    #[test]
    fn test_send_without_connection() {
        let relay = RelayChannel::new();
        assert!(!relay.is_connected());
        assert!(matches!(
            relay.send(&ping_message()),
            Err(RelayError::NotConnected)
        ));
    }

    #[test]
    fn test_accept_sends_greeting() {
        let relay = RelayChannel::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        relay.accept(tx);

        assert!(relay.is_connected());
        let greeting = rx.try_recv().unwrap();
        assert_eq!(greeting, r#"{"type":"connection","isActive":true}"#);
    }

    #[test]
    fn test_send_reaches_current_client() {
        let relay = RelayChannel::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        relay.accept(tx);
        rx.try_recv().unwrap();

        tokio_test::assert_ok!(relay.send(&ping_message()));
        assert_eq!(rx.try_recv().unwrap(), r#"{"type":"pong","timestamp":1}"#);
    }

    #[test]
    fn test_new_client_replaces_old() {
        let relay = RelayChannel::new();
        let (old_tx, mut old_rx) = mpsc::unbounded_channel();
        let old_id = relay.accept(old_tx);
        let (new_tx, mut new_rx) = mpsc::unbounded_channel();
        let new_id = relay.accept(new_tx);
        old_rx.try_recv().unwrap();
        new_rx.try_recv().unwrap();

        relay.send(&ping_message()).unwrap();
        assert!(new_rx.try_recv().is_ok());
        // Old queue is closed once its sender is dropped
        assert!(matches!(
            old_rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));

        // A late disconnect from the replaced client must not clear the new one
        assert!(!relay.on_disconnect(old_id));
        assert!(relay.is_connected());
        assert!(relay.on_disconnect(new_id));
        assert!(!relay.is_connected());
    }

    #[test]
    fn test_send_after_disconnect() {
        let relay = RelayChannel::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = relay.accept(tx);
        relay.on_disconnect(id);
        assert!(matches!(
            relay.send(&ping_message()),
            Err(RelayError::NotConnected)
        ));
    }

    #[test]
    fn test_send_to_dropped_receiver_clears_handle() {
        let relay = RelayChannel::new();
        let (tx, rx) = mpsc::unbounded_channel();
        let id = relay.accept(tx);
        drop(rx);

        match relay.send(&ping_message()) {
            Err(RelayError::SendFailed { connection_id }) => assert_eq!(connection_id, id),
            other => panic!("Expected SendFailed, got {other:?}"),
        }
        assert!(!relay.is_connected());
    }
}
