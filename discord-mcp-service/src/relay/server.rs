//! Relay WebSocket endpoint.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::channel::RelayChannel;
use super::messages::{ClientMessage, RelayMessage};
use crate::config::RelayConfig;

/// Build the relay router; the upgrade is served at `/`
pub fn router(relay: Arc<RelayChannel>) -> Router {
    Router::new()
        .route("/", get(ws_upgrade))
        .layer(TraceLayer::new_for_http())
        .with_state(relay)
}

/// Bind the endpoint and serve until cancelled
pub async fn serve(
    config: &RelayConfig,
    relay: Arc<RelayChannel>,
    cancel: CancellationToken,
) -> std::io::Result<()> {
    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr).await?;
    info!(address = %addr, "Relay endpoint listening");

    serve_on(listener, relay, cancel).await
}

pub(crate) async fn serve_on(
    listener: TcpListener,
    relay: Arc<RelayChannel>,
    cancel: CancellationToken,
) -> std::io::Result<()> {
    let shutdown_relay = relay.clone();
    axum::serve(listener, router(relay))
        .with_graceful_shutdown(async move {
            cancel.cancelled().await;
            // Close the live socket so graceful shutdown does not wait on it
            shutdown_relay.close();
        })
        .await?;

    info!("Relay endpoint stopped");
    Ok(())
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(relay): State<Arc<RelayChannel>>) -> Response {
    ws.on_upgrade(move |socket| handle_relay_connection(socket, relay))
}

/// Drive one relay client until it disconnects or is replaced
async fn handle_relay_connection(socket: WebSocket, relay: Arc<RelayChannel>) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (msg_tx, mut msg_rx) = mpsc::unbounded_channel::<String>();
    // Replies must not keep the queue open once the relay drops this client
    let reply_tx = msg_tx.downgrade();

    let connection_id = relay.accept(msg_tx);

    let send_task = tokio::spawn(async move {
        while let Some(json) = msg_rx.recv().await {
            if ws_tx.send(Message::Text(json.into())).await.is_err() {
                return;
            }
        }
        // Queue closed: the connection was replaced or shut down
        let _ = ws_tx.send(Message::Close(None)).await;
    });

    while let Some(result) = ws_rx.next().await {
        match result {
            Ok(Message::Text(text)) => handle_client_message(connection_id, &reply_tx, &text),
            Ok(Message::Close(_)) => {
                debug!(connection_id = %connection_id, "Relay client sent close");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                error!(connection_id = %connection_id, error = %e, "Relay socket error");
                break;
            }
        }
    }

    relay.on_disconnect(connection_id);
    send_task.abort();
}

fn handle_client_message(
    connection_id: Uuid,
    reply_tx: &mpsc::WeakUnboundedSender<String>,
    text: &str,
) {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::Ping) => {
            let timestamp = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0);
            let sent = serde_json::to_string(&RelayMessage::Pong { timestamp })
                .ok()
                .zip(reply_tx.upgrade())
                .is_some_and(|(json, tx)| tx.send(json).is_ok());
            if !sent {
                warn!(connection_id = %connection_id, "Failed to answer relay ping");
            }
        }
        Err(e) => {
            warn!(
                connection_id = %connection_id,
                error = %e,
                text = %text,
                "Ignoring unrecognised relay message"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{SinkExt, StreamExt};
    use std::time::Duration;
    use tokio_tungstenite::tungstenite::Message as ClientFrame;

    async fn start() -> (Arc<RelayChannel>, String, CancellationToken, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}/", listener.local_addr().unwrap());
        let relay = Arc::new(RelayChannel::new());
        let cancel = CancellationToken::new();
        let task = tokio::spawn({
            let relay = relay.clone();
            let cancel = cancel.clone();
            async move {
                serve_on(listener, relay, cancel).await.unwrap();
            }
        });
        (relay, url, cancel, task)
    }

    async fn next_text<S>(stream: &mut S) -> String
    where
        S: StreamExt<Item = Result<ClientFrame, tokio_tungstenite::tungstenite::Error>> + Unpin,
    {
        loop {
            let frame = tokio::time::timeout(Duration::from_secs(5), stream.next())
                .await
                .expect("timed out waiting for frame")
                .expect("stream ended")
                .expect("socket error");
            if let ClientFrame::Text(text) = frame {
                return text.to_string();
            }
        }
    }

    #[tokio::test]
    async fn test_client_receives_greeting_and_pong() {
        let (relay, url, cancel, task) = start().await;
        let (mut socket, _) = tokio_tungstenite::connect_async(url.as_str()).await.unwrap();

        let greeting = next_text(&mut socket).await;
        assert_eq!(greeting, r#"{"type":"connection","isActive":true}"#);
        assert!(relay.is_connected());

        socket
            .send(ClientFrame::Text(r#"{"type":"ping"}"#.to_string()))
            .await
            .unwrap();
        let pong: serde_json::Value = serde_json::from_str(&next_text(&mut socket).await).unwrap();
        assert_eq!(pong["type"], "pong");
        assert!(pong["timestamp"].as_u64().unwrap() > 0);

        relay.send(&RelayMessage::Pong { timestamp: 7 }).unwrap();
        assert_eq!(next_text(&mut socket).await, r#"{"type":"pong","timestamp":7}"#);

        drop(socket);
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_disconnect_clears_handle() {
        let (relay, url, cancel, _task) = start().await;
        let (mut socket, _) = tokio_tungstenite::connect_async(url.as_str()).await.unwrap();
        next_text(&mut socket).await;
        assert!(relay.is_connected());

        socket.close(None).await.unwrap();
        for _ in 0..50 {
            if !relay.is_connected() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(!relay.is_connected());
        cancel.cancel();
    }
}
