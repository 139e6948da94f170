//! A single WebSocket session.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use crate::ws::hub::{Hub, Notification};

/// Drive a session until the client leaves or the hub shuts down.
pub async fn run(socket: WebSocket, hub: Hub, path: String) {
    let client_id = Uuid::new_v4();
    let mut subscription = hub.subscribe();
    let (mut sink, mut stream) = socket.split();

    tracing::info!(
        %client_id,
        %path,
        clients = hub.client_count(),
        "WebSocket client connected"
    );

    let hello = Notification::new("connected", json!({ "clientId": client_id }));
    if !send(&mut sink, &hello).await {
        return;
    }

    loop {
        tokio::select! {
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    let pong = Notification::new("pong", Value::Null);
                    if is_ping(&text) && !send(&mut sink, &pong).await {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(%client_id, error = %e, "WebSocket receive failed");
                    break;
                }
            },
            notification = subscription.recv() => match notification {
                Ok(notification) => {
                    if !send(&mut sink, &notification).await {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(%client_id, skipped, "WebSocket client lagging");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    drop(subscription);
    tracing::info!(%client_id, clients = hub.client_count(), "WebSocket client disconnected");
}

/// Returns false once the peer can no longer be written to.
async fn send(sink: &mut SplitSink<WebSocket, Message>, notification: &Notification) -> bool {
    let text = match serde_json::to_string(notification) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, kind = %notification.kind, "Failed to encode");
            return true;
        }
    };
    sink.send(Message::Text(text)).await.is_ok()
}

/// `ping` as plain text or `{"type":"ping"}`.
fn is_ping(text: &str) -> bool {
    if text.trim() == "ping" {
        return true;
    }
    serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|value| value.get("type").and_then(Value::as_str).map(|t| t == "ping"))
        .unwrap_or(false)
}
