//! Notification fan-out to connected WebSocket sessions.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

/// A push message delivered to every session.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
            timestamp: Utc::now(),
        }
    }
}

/// Broadcast hub shared by the acceptor and anything that publishes.
#[derive(Debug, Clone)]
pub struct Hub {
    sender: broadcast::Sender<Notification>,
    clients: Arc<AtomicUsize>,
}

impl Hub {
    /// `capacity` bounds how far a slow session may fall behind before it
    /// starts skipping notifications.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            clients: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Publish to every subscribed session. Returns how many received it.
    pub fn publish(&self, notification: Notification) -> usize {
        self.sender.send(notification).unwrap_or(0)
    }

    pub fn subscribe(&self) -> Subscription {
        self.clients.fetch_add(1, Ordering::SeqCst);
        Subscription {
            receiver: self.sender.subscribe(),
            clients: Arc::clone(&self.clients),
        }
    }

    /// Sessions currently connected.
    pub fn client_count(&self) -> usize {
        self.clients.load(Ordering::SeqCst)
    }

    /// Publish a `heartbeat` notification every `period`.
    pub fn spawn_heartbeat(&self, period: Duration) -> JoinHandle<()> {
        let hub = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                let clients = hub.client_count();
                if clients > 0 {
                    hub.publish(Notification::new(
                        "heartbeat",
                        json!({ "clients": clients }),
                    ));
                }
            }
        })
    }
}

/// A session's view of the hub. Dropping it unregisters the session.
#[derive(Debug)]
pub struct Subscription {
    receiver: broadcast::Receiver<Notification>,
    clients: Arc<AtomicUsize>,
}

impl Subscription {
    pub async fn recv(&mut self) -> Result<Notification, RecvError> {
        self.receiver.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.clients.fetch_sub(1, Ordering::SeqCst);
    }
}
