//! WebSocket push channel.
//!
//! The dispatcher hands every upgrade attempt to the [`Acceptor`], which
//! completes the handshake and attaches the session to the [`Hub`].

mod hub;
mod session;

use axum::{extract::ws::WebSocketUpgrade, response::Response};

pub use hub::{Hub, Notification, Subscription};

/// Notifications a session may fall behind by before it skips ahead.
pub const HUB_CAPACITY: usize = 256;

/// Completes WebSocket handshakes on behalf of the dispatcher.
#[derive(Debug, Clone)]
pub struct Acceptor {
    hub: Hub,
}

impl Acceptor {
    pub fn new(hub: Hub) -> Self {
        Self { hub }
    }

    pub fn accept(&self, upgrade: WebSocketUpgrade, path: String) -> Response {
        let hub = self.hub.clone();
        upgrade.on_upgrade(move |socket| session::run(socket, hub, path))
    }
}
