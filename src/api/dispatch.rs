//! Connection dispatch: WebSocket upgrades vs. plain HTTP.
//!
//! Both share the one listener. An upgrade attempt is recognised by its
//! `Upgrade: websocket` header and handed to the acceptor on any path,
//! skipping CORS, the bearer gate (unless upgrade guarding is on) and the
//! route table.

use axum::{
    body::Body,
    extract::{ws::WebSocketUpgrade, FromRequestParts, Request, State},
    http::{header::UPGRADE, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::{AuthGate, InboundRequest};
use crate::error::GatewayError;
use crate::ws::Acceptor;

/// State of the dispatch middleware.
#[derive(Clone)]
pub struct Dispatcher {
    gate: AuthGate,
    acceptor: Acceptor,
}

impl Dispatcher {
    pub fn new(gate: AuthGate, acceptor: Acceptor) -> Self {
        Self { gate, acceptor }
    }
}

/// True when the request asks to switch to the WebSocket protocol.
pub fn is_upgrade_request(headers: &HeaderMap) -> bool {
    headers
        .get(UPGRADE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("websocket"))
}

/// Outermost pipeline stage.
pub async fn dispatch(
    State(dispatcher): State<Dispatcher>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !is_upgrade_request(request.headers()) {
        return next.run(request).await;
    }

    let decision = dispatcher.gate.decide_upgrade(&InboundRequest::of(&request));
    if decision.is_rejected() {
        tracing::warn!(path = %request.uri().path(), "Rejected WebSocket upgrade");
        return GatewayError::Unauthorized.into_response();
    }

    let path = request.uri().path().to_string();
    let (mut parts, _body) = request.into_parts();
    match WebSocketUpgrade::from_request_parts(&mut parts, &()).await {
        Ok(upgrade) => dispatcher.acceptor.accept(upgrade, path),
        Err(rejection) => {
            tracing::debug!(%path, error = %rejection, "Malformed WebSocket handshake");
            rejection.into_response()
        }
    }
}
