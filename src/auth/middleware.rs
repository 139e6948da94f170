//! Authentication middleware for axum.

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::{AuthDecision, AuthGate, InboundRequest};
use crate::error::GatewayError;

/// Run the bearer gate and stop the request with a 401 when it is rejected.
///
/// Expects `Authorization: Bearer <token>` header unless the request is the
/// health check or no secret is configured.
pub async fn require_bearer(
    State(gate): State<AuthGate>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, GatewayError> {
    let decision = gate.decide(&InboundRequest::of(&request));

    if let AuthDecision::Rejected(reason) = decision {
        tracing::warn!(
            method = %request.method(),
            path = %request.uri().path(),
            reason,
            "Rejected request"
        );
        return Err(GatewayError::Unauthorized);
    }

    tracing::trace!(?decision, path = %request.uri().path(), "Request admitted");
    Ok(next.run(request).await)
}
