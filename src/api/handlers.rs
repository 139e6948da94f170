//! HTTP request handlers owned by the gateway.

use std::any::Any;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{OriginalUri, Request, State},
    response::{IntoResponse, Response},
    Json,
};

use crate::api::routes::RouteTable;
use crate::api::types::HealthResponse;
use crate::auth::InboundRequest;
use crate::error::GatewayError;

/// Health check.
///
/// GET /
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

/// Catch-all for paths no route claims. Echoes the path as the client sent it.
pub async fn not_found(OriginalUri(uri): OriginalUri) -> GatewayError {
    GatewayError::NotFound {
        path: uri.path().to_string(),
    }
}

/// Entry point of the HTTP pipeline once CORS and auth have run.
///
/// The health check is answered inline; everything else is resolved against
/// the route table and forwarded, or falls through to the 404 responder.
pub async fn route_request(
    State(table): State<Arc<RouteTable>>,
    request: Request<Body>,
) -> Response {
    if InboundRequest::of(&request).is_health_check() {
        return health_check().await.into_response();
    }

    let path = request.uri().path().to_string();
    match table.resolve(&path) {
        Some(entry) => {
            tracing::debug!(prefix = entry.prefix(), %path, "Forwarding to sub-router");
            entry.forward(request).await
        }
        None => GatewayError::NotFound { path }.into_response(),
    }
}

/// Turn a panicking sub-router into a generic 500.
pub fn handler_fault(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    };

    GatewayError::Internal(format!("handler panicked: {detail}")).into_response()
}
