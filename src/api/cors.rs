//! Permissive CORS policy.
//!
//! Every response carries the same three headers. `OPTIONS` requests are
//! answered here with an empty 200 and never reach the auth gate or routes.

use axum::{
    body::Body,
    extract::Request,
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN,
        },
        HeaderName, HeaderValue, Method, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type, Authorization";

/// Headers to attach and whether the request stops here.
#[derive(Debug, Clone)]
pub struct CorsDecision {
    pub headers: [(HeaderName, HeaderValue); 3],
    pub short_circuit: bool,
}

impl CorsDecision {
    /// Stamp the CORS headers onto a response, replacing any existing values.
    pub fn decorate(self, mut response: Response) -> Response {
        let headers = response.headers_mut();
        for (name, value) in self.headers {
            headers.insert(name, value);
        }
        response
    }
}

/// Decide the CORS outcome for a request method.
pub fn apply(method: &Method) -> CorsDecision {
    CorsDecision {
        headers: [
            (
                ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static(ALLOW_ORIGIN),
            ),
            (
                ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static(ALLOW_METHODS),
            ),
            (
                ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static(ALLOW_HEADERS),
            ),
        ],
        short_circuit: method == Method::OPTIONS,
    }
}

/// Middleware applying [`apply`] to every request passing through.
pub async fn cors(request: Request<Body>, next: Next) -> Response {
    let decision = apply(request.method());

    let response = if decision.short_circuit {
        StatusCode::OK.into_response()
    } else {
        next.run(request).await
    };

    decision.decorate(response)
}
