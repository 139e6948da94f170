//! Bearer-token gate for inbound requests.

use std::sync::Arc;

use axum::http::{header::AUTHORIZATION, HeaderMap, Method, Request};
use subtle::ConstantTimeEq;

use crate::config::AuthConfig;

const BEARER_PREFIX: &[u8] = b"Bearer ";

/// Read-only view of the parts of a request the gate looks at.
#[derive(Debug, Clone, Copy)]
pub struct InboundRequest<'a> {
    pub method: &'a Method,
    pub path: &'a str,
    pub headers: &'a HeaderMap,
}

impl<'a> InboundRequest<'a> {
    pub fn of<B>(request: &'a Request<B>) -> Self {
        Self {
            method: request.method(),
            path: request.uri().path(),
            headers: request.headers(),
        }
    }

    /// `GET /` is the health check and always public.
    pub fn is_health_check(&self) -> bool {
        self.method == Method::GET && self.path == "/"
    }
}

/// Outcome of running a request through the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthDecision {
    Public,
    Authorized,
    Rejected(&'static str),
}

impl AuthDecision {
    pub fn is_rejected(&self) -> bool {
        matches!(self, AuthDecision::Rejected(_))
    }
}

/// How a presented token is compared against the shared secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompareMode {
    #[default]
    Exact,
    ConstantTime,
}

/// Shared-secret gate. Immutable once built; cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct AuthGate {
    secret: Option<Arc<str>>,
    mode: CompareMode,
    guard_upgrades: bool,
}

impl AuthGate {
    /// Create a gate. An empty secret is treated as no secret.
    pub fn new(secret: Option<&str>, mode: CompareMode) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()).map(Arc::from),
            mode,
            guard_upgrades: false,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        let mode = if config.constant_time_compare {
            CompareMode::ConstantTime
        } else {
            CompareMode::Exact
        };
        Self::new(config.token.as_deref(), mode)
            .guarding_upgrades(config.require_auth_for_upgrade)
    }

    /// Whether upgrade requests must also carry the bearer token.
    pub fn guarding_upgrades(mut self, guard: bool) -> Self {
        self.guard_upgrades = guard;
        self
    }

    pub fn guards_upgrades(&self) -> bool {
        self.guard_upgrades
    }

    pub fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    /// Classify a plain HTTP request.
    pub fn decide(&self, request: &InboundRequest<'_>) -> AuthDecision {
        if request.is_health_check() {
            return AuthDecision::Public;
        }
        self.check_bearer(request.headers)
    }

    /// Classify an upgrade attempt. Without upgrade guarding every attempt passes.
    pub fn decide_upgrade(&self, request: &InboundRequest<'_>) -> AuthDecision {
        if !self.guard_upgrades {
            return AuthDecision::Authorized;
        }
        self.check_bearer(request.headers)
    }

    fn check_bearer(&self, headers: &HeaderMap) -> AuthDecision {
        let Some(secret) = self.secret.as_deref() else {
            return AuthDecision::Authorized;
        };

        let presented = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.as_bytes().strip_prefix(BEARER_PREFIX));

        match presented {
            Some(token) if self.matches(token, secret.as_bytes()) => AuthDecision::Authorized,
            _ => AuthDecision::Rejected("unauthorized"),
        }
    }

    fn matches(&self, presented: &[u8], secret: &[u8]) -> bool {
        match self.mode {
            CompareMode::Exact => presented == secret,
            CompareMode::ConstantTime => presented.ct_eq(secret).into(),
        }
    }
}

/// Free-function form of [`AuthGate::decide`] with exact comparison.
pub fn decide(request: &InboundRequest<'_>, secret: Option<&str>) -> AuthDecision {
    AuthGate::new(secret, CompareMode::Exact).decide(request)
}
