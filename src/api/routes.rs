//! Route table and pipeline assembly.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{OriginalUri, Request},
    http::Uri,
    middleware,
    response::Response,
    Router,
};
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use crate::api::cors::cors;
use crate::api::dispatch::{dispatch, Dispatcher};
use crate::api::domains::Domain;
use crate::api::handlers;
use crate::auth::{require_bearer, AuthGate};
use crate::error::{GatewayError, GatewayResult};
use crate::ws::Acceptor;

/// A path prefix and the sub-router serving everything beneath it.
#[derive(Clone)]
pub struct RouteEntry {
    prefix: String,
    router: Router,
}

impl RouteEntry {
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// True when `path` is the prefix itself or lies below it.
    pub fn matches(&self, path: &str) -> bool {
        path.strip_prefix(self.prefix.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }

    /// Hand the request to the sub-router with the prefix stripped from its URI.
    pub async fn forward(&self, request: Request<Body>) -> Response {
        let (mut parts, body) = request.into_parts();
        let original = parts.uri.clone();
        parts.uri = strip_prefix(&original, &self.prefix);
        if parts.extensions.get::<OriginalUri>().is_none() {
            parts.extensions.insert(OriginalUri(original));
        }

        match self.router.clone().oneshot(Request::from_parts(parts, body)).await {
            Ok(response) => response,
            Err(never) => match never {},
        }
    }
}

impl std::fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteEntry")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

/// Ordered prefix table. The first matching entry wins.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with every known domain served by its 501 stand-in.
    pub fn with_unmounted_domains() -> GatewayResult<Self> {
        Domain::ALL
            .into_iter()
            .try_fold(Self::new(), |table, domain| {
                table.mount(domain.prefix(), domain.unmounted_router())
            })
    }

    /// Append a sub-router under `prefix`.
    ///
    /// Unmatched paths inside the sub-router are answered by the gateway's
    /// 404 responder. Prefixes must be absolute, carry no trailing slash, and
    /// must not overlap an existing entry.
    pub fn mount(mut self, prefix: impl Into<String>, router: Router) -> GatewayResult<Self> {
        let prefix = prefix.into();

        if !prefix.starts_with('/') || prefix.len() < 2 || prefix.ends_with('/') {
            return Err(GatewayError::InvalidRoute(format!(
                "prefix `{prefix}` must start with `/`, name a segment, and not end with `/`"
            )));
        }

        let entry = RouteEntry {
            prefix,
            router: router.fallback(handlers::not_found),
        };

        if let Some(existing) = self
            .entries
            .iter()
            .find(|e| e.matches(&entry.prefix) || entry.matches(&e.prefix))
        {
            return Err(GatewayError::InvalidRoute(format!(
                "prefix `{}` overlaps `{}`",
                entry.prefix, existing.prefix
            )));
        }

        self.entries.push(entry);
        Ok(self)
    }

    /// Replace the sub-router of an already mounted domain.
    pub fn replace(mut self, domain: Domain, router: Router) -> GatewayResult<Self> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.prefix == domain.prefix())
            .ok_or_else(|| {
                GatewayError::InvalidRoute(format!("domain `{domain}` not mounted"))
            })?;
        entry.router = router.fallback(handlers::not_found);
        Ok(self)
    }

    pub fn resolve(&self, path: &str) -> Option<&RouteEntry> {
        self.entries.iter().find(|entry| entry.matches(path))
    }

    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(RouteEntry::prefix)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Rebuild `uri` relative to `prefix`, keeping the query string.
fn strip_prefix(uri: &Uri, prefix: &str) -> Uri {
    let rest = uri.path().strip_prefix(prefix).unwrap_or(uri.path());
    let path = if rest.is_empty() { "/" } else { rest };
    let path_and_query = match uri.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    };

    path_and_query.parse().unwrap_or_else(|_| uri.clone())
}

/// Build the gateway service.
///
/// Layers run outermost first: tracing, connection dispatch (upgrades leave
/// here), CORS, panic capture, bearer gate, then route resolution.
pub fn build_router(table: RouteTable, gate: AuthGate, acceptor: Acceptor) -> Router {
    let dispatcher = Dispatcher::new(gate.clone(), acceptor);

    Router::new()
        .fallback(handlers::route_request)
        .with_state(Arc::new(table))
        .layer(middleware::from_fn_with_state(gate, require_bearer))
        .layer(CatchPanicLayer::custom(handlers::handler_fault))
        .layer(middleware::from_fn(cors))
        .layer(middleware::from_fn_with_state(dispatcher, dispatch))
        .layer(TraceLayer::new_for_http())
}
