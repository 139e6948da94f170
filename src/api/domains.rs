//! The monitoring domains fronted by the gateway.

use std::fmt;

use axum::{http::StatusCode, routing::any, Json, Router};

use crate::api::types::UnmountedResponse;

/// A monitoring sub-API mounted under `/api/<domain>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    Processes,
    Cron,
    Trading,
    Agents,
    Tokens,
    Commands,
}

impl Domain {
    /// Mount order of the route table.
    pub const ALL: [Domain; 6] = [
        Domain::Processes,
        Domain::Cron,
        Domain::Trading,
        Domain::Agents,
        Domain::Tokens,
        Domain::Commands,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Domain::Processes => "processes",
            Domain::Cron => "cron",
            Domain::Trading => "trading",
            Domain::Agents => "agents",
            Domain::Tokens => "tokens",
            Domain::Commands => "commands",
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            Domain::Processes => "/api/processes",
            Domain::Cron => "/api/cron",
            Domain::Trading => "/api/trading",
            Domain::Agents => "/api/agents",
            Domain::Tokens => "/api/tokens",
            Domain::Commands => "/api/commands",
        }
    }

    /// Stand-in sub-router answering 501 on every path until the host
    /// application supplies the real one.
    pub fn unmounted_router(self) -> Router {
        let handler = move || async move {
            (
                StatusCode::NOT_IMPLEMENTED,
                Json(UnmountedResponse {
                    error: "Not implemented",
                    domain: self.name(),
                }),
            )
        };

        Router::new()
            .route("/", any(handler.clone()))
            .route("/*rest", any(handler))
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixes_follow_names() {
        for domain in Domain::ALL {
            assert_eq!(domain.prefix(), format!("/api/{domain}"));
        }
    }
}
