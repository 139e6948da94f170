//! API response types owned by the gateway itself.

use serde::Serialize;

/// Service name reported by the health check.
pub const SERVICE_NAME: &str = "openclaw-monitor-api";

/// Body of `GET /`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: &'static str,
    pub name: &'static str,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok",
            name: SERVICE_NAME,
        }
    }
}

/// Body returned by a domain that has no sub-router mounted.
#[derive(Debug, Clone, Serialize)]
pub struct UnmountedResponse {
    pub error: &'static str,
    pub domain: &'static str,
}
