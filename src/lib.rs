//! OpenClaw Monitor Gateway
//!
//! Fronts the monitoring sub-APIs (processes, cron, trading, agents, tokens,
//! commands) behind a single listener: permissive CORS, one shared bearer
//! secret, prefix routing to injected sub-routers, and a WebSocket push
//! channel on the same port.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod startup;
pub mod ws;

pub use api::{Domain, RouteTable};
pub use config::Config;
pub use error::{GatewayError, GatewayResult};
pub use startup::{start, RunningGateway};
