//! HTTP layer of the monitor gateway.
//!
//! Connection dispatch, CORS, the route table and the gateway's own
//! handlers (health check and 404).

pub mod cors;
pub mod dispatch;
pub mod domains;
pub mod handlers;
mod routes;
mod types;

pub use domains::Domain;
pub use routes::{build_router, RouteEntry, RouteTable};
