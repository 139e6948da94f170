//! Authentication module for the monitor gateway.
//!
//! A single shared secret, presented as `Authorization: Bearer <secret>`,
//! guards every route except the `GET /` health check. Without a configured
//! secret the gate admits everything.

mod gate;
mod middleware;

pub use gate::*;
pub use middleware::*;
