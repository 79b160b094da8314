//! HTTP Adapters
//!
//! axum 0.7 routers and servers:
//! - `service`: version-tagged greeting, simulated error, `/metrics`
//! - `rollback`: Alertmanager webhook driving rollbacks

pub mod rollback;
pub mod service;

pub use rollback::WebhookServer;
pub use service::{RequestServer, ServiceState};
