//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` and exposes
//! the HTTP surface. Each sub-module groups adapters by
//! infrastructure concern.
//!
//! Adapter categories:
//! - `deploy`: docker compose deployment backend
//! - `http`: axum routers for the service and the webhook
//! - `metrics`: Prometheus registry and text exposition

pub mod deploy;
pub mod http;
pub mod metrics;
