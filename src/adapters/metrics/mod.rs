//! Metrics Adapters
//!
//! Prometheus registry backing the request service's `/metrics`
//! endpoint (text exposition format).

pub mod prometheus;

pub use prometheus::MetricsRegistry;
