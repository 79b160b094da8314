//! Service routes.
//!
//! Routes double as metric label values, so they are a closed enum:
//! no label is ever built from request data.

/// Endpoints served by the request service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// `GET /` greeting.
    Root,
    /// `GET /simulate_error` synthetic failure.
    SimulateError,
    /// `GET /metrics` Prometheus scrape.
    Metrics,
}

impl Route {
    /// Path used both for routing and as the `route` label.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Root => "/",
            Self::SimulateError => "/simulate_error",
            Self::Metrics => "/metrics",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
