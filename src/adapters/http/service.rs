//! Request Service - Greeting, Simulated Error, and Scrape Endpoints
//!
//! Serves the version-tagged demo endpoints via axum 0.7. Every
//! request is independent; the only shared state is the metrics
//! registry, which handlers update without external locking.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument};

use crate::adapters::metrics::MetricsRegistry;
use crate::domain::route::Route;
use crate::ports::delay::DelayPolicy;

/// State shared by all request handlers.
#[derive(Clone)]
pub struct ServiceState {
    /// Resolved deployment version (immutable).
    version: Arc<str>,
    /// Process-wide metrics registry.
    metrics: Arc<MetricsRegistry>,
    /// Greeting latency policy.
    delay: Arc<dyn DelayPolicy>,
}

impl ServiceState {
    /// Wire the handlers' shared state.
    pub fn new(
        version: impl Into<Arc<str>>,
        metrics: Arc<MetricsRegistry>,
        delay: Arc<dyn DelayPolicy>,
    ) -> Self {
        Self {
            version: version.into(),
            metrics,
            delay,
        }
    }

    /// Resolved deployment version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Shared metrics registry.
    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }
}

/// Build the service router.
///
/// Unknown paths fall through to axum's 404; non-GET methods on
/// known paths get 405.
pub fn router(state: ServiceState) -> Router {
    Router::new()
        .route(Route::Root.as_str(), get(greeting))
        .route(Route::SimulateError.as_str(), get(simulate_error))
        .route(Route::Metrics.as_str(), get(scrape))
        .with_state(state)
}

/// `GET /`: stall per the delay policy, record the elapsed time, greet.
async fn greeting(State(state): State<ServiceState>) -> impl IntoResponse {
    let started = Instant::now();
    let delay = state.delay.delay_for(&state.version);
    tokio::time::sleep(delay).await;

    let elapsed = started.elapsed();
    state.metrics.observe_request(
        &Method::GET,
        Route::Root,
        StatusCode::OK,
        &state.version,
        elapsed,
    );
    debug!(elapsed_ms = elapsed.as_millis(), "Greeting served");

    (StatusCode::OK, format!("Hello from app {}\n", state.version))
}

/// `GET /simulate_error`: count an error and fail on purpose.
async fn simulate_error(State(state): State<ServiceState>) -> impl IntoResponse {
    state
        .metrics
        .record_error(Route::SimulateError, &state.version);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Simulated error on {}\n", state.version),
    )
}

/// `GET /metrics`: text exposition of the registry.
async fn scrape(State(state): State<ServiceState>) -> Response {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, state.metrics.content_type())],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to encode metrics\n")
                .into_response()
        }
    }
}

/// Axum-based request service.
pub struct RequestServer {
    /// Handler state.
    state: ServiceState,
    /// Bind port (`PORT`, default 3000).
    port: u16,
}

impl RequestServer {
    /// Create a new request server.
    pub fn new(state: ServiceState, port: u16) -> Self {
        Self { state, port }
    }

    /// Serve until a shutdown signal arrives.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn run(
        self,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> anyhow::Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();

        info!(
            version = %self.state.version,
            port,
            "App {} listening on {}",
            self.state.version,
            port
        );

        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }
}
