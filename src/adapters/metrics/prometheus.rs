//! Prometheus Metrics Registry - Request Observability
//!
//! Owns the request-duration histogram and the error counter scraped
//! by Prometheus. Constructed once at wiring time and shared by
//! reference with every handler; tests build an isolated registry
//! per case. Updates go through the crate's atomic accumulators, so
//! concurrent handlers never lose increments and scrapes never reset.

use std::time::Duration;

use axum::http::{Method, StatusCode};
use prometheus::proto::Metric;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry,
    TextEncoder,
};

use crate::domain::route::Route;

/// Request duration buckets in seconds.
pub const DURATION_BUCKETS: [f64; 7] = [0.01, 0.05, 0.1, 0.3, 0.5, 1.0, 2.0];

/// Histogram metric name.
pub const REQUEST_DURATION_METRIC: &str = "http_request_duration_seconds";

/// Counter metric name.
pub const ERRORS_METRIC: &str = "http_errors_total";

/// Centralized Prometheus metrics for the request service.
///
/// Label values are drawn from [`Route`], fixed methods and status
/// codes, and the process-wide version, so cardinality stays bounded.
pub struct MetricsRegistry {
    /// Prometheus registry.
    registry: Registry,
    /// Request handling latency (seconds).
    pub request_duration: HistogramVec,
    /// Simulated error responses.
    pub http_errors: IntCounterVec,
}

impl MetricsRegistry {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                REQUEST_DURATION_METRIC,
                "Duration of HTTP requests in seconds",
            )
            .buckets(DURATION_BUCKETS.to_vec()),
            &["method", "route", "code", "version"],
        )?;

        let http_errors = IntCounterVec::new(
            Opts::new(ERRORS_METRIC, "Total number of HTTP error responses"),
            &["route", "version"],
        )?;

        registry.register(Box::new(request_duration.clone()))?;
        registry.register(Box::new(http_errors.clone()))?;

        Ok(Self {
            registry,
            request_duration,
            http_errors,
        })
    }

    /// Record one handled request.
    pub fn observe_request(
        &self,
        method: &Method,
        route: Route,
        status: StatusCode,
        version: &str,
        elapsed: Duration,
    ) {
        self.request_duration
            .with_label_values(&[
                method.as_str(),
                route.as_str(),
                status.as_str(),
                version,
            ])
            .observe(elapsed.as_secs_f64());
    }

    /// Count one error response on `route`.
    pub fn record_error(&self, route: Route, version: &str) {
        self.http_errors
            .with_label_values(&[route.as_str(), version])
            .inc();
    }

    /// Number of observations for a request label set.
    ///
    /// Reads a gathered snapshot, so an unseen label set reports 0
    /// without creating an empty series.
    pub fn request_count(
        &self,
        method: &Method,
        route: Route,
        status: StatusCode,
        version: &str,
    ) -> u64 {
        self.find_series(
            REQUEST_DURATION_METRIC,
            &[
                ("method", method.as_str()),
                ("route", route.as_str()),
                ("code", status.as_str()),
                ("version", version),
            ],
        )
        .map_or(0, |m| m.get_histogram().get_sample_count())
    }

    /// Current error count for `route` and `version` (0 when unseen).
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn error_count(&self, route: Route, version: &str) -> u64 {
        self.find_series(
            ERRORS_METRIC,
            &[("route", route.as_str()), ("version", version)],
        )
        .map_or(0, |m| m.get_counter().get_value() as u64)
    }

    fn find_series(&self, name: &str, labels: &[(&str, &str)]) -> Option<Metric> {
        self.registry
            .gather()
            .into_iter()
            .find(|family| family.get_name() == name)?
            .take_metric()
            .into_iter()
            .find(|metric| {
                let pairs = metric.get_label();
                pairs.len() == labels.len()
                    && labels.iter().all(|(k, v)| {
                        pairs
                            .iter()
                            .any(|p| p.get_name() == *k && p.get_value() == *v)
                    })
            })
    }

    /// Serialize every registered metric in the text exposition format.
    ///
    /// Read-only: gathering never resets counters or histograms.
    pub fn encode(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Media type matching [`Self::encode`] output.
    pub fn content_type(&self) -> &'static str {
        prometheus::TEXT_FORMAT
    }
}
