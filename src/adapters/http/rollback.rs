//! Rollback Webhook - Alertmanager Receiver
//!
//! `GET /` reports the image believed to be running; `POST /webhook`
//! accepts Alertmanager notifications and hands them to the
//! `RollbackController`. The body is parsed as JSON whatever its
//! declared content type.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::sync::broadcast;
use tracing::{error, info, instrument, warn};

use crate::domain::alert::AlertPayload;
use crate::usecases::rollback::{RollbackController, RollbackDecision};

/// Build the webhook router.
pub fn router(controller: Arc<RollbackController>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/webhook", post(webhook))
        .with_state(controller)
}

async fn index(State(controller): State<Arc<RollbackController>>) -> impl IntoResponse {
    let status = controller.status().await;
    (
        StatusCode::OK,
        Json(json!({
            "msg": "rollback service running",
            "current_image": status.current_image,
            "last_rollback_at": status.last_rollback_at,
        })),
    )
}

async fn webhook(
    State(controller): State<Arc<RollbackController>>,
    body: Bytes,
) -> Response {
    let payload: AlertPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "Invalid JSON payload");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "invalid json", "detail": e.to_string() })),
            )
                .into_response();
        }
    };

    match controller.handle_alerts(&payload).await {
        Ok(decision) => decision_response(decision),
        Err(e) => {
            error!(error = %e, "Deploy command could not be run");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "deploy error", "detail": format!("{e:#}") })),
            )
                .into_response()
        }
    }
}

/// Map a controller decision to the webhook's HTTP response.
pub fn decision_response(decision: RollbackDecision) -> Response {
    let (status, body) = match decision {
        RollbackDecision::NoFiringAlerts => {
            (StatusCode::OK, json!({ "msg": "no firing alerts" }))
        }
        RollbackDecision::NoActionRequired { .. } => {
            (StatusCode::OK, json!({ "msg": "no action taken" }))
        }
        RollbackDecision::AlreadyStable { .. } => {
            (StatusCode::OK, json!({ "msg": "already stable" }))
        }
        RollbackDecision::RolledBack { image, stdout } => (
            StatusCode::OK,
            json!({ "msg": format!("rolled back to {image}"), "out": stdout }),
        ),
        RollbackDecision::DeployFailed { stdout, stderr, .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": "compose failed", "out": stdout, "err": stderr }),
        ),
    };
    (status, Json(body)).into_response()
}

/// Axum-based rollback webhook server.
pub struct WebhookServer {
    /// Controller shared with handlers.
    controller: Arc<RollbackController>,
    /// Bind port (default 5001).
    port: u16,
}

impl WebhookServer {
    /// Create a new webhook server.
    pub fn new(controller: Arc<RollbackController>, port: u16) -> Self {
        Self { controller, port }
    }

    /// Serve until a shutdown signal arrives.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn run(
        self,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> anyhow::Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        info!(
            address = %addr,
            stable_image = %self.controller.stable_image(),
            "Rollback webhook listening"
        );

        axum::serve(listener, router(self.controller))
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }
}
