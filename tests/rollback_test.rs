//! Integration Tests - Rollback Webhook
//!
//! Exercises the controller and webhook router against a mocked
//! `Deployer`. Uses mockall for the port and tokio::test for async.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use mockall::mock;
use mockall::predicate::eq;
use serde_json::{json, Value};
use tower::ServiceExt;

use rollback_demo::adapters::http::rollback::router;
use rollback_demo::domain::alert::AlertPayload;
use rollback_demo::ports::deployer::DeployOutcome;
use rollback_demo::usecases::rollback::{RollbackController, RollbackDecision};

// ---- Mock Definitions ----

mock! {
    pub Deploy {}

    #[async_trait::async_trait]
    impl rollback_demo::ports::deployer::Deployer for Deploy {
        async fn deploy(&self, image: &str) -> anyhow::Result<DeployOutcome>;
    }
}

// ---- Helpers ----

fn outcome(exit_code: i32) -> DeployOutcome {
    DeployOutcome {
        exit_code,
        stdout: "Recreating app ... done".to_string(),
        stderr: if exit_code == 0 { String::new() } else { "no such image".to_string() },
    }
}

fn controller(mock: MockDeploy) -> Arc<RollbackController> {
    Arc::new(RollbackController::new(Arc::new(mock), "app:v1", "app:v2"))
}

fn payload(alerts: Value) -> AlertPayload {
    serde_json::from_value(json!({ "alerts": alerts })).unwrap()
}

async fn post_webhook(app: &Router, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/webhook")
        // Content type is deliberately not JSON
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get_index(app: &Router) -> Value {
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ---- Controller ----

#[tokio::test]
async fn test_no_firing_alerts_never_deploys() {
    let mut mock = MockDeploy::new();
    mock.expect_deploy().times(0);
    let controller = controller(mock);

    let decision = controller
        .handle_alerts(&payload(json!([
            { "status": "resolved", "labels": { "severity": "critical" } }
        ])))
        .await
        .unwrap();
    assert_eq!(decision, RollbackDecision::NoFiringAlerts);
}

#[tokio::test]
async fn test_warning_rolls_back_to_stable() {
    let mut mock = MockDeploy::new();
    mock.expect_deploy()
        .with(eq("app:v1"))
        .times(1)
        .returning(|_| Ok(outcome(0)));
    let controller = controller(mock);

    let decision = controller
        .handle_alerts(&payload(json!([
            { "status": "firing", "labels": { "severity": "warning" } }
        ])))
        .await
        .unwrap();
    assert_eq!(
        decision,
        RollbackDecision::RolledBack {
            image: "app:v1".to_string(),
            stdout: "Recreating app ... done".to_string(),
        }
    );
    assert_eq!(controller.status().await.current_image, "app:v1");
}

#[tokio::test]
async fn test_deployer_error_propagates() {
    let mut mock = MockDeploy::new();
    mock.expect_deploy()
        .times(1)
        .returning(|_| Err(anyhow::anyhow!("spawn failed")));
    let controller = controller(mock);

    let result = controller
        .handle_alerts(&payload(json!([
            { "status": "firing", "labels": { "severity": "critical" } }
        ])))
        .await;
    assert!(result.is_err());
    assert_eq!(controller.status().await.current_image, "app:v2");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_notifications_deploy_once() {
    let mut mock = MockDeploy::new();
    mock.expect_deploy().times(1).returning(|_| Ok(outcome(0)));
    let controller = controller(mock);
    let alert = payload(json!([
        { "status": "firing", "labels": { "severity": "critical" } }
    ]));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let controller = Arc::clone(&controller);
            let alert = alert.clone();
            tokio::spawn(async move { controller.handle_alerts(&alert).await.unwrap() })
        })
        .collect();
    let decisions: Vec<_> = futures_util::future::join_all(handles)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();

    let rolled_back = decisions
        .iter()
        .filter(|d| matches!(d, RollbackDecision::RolledBack { .. }))
        .count();
    let already_stable = decisions
        .iter()
        .filter(|d| matches!(d, RollbackDecision::AlreadyStable { .. }))
        .count();
    assert_eq!(rolled_back, 1);
    assert_eq!(already_stable, 7);
}

// ---- Webhook router ----

#[tokio::test]
async fn test_index_reports_current_image() {
    let app = router(controller(MockDeploy::new()));
    let body = get_index(&app).await;
    assert_eq!(body["msg"], "rollback service running");
    assert_eq!(body["current_image"], "app:v2");
    assert!(body["last_rollback_at"].is_null());
}

#[tokio::test]
async fn test_invalid_json_is_400() {
    let app = router(controller(MockDeploy::new()));
    let (status, body) = post_webhook(&app, "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid json");
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_webhook_rollback_flow() {
    let mut mock = MockDeploy::new();
    mock.expect_deploy().times(1).returning(|_| Ok(outcome(0)));
    let app = router(controller(mock));
    let notification = r#"{"alerts": [{"status": "firing", "labels": {"severity": "critical", "alertname": "HighErrorRate"}}]}"#;

    let (status, body) = post_webhook(&app, notification).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["msg"], "rolled back to app:v1");
    assert_eq!(body["out"], "Recreating app ... done");

    let (status, body) = post_webhook(&app, notification).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "msg": "already stable" }));

    let index = get_index(&app).await;
    assert_eq!(index["current_image"], "app:v1");
    assert!(index["last_rollback_at"].is_string());
}

#[tokio::test]
async fn test_webhook_compose_failure_is_500() {
    let mut mock = MockDeploy::new();
    mock.expect_deploy().times(1).returning(|_| Ok(outcome(1)));
    let app = router(controller(mock));

    let (status, body) = post_webhook(
        &app,
        r#"{"alerts": [{"status": "firing", "labels": {"severity": "warning"}}]}"#,
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "compose failed");
    assert_eq!(body["err"], "no such image");
    assert_eq!(get_index(&app).await["current_image"], "app:v2");
}

#[tokio::test]
async fn test_webhook_ignores_low_severity() {
    let app = router(controller(MockDeploy::new()));

    let (status, body) = post_webhook(
        &app,
        r#"{"alerts": [{"status": "firing", "labels": {"severity": "info"}}]}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "msg": "no action taken" }));

    let (status, body) = post_webhook(&app, r#"{"receiver": "rollback"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "msg": "no firing alerts" }));
}

#[tokio::test]
async fn test_webhook_accepts_loosely_typed_alerts() {
    let mut mock = MockDeploy::new();
    mock.expect_deploy().times(0);
    let app = router(controller(mock));

    let (status, body) = post_webhook(
        &app,
        r#"{"alerts": [{"status": null, "labels": {"severity": "critical"}}]}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "msg": "no firing alerts" }));

    let (status, body) = post_webhook(
        &app,
        r#"{"alerts": [{"status": "firing", "labels": {"severity": "info", "priority": 2}}]}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "msg": "no action taken" }));
}
