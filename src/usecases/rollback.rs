//! Rollback Controller - Alert-Driven Image Rollback
//!
//! Decides, per webhook notification, whether to roll the application
//! back to the stable image, and drives the `Deployer` port when it
//! does. Decisions are serialized behind one async mutex:
//! - at most one deployment is in flight
//! - the current image only changes after a successful deployment
//! - no rollback is re-issued while already on the stable image

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::RollbackConfig;
use crate::domain::alert::{requires_rollback, AlertPayload};
use crate::ports::deployer::Deployer;

/// Outcome of handling one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollbackDecision {
  /// Payload carried no firing alerts.
  NoFiringAlerts,
  /// Firing alerts had no rollback-worthy severity.
  NoActionRequired { severities: Vec<String> },
  /// Already running the stable image.
  AlreadyStable { image: String },
  /// Stable image deployed.
  RolledBack { image: String, stdout: String },
  /// Deployment command exited non-zero; state unchanged.
  DeployFailed {
    exit_code: i32,
    stdout: String,
    stderr: String,
  },
}

/// Snapshot of the deployment state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentStatus {
  /// Image believed to be running.
  pub current_image: String,
  /// When the last successful rollback finished.
  pub last_rollback_at: Option<DateTime<Utc>>,
}

/// Rolls the application back to the stable image on firing alerts.
pub struct RollbackController {
  /// Deployment backend.
  deployer: Arc<dyn Deployer>,
  /// Image to roll back to.
  stable_image: String,
  /// Mutable deployment state; held across the deploy call.
  state: Mutex<DeploymentStatus>,
}

impl RollbackController {
  /// Create a controller assuming `initial_image` is currently deployed.
  pub fn new(
    deployer: Arc<dyn Deployer>,
    stable_image: impl Into<String>,
    initial_image: impl Into<String>,
  ) -> Self {
    Self {
      deployer,
      stable_image: stable_image.into(),
      state: Mutex::new(DeploymentStatus {
        current_image: initial_image.into(),
        last_rollback_at: None,
      }),
    }
  }

  /// Create a controller from config; the next image is assumed live.
  pub fn from_config(deployer: Arc<dyn Deployer>, config: &RollbackConfig) -> Self {
    Self::new(deployer, config.stable_image.clone(), config.next_image.clone())
  }

  /// Image rollbacks target.
  pub fn stable_image(&self) -> &str {
    &self.stable_image
  }

  /// Current deployment state.
  pub async fn status(&self) -> DeploymentStatus {
    self.state.lock().await.clone()
  }

  /// Handle one webhook notification.
  ///
  /// # Errors
  /// Propagates deployer failures to run the command at all. The state
  /// is left unchanged in that case.
  #[instrument(skip(self, payload), fields(alerts = payload.alerts.len()))]
  pub async fn handle_alerts(&self, payload: &AlertPayload) -> anyhow::Result<RollbackDecision> {
    let severities = payload.firing_severities();
    if severities.is_empty() {
      info!("Received payload but no firing alerts");
      return Ok(RollbackDecision::NoFiringAlerts);
    }

    info!(?severities, "Received firing alerts");

    if !requires_rollback(&severities) {
      info!(?severities, "No action required for severities");
      return Ok(RollbackDecision::NoActionRequired { severities });
    }

    let mut state = self.state.lock().await;
    if state.current_image == self.stable_image {
      info!(image = %self.stable_image, "Already on stable image");
      return Ok(RollbackDecision::AlreadyStable {
        image: self.stable_image.clone(),
      });
    }

    let deployment_id = Uuid::new_v4();
    info!(
      %deployment_id,
      from = %state.current_image,
      to = %self.stable_image,
      "Rolling back"
    );

    let outcome = self.deployer.deploy(&self.stable_image).await?;
    info!(
      %deployment_id,
      exit_code = outcome.exit_code,
      stdout = %outcome.stdout,
      stderr = %outcome.stderr,
      "Deploy command finished"
    );

    if outcome.succeeded() {
      state.current_image.clone_from(&self.stable_image);
      state.last_rollback_at = Some(Utc::now());
      Ok(RollbackDecision::RolledBack {
        image: self.stable_image.clone(),
        stdout: outcome.stdout,
      })
    } else {
      warn!(%deployment_id, exit_code = outcome.exit_code, "Rollback failed");
      Ok(RollbackDecision::DeployFailed {
        exit_code: outcome.exit_code,
        stdout: outcome.stdout,
        stderr: outcome.stderr,
      })
    }
  }
}
