//! Deployer Port - Deployment Backend Interface
//!
//! Defines how the rollback controller swaps the running image.
//! The compose adapter shells out to Docker; tests mock this trait.

use async_trait::async_trait;
use serde::Serialize;

/// Result of one deployment command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployOutcome {
  /// Process exit code (127 when no deploy tool is available).
  pub exit_code: i32,
  /// Captured standard output.
  pub stdout: String,
  /// Captured standard error.
  pub stderr: String,
}

impl DeployOutcome {
  /// Whether the deployment command exited cleanly.
  pub const fn succeeded(&self) -> bool {
    self.exit_code == 0
  }
}

/// Trait for deployment backends.
///
/// Implementors recreate the application service running `image`.
/// A non-zero exit is reported through [`DeployOutcome`]; `Err` is
/// reserved for failures to run the command at all.
#[async_trait]
pub trait Deployer: Send + Sync + 'static {
  /// Deploy `image` and report the command outcome.
  async fn deploy(&self, image: &str) -> anyhow::Result<DeployOutcome>;
}
