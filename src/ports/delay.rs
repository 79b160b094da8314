//! Delay Policy Port - Injectable Request Latency
//!
//! The greeting handler asks a policy how long to stall before
//! responding. Production wiring uses `RegressionDelay`; tests swap
//! in `NoDelay` to assert on labels without wall-clock waits.

use std::time::Duration;

/// Maps the resolved version to an artificial response delay.
pub trait DelayPolicy: Send + Sync + 'static {
  /// Delay to apply to a greeting served by `version`.
  fn delay_for(&self, version: &str) -> Duration;
}
