//! Latency Policies - Simulated Deployment Regressions
//!
//! The greeting endpoint sleeps for a version-dependent duration so a
//! "bad" deployment shows up as a latency regression on dashboards.

use std::time::Duration;

use crate::ports::delay::DelayPolicy;

/// Version that simulates a slow deployment.
pub const DEGRADED_VERSION: &str = "v2";

/// Delay applied to the degraded version.
pub const DEGRADED_DELAY: Duration = Duration::from_millis(600);

/// Delay applied to every other version.
pub const NORMAL_DELAY: Duration = Duration::from_millis(50);

/// Maps one designated version to a large delay and everything else
/// to a small one.
#[derive(Debug, Clone)]
pub struct RegressionDelay {
    degraded_version: String,
    degraded: Duration,
    normal: Duration,
}

impl RegressionDelay {
    /// Create a policy with custom delays.
    pub fn new(degraded_version: impl Into<String>, degraded: Duration, normal: Duration) -> Self {
        Self {
            degraded_version: degraded_version.into(),
            degraded,
            normal,
        }
    }
}

impl Default for RegressionDelay {
    fn default() -> Self {
        Self::new(DEGRADED_VERSION, DEGRADED_DELAY, NORMAL_DELAY)
    }
}

impl DelayPolicy for RegressionDelay {
    fn delay_for(&self, version: &str) -> Duration {
        if version == self.degraded_version {
            self.degraded
        } else {
            self.normal
        }
    }
}

/// Zero delay for every version.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl DelayPolicy for NoDelay {
    fn delay_for(&self, _version: &str) -> Duration {
        Duration::ZERO
    }
}
