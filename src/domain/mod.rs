//! Domain layer - Core service logic and models.
//!
//! Pure logic with no I/O beyond reading the version marker:
//! version resolution, latency policy, route labels, and the
//! alert model consumed by the rollback webhook.

pub mod alert;
pub mod latency;
pub mod route;
pub mod version;

// Re-export core types for convenience
pub use alert::{Alert, AlertPayload};
pub use latency::{NoDelay, RegressionDelay};
pub use route::Route;
pub use version::{ResolvedVersion, VersionError, resolve_version};
