//! Use Cases Layer - Application Workflows
//!
//! Orchestrates domain logic with port interfaces.
//!
//! Use cases:
//! - `RollbackController`: Firing alerts → stable image deployment

pub mod rollback;

pub use rollback::{DeploymentStatus, RollbackController, RollbackDecision};
