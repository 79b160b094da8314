//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Traits the service and the rollback controller require from the
//! outside world. Adapters and tests provide the implementations.
//!
//! Port categories:
//! - `DelayPolicy`: Version-dependent artificial latency
//! - `Deployer`: Image deployment backend (docker compose)

pub mod delay;
pub mod deployer;

pub use delay::DelayPolicy;
pub use deployer::{DeployOutcome, Deployer};
