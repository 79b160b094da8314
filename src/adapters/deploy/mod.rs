//! Deployment Adapters
//!
//! Implementations of the `Deployer` port.

pub mod compose;

pub use compose::ComposeDeployer;
