//! Configuration Loader - Environment and File Loading
//!
//! Environment lookups go through a caller-supplied function so tests
//! never touch the process environment.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use super::{default_log_level, ConfigError, RollbackConfig, ServiceConfig};
use crate::domain::version::DEFAULT_MARKER_PATH;

/// Port used when `PORT` is unset or empty.
pub const DEFAULT_PORT: u16 = 3000;

/// Rollback config path used when `ROLLBACK_CONFIG` is unset.
pub const DEFAULT_ROLLBACK_CONFIG: &str = "rollback.toml";

/// Build the request service config from an environment lookup.
///
/// Unset and empty variables both select the default.
///
/// # Errors
/// Returns [`ConfigError::InvalidPort`] if `PORT` is not a valid u16.
pub fn load_service_config<F>(lookup: F) -> Result<ServiceConfig, ConfigError>
where
  F: Fn(&str) -> Option<String>,
{
  let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

  let port = match var("PORT") {
    Some(value) => match value.trim().parse::<u16>() {
      Ok(port) => port,
      Err(source) => return Err(ConfigError::InvalidPort { value, source }),
    },
    None => DEFAULT_PORT,
  };

  Ok(ServiceConfig {
    port,
    version_file: var("VERSION_FILE").map_or_else(|| PathBuf::from(DEFAULT_MARKER_PATH), PathBuf::from),
    log_level: var("LOG_LEVEL").unwrap_or_else(default_log_level),
  })
}

/// Load the rollback config.
///
/// With `path == None` the default `rollback.toml` is tried and a missing
/// file yields defaults. An explicit path must exist.
///
/// # Errors
/// Returns an error if the file can't be read, TOML parsing fails, or
/// validation rules are violated.
pub fn load_rollback_config(path: Option<&Path>) -> Result<RollbackConfig> {
  let (path, required) = match path {
    Some(p) => (p, true),
    None => (Path::new(DEFAULT_ROLLBACK_CONFIG), false),
  };

  let config = match std::fs::read_to_string(path) {
    Ok(content) => parse_rollback_config(&content)
      .with_context(|| format!("Failed to parse {}", path.display()))?,
    Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => {
      info!(path = %path.display(), "No rollback config file, using defaults");
      RollbackConfig::default()
    }
    Err(e) => {
      return Err(e).with_context(|| format!("Failed to read config file: {}", path.display()));
    }
  };

  info!(
    stable_image = %config.stable_image,
    next_image = %config.next_image,
    compose_dir = %config.compose_dir.display(),
    "Rollback configuration loaded"
  );

  Ok(config)
}

/// Parse and validate rollback config TOML.
pub fn parse_rollback_config(content: &str) -> Result<RollbackConfig> {
  let config: RollbackConfig = toml::from_str(content).context("Invalid rollback config TOML")?;
  validate_rollback_config(&config)?;
  Ok(config)
}

/// Validate rollback parameters.
///
/// Checks for:
/// - Non-empty image and service names
/// - Distinct stable and next images
fn validate_rollback_config(config: &RollbackConfig) -> Result<()> {
  anyhow::ensure!(
    !config.stable_image.trim().is_empty(),
    "stable_image must not be empty"
  );
  anyhow::ensure!(
    !config.next_image.trim().is_empty(),
    "next_image must not be empty"
  );
  anyhow::ensure!(
    config.stable_image != config.next_image,
    "stable_image and next_image must differ, both are {}",
    config.stable_image
  );
  anyhow::ensure!(!config.service.trim().is_empty(), "service must not be empty");
  anyhow::ensure!(
    !config.compose_file.trim().is_empty(),
    "compose_file must not be empty"
  );

  Ok(())
}
