//! Configuration Module - Service and Rollback Settings
//!
//! The request service is configured from environment variables only
//! (`PORT`, `VERSION_FILE`, `LOG_LEVEL`). The rollback webhook reads an
//! optional `rollback.toml`; every field has a default so the file may
//! be omitted entirely.

pub mod loader;

use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

/// Request service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
  /// Listening port (`PORT`, default 3000).
  pub port: u16,
  /// Version marker path (`VERSION_FILE`, default `./version.txt`).
  pub version_file: PathBuf,
  /// Log level fallback when `RUST_LOG` is unset.
  pub log_level: String,
}

/// Rollback webhook configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RollbackConfig {
  /// Webhook listening port.
  #[serde(default = "default_rollback_port")]
  pub port: u16,
  /// Known-good image rolled back to.
  #[serde(default = "default_stable_image")]
  pub stable_image: String,
  /// Image assumed live at startup.
  #[serde(default = "default_next_image")]
  pub next_image: String,
  /// Directory holding the compose file; commands run here.
  #[serde(default = "default_compose_dir")]
  pub compose_dir: PathBuf,
  /// Compose file name, relative to `compose_dir`.
  #[serde(default = "default_compose_file")]
  pub compose_file: String,
  /// Compose service recreated on rollback.
  #[serde(default = "default_service")]
  pub service: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
}

impl Default for RollbackConfig {
  fn default() -> Self {
    Self {
      port: default_rollback_port(),
      stable_image: default_stable_image(),
      next_image: default_next_image(),
      compose_dir: default_compose_dir(),
      compose_file: default_compose_file(),
      service: default_service(),
      log_level: default_log_level(),
    }
  }
}

/// Invalid environment configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("invalid PORT {value:?}: {source}")]
  InvalidPort {
    value: String,
    #[source]
    source: std::num::ParseIntError,
  },
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

fn default_rollback_port() -> u16 {
  5001
}

fn default_stable_image() -> String {
  "app:v1".to_string()
}

fn default_next_image() -> String {
  "app:v2".to_string()
}

fn default_compose_dir() -> PathBuf {
  PathBuf::from(".")
}

fn default_compose_file() -> String {
  "docker-compose.yml".to_string()
}

fn default_service() -> String {
  "app".to_string()
}
