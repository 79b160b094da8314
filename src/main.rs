//! Rollback Demo — Request Service Entry Point
//!
//! Serves a version-tagged greeting, a synthetic error endpoint and
//! Prometheus metrics. Runs until SIGINT.
//!
//! Wiring sequence:
//! 1. Load config from env (PORT, VERSION_FILE, LOG_LEVEL)
//! 2. Init tracing (JSON structured logging)
//! 3. Resolve the version marker (default v1)
//! 4. Build the metrics registry and handler state
//! 5. Spawn the HTTP server
//! 6. Wait for SIGINT → graceful shutdown

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info};

use rollback_demo::adapters::http::{RequestServer, ServiceState};
use rollback_demo::adapters::metrics::MetricsRegistry;
use rollback_demo::config::loader::load_service_config;
use rollback_demo::domain::latency::RegressionDelay;
use rollback_demo::domain::version::resolve_version;
use rollback_demo::telemetry::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration from the environment ──────────
    let config = load_service_config(|key| std::env::var(key).ok())
        .context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    init_tracing(&config.log_level);

    // ── 3. Resolve deployment version ───────────────────────
    let resolved = resolve_version(&config.version_file)
        .context("Failed to resolve version")?;
    info!(
        version = %resolved.version,
        used_default = resolved.used_default,
        marker = %config.version_file.display(),
        "Version resolved"
    );

    // ── 4. Metrics registry + handler state ─────────────────
    let metrics = Arc::new(
        MetricsRegistry::new().context("Failed to register metrics")?,
    );
    let state = ServiceState::new(
        resolved.version,
        metrics,
        Arc::new(RegressionDelay::default()),
    );

    // ── 5. Spawn HTTP server ────────────────────────────────
    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
    let server = RequestServer::new(state, config.port);
    let mut server_handle = tokio::spawn(server.run(shutdown_rx));

    // ── 6. Wait for SIGINT or server failure ────────────────
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("SIGINT received, initiating graceful shutdown");
            let _ = shutdown_tx.send(());
            let _ = tokio::time::timeout(
                std::time::Duration::from_secs(5),
                &mut server_handle,
            )
            .await;
        }
        result = &mut server_handle => {
            match result {
                Ok(Err(e)) => {
                    error!(error = %e, "Server failed");
                    return Err(e);
                }
                Err(e) => return Err(e).context("Server task panicked"),
                Ok(Ok(())) => {}
            }
        }
    }

    info!("Shutdown complete");
    Ok(())
}
