//! Rollback Service — Webhook Entry Point
//!
//! Receives Alertmanager notifications and rolls the demo app back to
//! the stable image via docker compose. Runs until SIGINT.
//!
//! Wiring sequence:
//! 1. Load rollback.toml (or ROLLBACK_CONFIG path; defaults if absent)
//! 2. Init tracing (JSON structured logging)
//! 3. Create ComposeDeployer (implements Deployer port)
//! 4. Create RollbackController (next image assumed live)
//! 5. Spawn webhook server
//! 6. Wait for SIGINT → graceful shutdown

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info};

use rollback_demo::adapters::deploy::ComposeDeployer;
use rollback_demo::adapters::http::WebhookServer;
use rollback_demo::config::loader::load_rollback_config;
use rollback_demo::telemetry::init_tracing;
use rollback_demo::usecases::RollbackController;

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration ───────────────────────────────
    let config_path = std::env::var_os("ROLLBACK_CONFIG").map(PathBuf::from);
    let config = load_rollback_config(config_path.as_deref())
        .context("Failed to load rollback configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    init_tracing(&config.log_level);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        stable_image = %config.stable_image,
        next_image = %config.next_image,
        "Starting rollback service"
    );

    // ── 3-4. Deployer + controller ──────────────────────────
    let deployer = Arc::new(ComposeDeployer::from_config(&config));
    let controller = Arc::new(RollbackController::from_config(deployer, &config));

    // ── 5. Spawn webhook server ─────────────────────────────
    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
    let server = WebhookServer::new(controller, config.port);
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
                    error!(error = %e, "Webhook server failed");
                    return Err(e);
                }
                Err(e) => return Err(e).context("Webhook server task panicked"),
                Ok(Ok(())) => {}
            }
        }
    }

    info!("Shutdown complete");
    Ok(())
}
