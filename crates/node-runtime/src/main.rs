//! # Ledger-Core Node
//!
//! Runs a notary with its uniqueness provider and a vault over a single
//! key-value store. All settings come from `LC_*` environment variables.

use anyhow::{Context, Result};
use ledger_telemetry::init_telemetry;
use node_runtime::{spawn_audit_log, LedgerNode, NodeConfig};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config = NodeConfig::from_env().context("Failed to load node configuration")?;
    let telemetry = init_telemetry(&config.telemetry).context("Failed to initialise telemetry")?;

    let node = LedgerNode::start(config).context("Failed to start ledger node")?;
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let audit = spawn_audit_log(node.bus(), shutdown_rx);

    info!(notary = %node.identity(), "Node ready, press Ctrl-C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    info!("Shutdown signal received");
    let _ = shutdown_tx.send(true);
    if let Err(e) = audit.await {
        warn!(error = %e, "Audit log task failed");
    }

    if let Some(metrics) = telemetry.metrics() {
        match metrics.gather_text() {
            Ok(text) => info!(bytes = text.len(), "Final metrics snapshot gathered"),
            Err(e) => warn!(error = %e, "Failed to gather metrics"),
        }
    }
    info!("Node stopped");
    Ok(())
}
