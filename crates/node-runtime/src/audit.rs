//! Notary audit trail.
//!
//! Logs every notarisation outcome published on the bus until shutdown is
//! signalled.

use shared_bus::{EventFilter, EventTopic, InMemoryEventBus, LedgerEvent, SubscriptionError};
use shared_types::short_hex;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Spawns the audit task. It stops when `shutdown` flips to `true` or the
/// bus goes away, and returns how many events it logged.
pub fn spawn_audit_log(
    bus: &Arc<InMemoryEventBus>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<u64> {
    let mut subscription = bus.subscribe(EventFilter::topics(vec![EventTopic::Notary]));
    tokio::spawn(async move {
        let mut logged = 0;
        loop {
            tokio::select! {
                event = subscription.recv() => match event {
                    Ok(event) => {
                        log_event(&event);
                        logged += 1;
                    }
                    Err(SubscriptionError::Lagged { missed }) => {
                        warn!(missed, "Audit log fell behind, outcomes not logged");
                    }
                    Err(SubscriptionError::Closed) => break,
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        loop {
            match subscription.try_recv() {
                Ok(Some(event)) => {
                    log_event(&event);
                    logged += 1;
                }
                Err(SubscriptionError::Lagged { missed }) => {
                    warn!(missed, "Audit log fell behind, outcomes not logged");
                }
                Ok(None) | Err(SubscriptionError::Closed) => break,
            }
        }
        info!(logged, "Audit log stopped");
        logged
    })
}

fn log_event(event: &LedgerEvent) {
    match event {
        LedgerEvent::TransactionNotarised {
            tx_id,
            requesting_party,
            input_count,
        } => info!(
            tx_id = %short_hex(tx_id),
            caller = %requesting_party,
            inputs = input_count,
            "Notarised"
        ),
        LedgerEvent::NotarisationRejected { tx_id, reason } => {
            warn!(tx_id = %short_hex(tx_id), %reason, "Notarisation rejected")
        }
        LedgerEvent::VaultUpdated(_) => {}
    }
}
