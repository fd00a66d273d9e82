use std::sync::Arc;

use anyhow::Context;
use custos_core::AuditEvent;
use custos_core::ports::{AuditRepository, EventBus};
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Long-lived consumer loop: subscribes to the audit channel and persists
/// each delivered event.
///
/// One bad message never stops the loop. A malformed payload or a store
/// write failure is logged and the loop moves on to the next message; events
/// published while no consumer is subscribed are lost (at-most-once channel).
/// The loop exits when the delivery stream ends or the shutdown token fires,
/// whichever comes first.
pub async fn run_audit_consumer(
    bus: Arc<dyn EventBus>,
    store: Arc<dyn AuditRepository>,
    channel: String,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let mut stream = bus
        .subscribe(&channel)
        .await
        .with_context(|| format!("failed to subscribe to audit channel {channel}"))?;

    info!(channel, "audit consumer subscribed");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("audit consumer shutting down");
                break;
            }
            message = stream.next() => {
                let Some(payload) = message else {
                    info!("audit channel closed");
                    break;
                };

                let event: AuditEvent = match serde_json::from_slice(&payload) {
                    Ok(event) => event,
                    Err(error) => {
                        warn!(%error, "discarding malformed audit payload");
                        continue;
                    }
                };

                if let Err(error) = store.create(&event).await {
                    warn!(%error, event = event.event.as_str(), "failed to persist audit event");
                }
            }
        }
    }

    Ok(())
}
