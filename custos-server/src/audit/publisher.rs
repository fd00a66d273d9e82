use std::sync::Arc;

use custos_core::AuditEvent;
use custos_core::ports::EventBus;
use tracing::warn;

/// Fire-and-forget emission of audit events onto the shared channel.
///
/// A serialization or publish failure is logged and swallowed; the request
/// path never waits on audit persistence and never fails with it.
#[derive(Clone)]
pub struct AuditPublisher {
    bus: Arc<dyn EventBus>,
    channel: String,
}

impl AuditPublisher {
    pub fn new(bus: Arc<dyn EventBus>, channel: impl Into<String>) -> Self {
        Self {
            bus,
            channel: channel.into(),
        }
    }

    pub async fn publish(&self, event: AuditEvent) {
        let payload = match serde_json::to_vec(&event) {
            Ok(payload) => payload,
            Err(error) => {
                warn!(%error, event = event.event.as_str(), "failed to serialize audit event");
                return;
            }
        };

        if let Err(error) = self.bus.publish(&self.channel, payload).await {
            warn!(%error, event = event.event.as_str(), "failed to publish audit event");
        }
    }
}

impl std::fmt::Debug for AuditPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditPublisher")
            .field("channel", &self.channel)
            .finish_non_exhaustive()
    }
}
