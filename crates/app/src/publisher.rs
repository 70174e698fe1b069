//! Event publisher — formats state events and hands them to the transport.

use ibtester_domain::event::StateEvent;

use crate::ports::Transport;

/// Formats [`StateEvent`]s into wire payloads and sends them.
///
/// Delivery is at most once: a failed publish is logged and dropped, never
/// retried here.
pub struct EventPublisher<T> {
    transport: T,
}

impl<T: Transport> EventPublisher<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Format and send one event.
    pub async fn publish(&self, event: &StateEvent) {
        let payload = match event.to_payload() {
            Ok(payload) => payload,
            Err(err) => {
                tracing::error!(%err, %event, "failed to serialize state event");
                return;
            }
        };

        tracing::debug!(%payload, "publishing state event");
        if let Err(err) = self.transport.publish(payload).await {
            tracing::error!(%err, %event, "failed to publish state event");
        }
    }
}
