//! Inbound side — drives the rumqttc event loop and forwards command payloads.

use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, Packet, QoS};
use tokio::sync::mpsc;

use crate::error::MqttError;

/// Pause before polling again after the connection dropped.
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Owns the MQTT event loop. Must be polled for anything to be sent or received.
pub struct MqttLink {
    client: AsyncClient,
    event_loop: EventLoop,
    topic_cmd: String,
    qos: QoS,
}

impl MqttLink {
    pub(crate) fn new(client: AsyncClient, event_loop: EventLoop, topic_cmd: String, qos: QoS) -> Self {
        Self {
            client,
            event_loop,
            topic_cmd,
            qos,
        }
    }

    /// Poll until the broker acknowledges the first connection.
    ///
    /// # Errors
    ///
    /// Returns [`MqttError::Connection`] when the broker is unreachable or
    /// refuses the connection.
    pub async fn wait_connected(&mut self) -> Result<(), MqttError> {
        loop {
            if let Event::Incoming(Packet::ConnAck(_)) = self.event_loop.poll().await? {
                self.on_connected();
                return Ok(());
            }
        }
    }

    /// Forward command payloads into `inbound` until its receiver is dropped.
    ///
    /// Connection errors are logged and the loop keeps polling, which makes
    /// rumqttc reconnect. The command subscription is renewed on every
    /// reconnect.
    ///
    /// `inbound` is unbounded: the event loop must keep being polled while
    /// the receiver is blocked publishing answers, since those publishes only
    /// leave the request queue through this loop.
    pub async fn run(mut self, inbound: mpsc::UnboundedSender<Vec<u8>>) {
        loop {
            match self.event_loop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => self.on_connected(),
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    let Some(payload) = command_payload(&self.topic_cmd, &publish.topic, &publish.payload)
                    else {
                        tracing::debug!(topic = %publish.topic, "ignoring message on foreign topic");
                        continue;
                    };
                    tracing::debug!(
                        topic = %publish.topic,
                        len = payload.len(),
                        payload = %String::from_utf8_lossy(&payload),
                        "MQTT recv"
                    );
                    if inbound.send(payload).is_err() {
                        tracing::info!("command receiver dropped, stopping MQTT loop");
                        return;
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(%err, "MQTT connection lost");
                    tokio::time::sleep(RECONNECT_DELAY).await;
                }
            }
        }
    }

    /// Queue the command subscription without blocking the event loop.
    ///
    /// The request queue may be full of pending publishes right after a
    /// reconnect, so the subscribe waits for a slot on its own task while
    /// the loop keeps draining the queue.
    fn on_connected(&self) {
        tracing::info!(topic = %self.topic_cmd, "connected to MQTT broker, subscribing");
        let client = self.client.clone();
        let topic = self.topic_cmd.clone();
        let qos = self.qos;
        tokio::spawn(async move {
            if let Err(err) = client.subscribe(&topic, qos).await {
                tracing::error!(%err, %topic, "failed to subscribe to command topic");
            }
        });
    }
}

/// Payload of a message if it arrived on the command topic.
fn command_payload(topic_cmd: &str, topic: &str, payload: &[u8]) -> Option<Vec<u8>> {
    (topic == topic_cmd).then(|| payload.to_vec())
}
