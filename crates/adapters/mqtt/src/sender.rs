//! Outbound side — publishes state events on the state topic.

use rumqttc::{AsyncClient, QoS};

use ibtester_app::ports::Transport;
use ibtester_domain::error::TesterError;

use crate::error::MqttError;

/// [`Transport`] that publishes every payload, non-retained, on the state topic.
#[derive(Clone)]
pub struct MqttTransport {
    client: AsyncClient,
    topic_state: String,
    qos: QoS,
}

impl MqttTransport {
    pub(crate) fn new(client: AsyncClient, topic_state: String, qos: QoS) -> Self {
        Self {
            client,
            topic_state,
            qos,
        }
    }

    /// Send a DISCONNECT to the broker.
    ///
    /// # Errors
    ///
    /// Returns [`MqttError::Client`] when the event loop is already gone.
    pub async fn disconnect(&self) -> Result<(), MqttError> {
        self.client.disconnect().await?;
        Ok(())
    }
}

impl Transport for MqttTransport {
    async fn publish(&self, payload: String) -> Result<(), TesterError> {
        tracing::debug!(topic = %self.topic_state, %payload, "MQTT send");
        self.client
            .publish(&self.topic_state, self.qos, false, payload)
            .await
            .map_err(MqttError::from)?;
        Ok(())
    }
}
