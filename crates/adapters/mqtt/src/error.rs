//! MQTT adapter error types.

use ibtester_domain::error::TesterError;

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// The configured QoS is not 0, 1 or 2.
    #[error("invalid MQTT QoS level {0}")]
    InvalidQos(u8),

    /// The rumqttc client returned an error.
    #[error("MQTT client error")]
    Client(#[from] rumqttc::ClientError),

    /// The broker could not be reached or refused the connection.
    #[error("MQTT connection failed")]
    Connection(#[from] rumqttc::ConnectionError),
}

impl From<MqttError> for TesterError {
    fn from(err: MqttError) -> Self {
        Self::Transport(Box::new(err))
    }
}
