//! MQTT transport configuration.

use serde::Deserialize;

/// Configuration for the MQTT transport.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// MQTT broker hostname or IP address.
    pub broker_host: String,
    /// MQTT broker port.
    pub broker_port: u16,
    /// MQTT client identifier.
    pub client_id: String,
    /// Optional broker credentials.
    pub username: Option<String>,
    pub password: Option<String>,
    /// Topic the controller publishes commands on.
    pub topic_cmd: String,
    /// Topic state events are published on.
    pub topic_state: String,
    /// QoS level (0, 1 or 2) for the subscription and for published events.
    pub qos: u8,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u16,
    /// Start each connection with a clean session.
    pub clean_session: bool,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_host: "127.0.0.1".to_string(),
            broker_port: 1883,
            client_id: "imx6ul-ibutton".to_string(),
            username: None,
            password: None,
            topic_cmd: "board/ibutton/command".to_string(),
            topic_state: "board/ibutton/state".to_string(),
            qos: 1,
            keep_alive_secs: 20,
            clean_session: true,
        }
    }
}
