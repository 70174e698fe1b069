//! # ibtester-adapter-mqtt
//!
//! MQTT adapter — the remote-control channel of the tester.
//!
//! ## Responsibilities
//! - Connect to an MQTT broker (optional credentials, keep-alive, clean session)
//! - Subscribe to the command topic, renewing the subscription on reconnect
//! - Forward command payloads to the application over an mpsc channel
//! - Publish state events on the state topic (the app's `Transport` port)
//!
//! ## Dependency rule
//! Same as other adapters: depends on `ibtester-app` and `ibtester-domain`.

mod client;
mod config;
mod error;
mod sender;

pub use client::MqttLink;
pub use config::MqttConfig;
pub use error::MqttError;
pub use sender::MqttTransport;

use std::time::Duration;

use rumqttc::{AsyncClient, MqttOptions, QoS};

/// Capacity of the rumqttc request queue.
const REQUEST_CAPACITY: usize = 16;

/// Build the client halves for `config`.
///
/// Nothing touches the network until [`MqttLink::wait_connected`] or
/// [`MqttLink::run`] polls the event loop.
///
/// # Errors
///
/// Returns [`MqttError::InvalidQos`] when `config.qos` is above 2.
pub fn build(config: &MqttConfig) -> Result<(MqttLink, MqttTransport), MqttError> {
    let qos = qos_from_level(config.qos)?;

    let mut options = MqttOptions::new(&config.client_id, &config.broker_host, config.broker_port);
    options.set_keep_alive(Duration::from_secs(u64::from(config.keep_alive_secs)));
    options.set_clean_session(config.clean_session);
    if let Some(username) = &config.username {
        options.set_credentials(username, config.password.as_deref().unwrap_or_default());
    }

    tracing::info!(
        host = %config.broker_host,
        port = config.broker_port,
        client_id = %config.client_id,
        "configuring MQTT client"
    );

    let (client, event_loop) = AsyncClient::new(options, REQUEST_CAPACITY);
    let link = MqttLink::new(client.clone(), event_loop, config.topic_cmd.clone(), qos);
    let transport = MqttTransport::new(client, config.topic_state.clone(), qos);
    Ok((link, transport))
}

fn qos_from_level(level: u8) -> Result<QoS, MqttError> {
    match level {
        0 => Ok(QoS::AtMostOnce),
        1 => Ok(QoS::AtLeastOnce),
        2 => Ok(QoS::ExactlyOnce),
        other => Err(MqttError::InvalidQos(other)),
    }
}
