//! # homelink-adapter-mqtt
//!
//! MQTT adapter: connects homelink to the broker devices talk through.
//!
//! ## Responsibilities
//! - Connect to an MQTT broker and keep the connection alive
//! - Subscribe to the device namespace on every (re)connection
//! - Hand every inbound message to a `MessageHandler` on its own task
//! - Publish outbound messages through the `MessagePublisher` port
//!
//! ## Dependency rule
//! Same as other adapters: depends on `homelink-app` and `homelink-domain`.

mod config;
mod error;
mod listener;
mod publisher;

pub use config::MqttConfig;
pub use error::MqttError;
pub use listener::Listener;
pub use publisher::MqttPublisher;

use rumqttc::AsyncClient;

/// Create the client pair for `config`.
///
/// Nothing touches the network until the returned [`Listener`] runs.
///
/// # Errors
///
/// Returns [`MqttError::InvalidQos`] when the configured level is above 2.
pub fn connect(config: &MqttConfig) -> Result<(MqttPublisher, Listener), MqttError> {
    let qos = config.qos()?;
    let (client, eventloop) = AsyncClient::new(config.options(), config.channel_capacity);
    tracing::info!(
        host = %config.broker_host,
        port = config.broker_port,
        client_id = %config.client_id,
        "mqtt client created"
    );
    let publisher = MqttPublisher::new(client.clone(), qos);
    let listener = Listener::new(
        client,
        eventloop,
        config.subscription.clone(),
        qos,
        config.reconnect_delay(),
    );
    Ok((publisher, listener))
}

#[cfg(test)]
mod tests {
    use super::*;
    use homelink_app::ports::MessagePublisher;

    #[test]
    fn should_reject_invalid_qos_before_creating_client() {
        let config = MqttConfig {
            qos: 5,
            ..MqttConfig::default()
        };
        assert!(matches!(connect(&config), Err(MqttError::InvalidQos(5))));
    }

    #[tokio::test]
    async fn should_create_publisher_and_listener() {
        let (publisher, _listener) = connect(&MqttConfig::default()).unwrap();
        publisher
            .publish("home/room/3/light/dev42/setup".to_string(), "{}".to_string())
            .await
            .unwrap();
    }
}
