//! MQTT transport configuration.

use std::time::Duration;

use rumqttc::{MqttOptions, QoS};
use serde::Deserialize;

use crate::error::MqttError;

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
    /// Topic filter subscribed on every (re)connection.
    pub subscription: String,
    /// Quality of service for the subscription and outbound messages (0, 1 or 2).
    pub qos: u8,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u16,
    /// Pause after a connection error before polling again, in seconds.
    pub reconnect_delay_secs: u64,
    /// Capacity of the client's outbound request queue.
    pub channel_capacity: usize,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            client_id: "homelink".to_string(),
            subscription: "home/#".to_string(),
            qos: 1,
            keep_alive_secs: 30,
            reconnect_delay_secs: 1,
            channel_capacity: 10,
        }
    }
}

impl MqttConfig {
    /// The configured quality of service.
    ///
    /// # Errors
    ///
    /// Returns [`MqttError::InvalidQos`] for a level above 2.
    pub fn qos(&self) -> Result<QoS, MqttError> {
        match self.qos {
            0 => Ok(QoS::AtMostOnce),
            1 => Ok(QoS::AtLeastOnce),
            2 => Ok(QoS::ExactlyOnce),
            other => Err(MqttError::InvalidQos(other)),
        }
    }

    #[must_use]
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    pub(crate) fn options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(&self.client_id, &self.broker_host, self.broker_port);
        options.set_keep_alive(Duration::from_secs(u64::from(self.keep_alive_secs)));
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_have_sensible_defaults() {
        let config = MqttConfig::default();
        assert_eq!(config.broker_host, "localhost");
        assert_eq!(config.broker_port, 1883);
        assert_eq!(config.client_id, "homelink");
        assert_eq!(config.subscription, "home/#");
        assert_eq!(config.qos().unwrap(), QoS::AtLeastOnce);
        assert_eq!(config.reconnect_delay(), Duration::from_secs(1));
    }

    #[test]
    fn should_deserialize_from_toml() {
        let toml = r#"
            broker_host = "mqtt.example.com"
            broker_port = 8883
            client_id = "hub"
            subscription = "home/room/#"
            qos = 2
            keep_alive_secs = 60
            reconnect_delay_secs = 5
        "#;
        let config: MqttConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.broker_host, "mqtt.example.com");
        assert_eq!(config.broker_port, 8883);
        assert_eq!(config.client_id, "hub");
        assert_eq!(config.subscription, "home/room/#");
        assert_eq!(config.qos().unwrap(), QoS::ExactlyOnce);
        assert_eq!(config.keep_alive_secs, 60);
        assert_eq!(config.reconnect_delay_secs, 5);
    }

    #[test]
    fn should_use_defaults_for_missing_fields() {
        let toml = r#"broker_host = "192.168.1.100""#;
        let config: MqttConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.broker_host, "192.168.1.100");
        assert_eq!(config.broker_port, 1883);
        assert_eq!(config.subscription, "home/#");
    }

    #[test]
    fn should_reject_qos_above_two() {
        let config = MqttConfig {
            qos: 3,
            ..MqttConfig::default()
        };
        assert!(matches!(config.qos(), Err(MqttError::InvalidQos(3))));
    }
}
