//! MQTT adapter error types.

use homelink_domain::error::HomeLinkError;

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// The rumqttc client rejected a request, usually because its event
    /// loop is gone.
    #[error("MQTT client error")]
    Client(#[source] rumqttc::ClientError),

    /// Quality of service outside 0..=2.
    #[error("invalid MQTT QoS level {0}")]
    InvalidQos(u8),
}

impl MqttError {
    /// Convert into a [`HomeLinkError::Transport`] for propagation across
    /// port boundaries.
    #[must_use]
    pub fn into_domain(self) -> HomeLinkError {
        HomeLinkError::Transport(Box::new(self))
    }
}

impl From<MqttError> for HomeLinkError {
    fn from(err: MqttError) -> Self {
        err.into_domain()
    }
}
