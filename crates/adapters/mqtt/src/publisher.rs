//! Outbound side of the transport.

use std::future::Future;

use rumqttc::{AsyncClient, QoS};

use homelink_app::ports::MessagePublisher;
use homelink_domain::error::HomeLinkError;

use crate::error::MqttError;

/// [`MessagePublisher`] backed by a rumqttc client.
///
/// Publishing completes once the message is queued for the event loop; the
/// broker acknowledgement is handled by the [`Listener`](crate::Listener)
/// driving that loop.
#[derive(Clone)]
pub struct MqttPublisher {
    client: AsyncClient,
    qos: QoS,
}

impl MqttPublisher {
    pub(crate) fn new(client: AsyncClient, qos: QoS) -> Self {
        Self { client, qos }
    }
}

impl MessagePublisher for MqttPublisher {
    fn publish(
        &self,
        topic: String,
        payload: String,
    ) -> impl Future<Output = Result<(), HomeLinkError>> + Send {
        let client = self.client.clone();
        let qos = self.qos;
        async move {
            tracing::debug!(%topic, %payload, "publishing");
            client
                .publish(topic, qos, false, payload)
                .await
                .map_err(MqttError::Client)?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MqttConfig;

    #[tokio::test]
    async fn should_queue_message_while_event_loop_alive() {
        let config = MqttConfig::default();
        let (client, _eventloop) = AsyncClient::new(config.options(), 10);
        let publisher = MqttPublisher::new(client, QoS::AtLeastOnce);

        publisher
            .publish("home/room/3/light/dev42/reset".to_string(), "true".to_string())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn should_fail_with_transport_error_when_event_loop_gone() {
        let config = MqttConfig::default();
        let (client, eventloop) = AsyncClient::new(config.options(), 10);
        drop(eventloop);
        let publisher = MqttPublisher::new(client, QoS::AtLeastOnce);

        let err = publisher
            .publish("home/room/3/light/dev42/reset".to_string(), "true".to_string())
            .await
            .unwrap_err();

        assert!(matches!(err, HomeLinkError::Transport(_)));
    }
}
