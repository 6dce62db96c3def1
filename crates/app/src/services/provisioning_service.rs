//! Provisioning service: the startup handshake.
//!
//! A device announces itself with a JSON document on its `startup` channel.
//! The hub registers it when unknown and answers on the `setup` channel with
//! the device as stored, which is how a device learns the location id it was
//! assigned.

use std::sync::Arc;

use homelink_domain::channel::{Channel, SETUP};
use homelink_domain::error::HomeLinkError;
use homelink_domain::startup::StartupMessage;

use crate::ports::{DeviceRepository, LocationRepository, MessagePublisher};
use crate::services::device_service::{DeviceService, Registration};

/// Application service answering device startup announcements.
pub struct ProvisioningService<DR, LR, P> {
    registry: Arc<DeviceService<DR, LR, P>>,
    publisher: P,
}

impl<DR, LR, P> ProvisioningService<DR, LR, P>
where
    DR: DeviceRepository,
    LR: LocationRepository,
    P: MessagePublisher,
{
    /// Create a new service registering devices through `registry` and
    /// answering through `publisher`.
    pub fn new(registry: Arc<DeviceService<DR, LR, P>>, publisher: P) -> Self {
        Self {
            registry,
            publisher,
        }
    }

    /// Handle one startup announcement.
    ///
    /// An already registered device is answered with its stored record; the
    /// announcement is not merged into it. The payload's `id` is the device
    /// identity; a topic naming another device is only logged.
    ///
    /// # Errors
    ///
    /// Returns [`HomeLinkError::Format`] for a malformed document,
    /// [`HomeLinkError::UnknownModule`] when it lists a module outside the
    /// enumeration, or a storage or transport error. No response is
    /// published on error.
    #[tracing::instrument(skip(self, payload))]
    pub async fn handle_startup(
        &self,
        topic: &str,
        payload: &[u8],
    ) -> Result<Registration, HomeLinkError> {
        let message = StartupMessage::from_payload(payload)?;
        if let Ok(channel) = topic.parse::<Channel>()
            && channel.device_id.as_str() != message.id
        {
            tracing::warn!(
                topic_device_id = %channel.device_id,
                payload_device_id = %message.id,
                "startup topic names another device, using the payload identity"
            );
        }
        let candidate = message.to_device()?;

        let registration = self.registry.check_or_create(candidate).await?;
        let device = registration.device();

        let response = StartupMessage::from_device(device).to_payload()?;
        let channel = device.channel(SETUP)?;
        tracing::info!(
            device_id = %device.id,
            created = registration.is_created(),
            reply_to = %channel,
            "answering startup"
        );
        self.publisher.publish(channel.to_string(), response).await?;
        Ok(registration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryStore, RecordingPublisher};
    use homelink_domain::error::FormatError;
    use homelink_domain::id::LocationId;

    const TOPIC: &str = "home/room/3/light/dev42/startup";
    const KITCHEN_LIGHT: &str = r#"{"id":"dev42","type":"light","location_id":3,"location_type":"room","location_name":"Kitchen","modules":[{"name":"lightController","value":"true"}]}"#;

    type Service = ProvisioningService<MemoryStore, MemoryStore, RecordingPublisher>;

    fn service() -> (Service, MemoryStore, RecordingPublisher) {
        let store = MemoryStore::default();
        let publisher = RecordingPublisher::default();
        let registry = Arc::new(DeviceService::new(
            store.clone(),
            store.clone(),
            publisher.clone(),
        ));
        (
            ProvisioningService::new(registry, publisher.clone()),
            store,
            publisher,
        )
    }

    fn response(payload: &str) -> serde_json::Value {
        serde_json::from_str(payload).unwrap()
    }

    #[tokio::test]
    async fn should_register_device_and_answer_on_setup_channel() {
        let (service, store, publisher) = service();

        let registration = service
            .handle_startup(TOPIC, KITCHEN_LIGHT.as_bytes())
            .await
            .unwrap();

        assert!(registration.is_created());
        assert_eq!(store.device_count(), 1);
        let messages = publisher.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, "home/room/3/light/dev42/setup");
        assert_eq!(
            response(&messages[0].1),
            serde_json::json!({
                "id": "dev42",
                "type": "light",
                "location_id": 3,
                "location_type": "room",
                "location_name": "Kitchen",
                "modules": [{"name": "lightController", "value": "true"}],
            })
        );
    }

    #[tokio::test]
    async fn should_answer_with_stored_record_when_device_known() {
        let (service, store, publisher) = service();
        service
            .handle_startup(TOPIC, KITCHEN_LIGHT.as_bytes())
            .await
            .unwrap();

        let changed = KITCHEN_LIGHT.replace("\"true\"", "\"false\"");
        let registration = service
            .handle_startup(TOPIC, changed.as_bytes())
            .await
            .unwrap();

        assert!(!registration.is_created());
        assert_eq!(store.device_count(), 1);
        let messages = publisher.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], messages[1]);
    }

    #[tokio::test]
    async fn should_assign_location_id_when_device_announces_zero() {
        let (service, _, publisher) = service();
        let payload = r#"{"id":"dev7","type":"sensor","location_id":0,"location_type":"room","location_name":"Attic","modules":[]}"#;

        let registration = service
            .handle_startup("home/room/0/sensor/dev7/startup", payload.as_bytes())
            .await
            .unwrap();

        let location_id = registration.device().location.id.unwrap();
        assert!(location_id.get() > 0);
        let messages = publisher.messages();
        assert_eq!(
            messages[0].0,
            format!("home/room/{location_id}/sensor/dev7/setup")
        );
        assert_eq!(response(&messages[0].1)["location_id"], location_id.get());
    }

    #[tokio::test]
    async fn should_reject_malformed_document_without_response() {
        let (service, store, publisher) = service();

        let err = service
            .handle_startup(TOPIC, b"{not json")
            .await
            .unwrap_err();

        assert!(matches!(err, HomeLinkError::Format(FormatError::Json(_))));
        assert_eq!(store.device_count(), 0);
        assert!(publisher.messages().is_empty());
    }

    #[tokio::test]
    async fn should_reject_unknown_module_without_registering() {
        let (service, store, publisher) = service();
        let payload = KITCHEN_LIGHT.replace("lightController", "toaster");

        let err = service
            .handle_startup(TOPIC, payload.as_bytes())
            .await
            .unwrap_err();

        assert!(matches!(err, HomeLinkError::UnknownModule(_)));
        assert_eq!(store.device_count(), 0);
        assert!(publisher.messages().is_empty());
    }

    #[tokio::test]
    async fn should_register_payload_identity_when_topic_names_other_device() {
        let (service, store, publisher) = service();

        let registration = service
            .handle_startup("home/room/3/light/dev99/startup", KITCHEN_LIGHT.as_bytes())
            .await
            .unwrap();

        assert_eq!(registration.device().id.as_str(), "dev42");
        assert_eq!(store.device_count(), 1);
        assert_eq!(publisher.messages()[0].0, "home/room/3/light/dev42/setup");
    }

    #[tokio::test]
    async fn should_share_location_by_name_when_handshakes_race_without_id() {
        let (service, store, publisher) = service();
        let first = r#"{"id":"dev7","type":"sensor","location_id":0,"location_type":"room","location_name":"New","modules":[]}"#;
        let second = first.replace("dev7", "dev8");

        let (first, second) = tokio::join!(
            service.handle_startup("home/room/1/sensor/dev7/startup", first.as_bytes()),
            service.handle_startup("home/room/1/sensor/dev8/startup", second.as_bytes()),
        );

        let first = first.unwrap().into_device();
        let second = second.unwrap().into_device();
        assert!(first.location.id.is_some());
        assert_eq!(first.location.id, second.location.id);
        assert_eq!(store.location_count(), 1);
        assert_eq!(store.device_count(), 2);
        assert_eq!(publisher.messages().len(), 2);
    }

    #[tokio::test]
    async fn should_share_new_location_between_concurrent_handshakes() {
        let (service, store, publisher) = service();
        let other = KITCHEN_LIGHT.replace("dev42", "dev43");

        let (first, second) = tokio::join!(
            service.handle_startup(TOPIC, KITCHEN_LIGHT.as_bytes()),
            service.handle_startup("home/room/3/light/dev43/startup", other.as_bytes()),
        );

        assert_eq!(
            first.unwrap().device().location.id,
            Some(LocationId::new(3))
        );
        assert_eq!(
            second.unwrap().device().location.id,
            Some(LocationId::new(3))
        );
        assert_eq!(store.location_count(), 1);
        assert_eq!(store.device_count(), 2);
        assert_eq!(publisher.messages().len(), 2);
    }
}
