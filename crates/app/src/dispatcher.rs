//! Dispatch router: selects the handler for each inbound message.

use std::borrow::Cow;
use std::sync::Arc;

use homelink_domain::channel::{ROOT, STARTUP};

use crate::ports::{
    DataRepository, DeviceRepository, LocationRepository, MessageHandler, MessagePublisher,
};
use crate::services::provisioning_service::ProvisioningService;
use crate::services::telemetry_service::TelemetryService;

/// Handler selected for a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// `home/.../startup`: a device announcing itself.
    Provisioning,
    /// Any other `home/...` topic: a module reading.
    Telemetry,
    /// Outside the channel namespace.
    Unrecognized,
}

impl Route {
    /// Classify a topic by its prefix and suffix only.
    #[must_use]
    pub fn classify(topic: &str) -> Self {
        let in_namespace = topic
            .strip_prefix(ROOT)
            .is_some_and(|rest| rest.starts_with('/'));
        if !in_namespace {
            return Self::Unrecognized;
        }
        let is_startup = topic
            .strip_suffix(STARTUP)
            .is_some_and(|rest| rest.ends_with('/'));
        if is_startup {
            Self::Provisioning
        } else {
            Self::Telemetry
        }
    }

    fn handler(self) -> &'static str {
        match self {
            Self::Provisioning => "provisioning",
            Self::Telemetry => "telemetry",
            Self::Unrecognized => "none",
        }
    }
}

/// Routes every inbound message to provisioning or telemetry.
///
/// Failures are logged here and never returned, so one bad message has no
/// effect on the next.
pub struct Dispatcher<DR, LR, DaR, P> {
    provisioning: Arc<ProvisioningService<DR, LR, P>>,
    telemetry: Arc<TelemetryService<DR, DaR>>,
}

impl<DR, LR, DaR, P> Clone for Dispatcher<DR, LR, DaR, P> {
    fn clone(&self) -> Self {
        Self {
            provisioning: Arc::clone(&self.provisioning),
            telemetry: Arc::clone(&self.telemetry),
        }
    }
}

impl<DR, LR, DaR, P> Dispatcher<DR, LR, DaR, P>
where
    DR: DeviceRepository,
    LR: LocationRepository,
    DaR: DataRepository,
    P: MessagePublisher,
{
    pub fn new(
        provisioning: Arc<ProvisioningService<DR, LR, P>>,
        telemetry: Arc<TelemetryService<DR, DaR>>,
    ) -> Self {
        Self {
            provisioning,
            telemetry,
        }
    }

    /// Run the handler selected for `topic`, logging any failure.
    pub async fn dispatch(&self, topic: &str, payload: &[u8]) {
        let route = Route::classify(topic);
        let result = match route {
            Route::Provisioning => self
                .provisioning
                .handle_startup(topic, payload)
                .await
                .map(drop),
            Route::Telemetry => self.telemetry.handle_data(topic, payload).await.map(drop),
            Route::Unrecognized => {
                tracing::warn!(topic, payload = %printable(payload), "unrecognized topic");
                return;
            }
        };
        if let Err(err) = result {
            tracing::error!(
                handler = route.handler(),
                topic,
                payload = %printable(payload),
                %err,
                "message handling failed"
            );
        }
    }
}

fn printable(payload: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(payload)
}

impl<DR, LR, DaR, P> MessageHandler for Dispatcher<DR, LR, DaR, P>
where
    DR: DeviceRepository + Send + Sync,
    LR: LocationRepository + Send + Sync,
    DaR: DataRepository + Send + Sync,
    P: MessagePublisher + Send + Sync,
{
    async fn handle(&self, topic: &str, payload: &[u8]) {
        self.dispatch(topic, payload).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::device_service::DeviceService;
    use crate::testing::{MemoryStore, RecordingPublisher};

    const STARTUP_PAYLOAD: &str = r#"{"id":"dev42","type":"light","location_id":3,"location_type":"room","location_name":"Kitchen","modules":[{"name":"lightSensor","value":"0"}]}"#;

    fn dispatcher() -> (
        Dispatcher<MemoryStore, MemoryStore, MemoryStore, RecordingPublisher>,
        MemoryStore,
        RecordingPublisher,
    ) {
        let store = MemoryStore::default();
        let publisher = RecordingPublisher::default();
        let registry = Arc::new(DeviceService::new(
            store.clone(),
            store.clone(),
            publisher.clone(),
        ));
        let provisioning = Arc::new(ProvisioningService::new(registry, publisher.clone()));
        let telemetry = Arc::new(TelemetryService::new(store.clone(), store.clone()));
        (Dispatcher::new(provisioning, telemetry), store, publisher)
    }

    #[test]
    fn should_route_startup_topics_to_provisioning() {
        assert_eq!(
            Route::classify("home/room/3/light/dev42/startup"),
            Route::Provisioning
        );
        assert_eq!(Route::classify("home/startup"), Route::Provisioning);
    }

    #[test]
    fn should_route_other_home_topics_to_telemetry() {
        assert_eq!(
            Route::classify("home/room/3/light/dev42/lightSensor"),
            Route::Telemetry
        );
        assert_eq!(
            Route::classify("home/room/3/light/dev42/startupTime"),
            Route::Telemetry
        );
    }

    #[test]
    fn should_leave_foreign_topics_unrecognized() {
        assert_eq!(Route::classify("notifications/system"), Route::Unrecognized);
        assert_eq!(Route::classify("homeassistant/x/startup"), Route::Unrecognized);
        assert_eq!(Route::classify("home"), Route::Unrecognized);
        assert_eq!(Route::classify(""), Route::Unrecognized);
    }

    #[tokio::test]
    async fn should_provision_then_record_telemetry() {
        let (dispatcher, store, publisher) = dispatcher();

        dispatcher
            .handle("home/room/3/light/dev42/startup", STARTUP_PAYLOAD.as_bytes())
            .await;
        dispatcher
            .handle("home/room/3/light/dev42/lightSensor", b"1")
            .await;

        assert_eq!(store.device_count(), 1);
        assert_eq!(publisher.messages().len(), 1);
        let data = store.data();
        assert_eq!(data.len(), 1);
        assert!(data[0].is_resolved());
    }

    #[tokio::test]
    async fn should_swallow_handler_failures() {
        let (dispatcher, store, publisher) = dispatcher();

        dispatcher
            .handle("home/room/3/light/ghost/lightSensor", b"1")
            .await;
        dispatcher
            .handle("home/room/3/light/dev42/startup", b"garbage")
            .await;

        assert!(store.data().is_empty());
        assert_eq!(store.device_count(), 0);
        assert!(publisher.messages().is_empty());
    }

    #[tokio::test]
    async fn should_ignore_unrecognized_topics() {
        let (dispatcher, store, publisher) = dispatcher();

        dispatcher.handle("notifications/system", b"hello").await;

        assert_eq!(store.device_count(), 0);
        assert!(store.data().is_empty());
        assert!(publisher.messages().is_empty());
    }
}
