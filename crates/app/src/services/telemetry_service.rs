//! Telemetry service: ingestion of module readings.

use homelink_domain::channel::Channel;
use homelink_domain::data::Data;
use homelink_domain::error::{FormatError, HomeLinkError, NotFoundError};
use homelink_domain::id::DeviceId;

use crate::ports::{DataRepository, DeviceRepository};

/// Application service persisting readings published by devices.
pub struct TelemetryService<DR, DaR> {
    devices: DR,
    data: DaR,
}

impl<DR, DaR> TelemetryService<DR, DaR>
where
    DR: DeviceRepository,
    DaR: DataRepository,
{
    /// Create a new service backed by the given repositories.
    pub fn new(devices: DR, data: DaR) -> Self {
        Self { devices, data }
    }

    /// Record the reading carried by one telemetry message.
    ///
    /// The device must already be registered. A reading for a module the
    /// device never announced is still stored, without a module id.
    ///
    /// # Errors
    ///
    /// Returns [`HomeLinkError::Format`] for a malformed topic or an empty or
    /// non-UTF-8 payload, [`HomeLinkError::NotFound`] for an unregistered
    /// device, or a storage error when the insert fails.
    #[tracing::instrument(skip(self, payload))]
    pub async fn handle_data(&self, topic: &str, payload: &[u8]) -> Result<Data, HomeLinkError> {
        let channel: Channel = topic.parse()?;
        if payload.is_empty() {
            return Err(FormatError::EmptyPayload.into());
        }
        let value = std::str::from_utf8(payload).map_err(FormatError::Encoding)?;
        let mut data = Data::from_channel(&channel, value);

        let device = self
            .devices
            .get_by_id(&channel.device_id)
            .await?
            .ok_or_else(|| NotFoundError {
                entity: "Device",
                id: channel.device_id.to_string(),
            })?;
        data.module_id = device.module(&channel.module).and_then(|module| module.id);
        if !data.is_resolved() {
            tracing::warn!(module = %channel.module, "reading for unannounced module");
        }

        self.data.insert(data).await
    }

    /// The most recent readings of a device, newest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    #[tracing::instrument(skip(self, device_id), fields(device_id = %device_id))]
    pub async fn recent_readings(
        &self,
        device_id: &DeviceId,
        limit: usize,
    ) -> Result<Vec<Data>, HomeLinkError> {
        self.data.find_by_device(device_id, limit).await
    }
}
