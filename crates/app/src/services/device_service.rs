//! Device service: registration and relocation of devices.

use homelink_domain::device::Device;
use homelink_domain::error::{FormatError, HomeLinkError, NotFoundError, PersistenceError};
use homelink_domain::id::{DeviceId, LocationId};
use homelink_domain::location::Location;
use homelink_domain::module::TypedModule;
use homelink_domain::time::now;

use crate::ports::{DeviceRepository, LocationRepository, MessagePublisher};

/// Outcome of [`DeviceService::check_or_create`].
#[derive(Debug, Clone, PartialEq)]
pub enum Registration {
    /// The device was already known; the stored record is returned untouched.
    Existing(Device),
    /// The device was created together with its modules.
    Created(Device),
}

impl Registration {
    #[must_use]
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }

    #[must_use]
    pub fn device(&self) -> &Device {
        match self {
            Self::Existing(device) | Self::Created(device) => device,
        }
    }

    #[must_use]
    pub fn into_device(self) -> Device {
        match self {
            Self::Existing(device) | Self::Created(device) => device,
        }
    }
}

/// Application service for the device and location registry.
pub struct DeviceService<DR, LR, P> {
    devices: DR,
    locations: LR,
    publisher: P,
}

impl<DR, LR, P> DeviceService<DR, LR, P>
where
    DR: DeviceRepository,
    LR: LocationRepository,
    P: MessagePublisher,
{
    /// Create a new service backed by the given repositories and publisher.
    pub fn new(devices: DR, locations: LR, publisher: P) -> Self {
        Self {
            devices,
            locations,
            publisher,
        }
    }

    /// Look up a device, returning `None` when it is not registered.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn find_device(&self, id: &DeviceId) -> Result<Option<Device>, HomeLinkError> {
        self.devices.get_by_id(id).await
    }

    /// Look up a device with its location and modules.
    ///
    /// # Errors
    ///
    /// Returns [`HomeLinkError::NotFound`] when no device with `id` exists,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self, id), fields(device_id = %id))]
    pub async fn get_device(&self, id: &DeviceId) -> Result<Device, HomeLinkError> {
        self.find_device(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Device",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// Every device assigned to a location.
    ///
    /// # Errors
    ///
    /// Returns [`HomeLinkError::NotFound`] when the location holds no device.
    #[tracing::instrument(skip(self))]
    pub async fn get_devices_by_location(
        &self,
        location_id: LocationId,
    ) -> Result<Vec<Device>, HomeLinkError> {
        let devices = self.devices.get_by_location_id(location_id).await?;
        if devices.is_empty() {
            return Err(NotFoundError {
                entity: "Device in location",
                id: location_id.to_string(),
            }
            .into());
        }
        Ok(devices)
    }

    /// All registered devices.
    ///
    /// # Errors
    ///
    /// Returns [`HomeLinkError::NotFound`] when no device is registered.
    pub async fn list_devices(&self) -> Result<Vec<Device>, HomeLinkError> {
        let devices = self.devices.get_all().await?;
        if devices.is_empty() {
            return Err(NotFoundError {
                entity: "Device",
                id: "*".to_string(),
            }
            .into());
        }
        Ok(devices)
    }

    /// Register a device unless it already exists.
    ///
    /// A known device is returned as stored, without reconciling the
    /// candidate against it. Otherwise its location is resolved or created and
    /// the device is inserted with all of its modules. Losing a creation race
    /// to a concurrent registration of the same device yields the winner's
    /// record.
    ///
    /// # Errors
    ///
    /// Returns [`HomeLinkError::Format`] if the candidate is invalid, or a
    /// storage error from the repositories.
    #[tracing::instrument(skip(self, candidate), fields(device_id = %candidate.id))]
    pub async fn check_or_create(&self, candidate: Device) -> Result<Registration, HomeLinkError> {
        if let Some(existing) = self.devices.get_by_id(&candidate.id).await? {
            return Ok(Registration::Existing(existing));
        }
        candidate.validate()?;

        let location = self.resolve_location(candidate.location.clone()).await?;
        let id = candidate.id.clone();
        let ts = now();
        let device = Device {
            location,
            created_at: ts,
            updated_at: ts,
            ..candidate
        };

        match self.devices.create(device).await {
            Ok(created) => {
                tracing::info!(modules = created.modules.len(), "device registered");
                Ok(Registration::Created(created))
            }
            Err(err) if err.is_conflict() => {
                tracing::debug!(%err, "device registered concurrently, re-reading");
                self.get_device(&id).await.map(Registration::Existing)
            }
            Err(err) => Err(err),
        }
    }

    /// Find the location the candidate designates, creating it when absent.
    ///
    /// The candidate's id is tried first, then its unique name. When the
    /// insert loses a race the winning row is reused.
    ///
    /// # Errors
    ///
    /// Returns a storage error from the repository.
    #[tracing::instrument(skip(self, candidate), fields(location_name = %candidate.name))]
    pub async fn resolve_location(&self, candidate: Location) -> Result<Location, HomeLinkError> {
        if let Some(found) = self.lookup_location(&candidate).await? {
            return Ok(found);
        }
        let name = candidate.name.clone();
        match self.locations.create(candidate.clone()).await {
            Ok(created) => {
                tracing::info!(location_id = ?created.id, "location created");
                Ok(created)
            }
            Err(err) if err.is_conflict() => {
                tracing::debug!(%err, "location created concurrently, re-reading");
                self.lookup_location(&candidate).await?.ok_or_else(|| {
                    NotFoundError {
                        entity: "Location",
                        id: name,
                    }
                    .into()
                })
            }
            Err(err) => Err(err),
        }
    }

    async fn lookup_location(&self, candidate: &Location) -> Result<Option<Location>, HomeLinkError> {
        if let Some(id) = candidate.id
            && let Some(found) = self.locations.get_by_id(id).await?
        {
            return Ok(Some(found));
        }
        self.locations.find_by_name(&candidate.name).await
    }

    /// Move a device to the location named `name`, creating it with `kind`
    /// when absent, then tell the device to reset so it re-announces itself
    /// at its new address.
    ///
    /// The reset goes out on the channel the device was listening on before
    /// the move. Returns the device as stored after the move.
    ///
    /// # Errors
    ///
    /// Returns [`HomeLinkError::NotFound`] if the device is unknown,
    /// [`PersistenceError::Conflict`] if a location with that name exists
    /// with a different type, or a storage or transport error.
    #[tracing::instrument(skip(self, id), fields(device_id = %id))]
    pub async fn update_location(
        &self,
        id: &DeviceId,
        name: &str,
        kind: &str,
    ) -> Result<Device, HomeLinkError> {
        let device = self.get_device(id).await?;
        let candidate = Location::builder().name(name).kind(kind).build()?;
        let location = self.resolve_location(candidate).await?;
        if location.kind != kind {
            return Err(PersistenceError::Conflict {
                entity: "Location",
                key: location.name,
            }
            .into());
        }
        let location_id = location.id.ok_or_else(|| FormatError::UnresolvedLocation {
            device_id: id.to_string(),
        })?;

        self.devices.update_location(id, location_id).await?;
        self.publish_reset(&device).await?;
        self.get_device(id).await
    }

    /// Ask a device to clear its state and re-announce itself.
    ///
    /// # Errors
    ///
    /// Returns [`HomeLinkError::NotFound`] if the device is unknown, or a
    /// transport error.
    #[tracing::instrument(skip(self, id), fields(device_id = %id))]
    pub async fn reset(&self, id: &DeviceId) -> Result<(), HomeLinkError> {
        let device = self.get_device(id).await?;
        self.publish_reset(&device).await
    }

    async fn publish_reset(&self, device: &Device) -> Result<(), HomeLinkError> {
        let reset = TypedModule::reset()?;
        let channel = device.channel(reset.name().as_str())?;
        tracing::info!(topic = %channel, "publishing reset");
        self.publisher
            .publish(channel.to_string(), reset.value().to_wire())
            .await
    }
}
