//! Location service: maintenance of the location registry.

use homelink_domain::error::{HomeLinkError, NotFoundError};
use homelink_domain::id::LocationId;
use homelink_domain::location::Location;

use crate::ports::{DeviceRepository, LocationRepository};

/// Application service for listing, renaming and removing locations.
pub struct LocationService<LR, DR> {
    locations: LR,
    devices: DR,
}

impl<LR, DR> LocationService<LR, DR>
where
    LR: LocationRepository,
    DR: DeviceRepository,
{
    /// Create a new service backed by the given repositories.
    pub fn new(locations: LR, devices: DR) -> Self {
        Self { locations, devices }
    }

    /// Look up a location by id.
    ///
    /// # Errors
    ///
    /// Returns [`HomeLinkError::NotFound`] when no location with `id` exists,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn get_location(&self, id: LocationId) -> Result<Location, HomeLinkError> {
        self.locations.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Location",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// List all locations.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_locations(&self) -> Result<Vec<Location>, HomeLinkError> {
        self.locations.get_all().await
    }

    /// Give a location a new unique name.
    ///
    /// # Errors
    ///
    /// Returns [`HomeLinkError::NotFound`] if the location does not exist,
    /// [`HomeLinkError::Format`] for an empty name, or a conflict when the
    /// name is taken.
    #[tracing::instrument(skip(self))]
    pub async fn rename(&self, id: LocationId, name: &str) -> Result<Location, HomeLinkError> {
        let mut location = self.get_location(id).await?;
        location.name = name.to_string();
        location.validate()?;
        self.locations.update(location).await
    }

    /// Change the category of a location.
    ///
    /// Devices keep their location; their channels change with it.
    ///
    /// # Errors
    ///
    /// Returns [`HomeLinkError::NotFound`] if the location does not exist,
    /// [`HomeLinkError::Format`] for an empty type, or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn change_type(&self, id: LocationId, kind: &str) -> Result<Location, HomeLinkError> {
        let mut location = self.get_location(id).await?;
        location.kind = kind.to_string();
        location.validate()?;
        self.locations.update(location).await
    }

    /// Delete an empty location.
    ///
    /// # Errors
    ///
    /// Returns [`HomeLinkError::LocationInUse`] while devices still reference
    /// the location, [`HomeLinkError::NotFound`] if it does not exist, or a
    /// storage error.
    #[tracing::instrument(skip(self))]
    pub async fn delete_location(&self, id: LocationId) -> Result<(), HomeLinkError> {
        self.get_location(id).await?;
        let devices = self.devices.count_by_location(id).await?;
        if devices > 0 {
            return Err(HomeLinkError::LocationInUse { id, devices });
        }
        self.locations.delete(id).await
    }
}
