//! Storage port: repository traits for persistence.
//!
//! Implementations report a missing row as `Ok(None)` on reads and as
//! [`PersistenceError::NoRowsAffected`](homelink_domain::error::PersistenceError)
//! on writes; unique-constraint violations surface as
//! [`PersistenceError::Conflict`](homelink_domain::error::PersistenceError).

use std::future::Future;

use homelink_domain::data::Data;
use homelink_domain::device::Device;
use homelink_domain::error::HomeLinkError;
use homelink_domain::id::{DeviceId, LocationId, ModuleId};
use homelink_domain::location::Location;
use homelink_domain::module::Module;

/// Repository for [`Location`]s. Names are unique.
pub trait LocationRepository {
    /// Insert a location, keeping its id when it carries one and assigning a
    /// fresh one otherwise.
    fn create(
        &self,
        location: Location,
    ) -> impl Future<Output = Result<Location, HomeLinkError>> + Send;

    /// Get a location by id.
    fn get_by_id(
        &self,
        id: LocationId,
    ) -> impl Future<Output = Result<Option<Location>, HomeLinkError>> + Send;

    /// Get a location by its unique name.
    fn find_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Location>, HomeLinkError>> + Send;

    /// Get all locations, ordered by id.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Location>, HomeLinkError>> + Send;

    /// Update the name and type of an existing location.
    fn update(
        &self,
        location: Location,
    ) -> impl Future<Output = Result<Location, HomeLinkError>> + Send;

    /// Delete a location by id.
    fn delete(&self, id: LocationId) -> impl Future<Output = Result<(), HomeLinkError>> + Send;
}

/// Repository for [`Device`]s, eagerly loading their location and modules.
pub trait DeviceRepository {
    /// Insert a device together with its modules as one logical operation.
    ///
    /// The device's location must already be persisted. Returns the device
    /// with module ids filled in.
    fn create(&self, device: Device) -> impl Future<Output = Result<Device, HomeLinkError>> + Send;

    /// Get a device with its location and modules.
    fn get_by_id(
        &self,
        id: &DeviceId,
    ) -> impl Future<Output = Result<Option<Device>, HomeLinkError>> + Send;

    /// Get every device assigned to a location.
    fn get_by_location_id(
        &self,
        location_id: LocationId,
    ) -> impl Future<Output = Result<Vec<Device>, HomeLinkError>> + Send;

    /// Get all devices.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Device>, HomeLinkError>> + Send;

    /// Point a device at another location.
    fn update_location(
        &self,
        id: &DeviceId,
        location_id: LocationId,
    ) -> impl Future<Output = Result<(), HomeLinkError>> + Send;

    /// Count devices assigned to a location.
    fn count_by_location(
        &self,
        location_id: LocationId,
    ) -> impl Future<Output = Result<u64, HomeLinkError>> + Send;
}

/// Repository for individual [`Module`] rows.
pub trait ModuleRepository {
    /// Get a module by id.
    fn get_by_id(
        &self,
        id: ModuleId,
    ) -> impl Future<Output = Result<Option<Module>, HomeLinkError>> + Send;

    /// Overwrite the stored raw value of a module.
    fn update_value(
        &self,
        id: ModuleId,
        value: &str,
    ) -> impl Future<Output = Result<(), HomeLinkError>> + Send;
}

/// Append-only store of telemetry [`Data`].
pub trait DataRepository {
    /// Insert a reading, returning it with its id.
    fn insert(&self, data: Data) -> impl Future<Output = Result<Data, HomeLinkError>> + Send;

    /// Most recent readings of a device, newest first.
    fn find_by_device(
        &self,
        device_id: &DeviceId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Data>, HomeLinkError>> + Send;
}
