//! `SQLite` implementation of [`DeviceRepository`].
//!
//! Devices are always read together with their location and modules.

use std::collections::HashMap;
use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use homelink_app::ports::DeviceRepository;
use homelink_domain::device::Device;
use homelink_domain::error::{FormatError, HomeLinkError};
use homelink_domain::id::{DeviceId, LocationId, ModuleId};
use homelink_domain::location::Location;
use homelink_domain::time::{self, Timestamp};

use crate::error::{self, StorageError};
use crate::module_repo::ModuleRow;

/// Wrapper for converting joined device/location rows into a [`Device`]
/// without modules.
struct Wrapper(Device);

fn timestamp(row: &SqliteRow, column: &str) -> Result<Timestamp, sqlx::Error> {
    let text: String = row.try_get(column)?;
    time::from_stored(&text).map_err(error::decode)
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let deleted_at: Option<String> = row.try_get("deleted_at")?;
        let deleted_at = deleted_at
            .as_deref()
            .map(time::from_stored)
            .transpose()
            .map_err(error::decode)?;

        let location = Location {
            id: Some(LocationId::new(row.try_get("location_id")?)),
            kind: row.try_get("location_type")?,
            name: row.try_get("location_name")?,
        };

        Ok(Self(Device {
            id: DeviceId::new(id),
            created_at: timestamp(row, "created_at")?,
            updated_at: timestamp(row, "updated_at")?,
            deleted_at,
            location,
            kind: row.try_get("type")?,
            name: row.try_get("name")?,
            modules: Vec::new(),
        }))
    }
}

/// Attach every module row to its owning device, keeping module id order.
fn assemble(devices: Vec<Wrapper>, modules: Vec<ModuleRow>) -> Vec<Device> {
    let mut devices: Vec<Device> = devices.into_iter().map(|w| w.0).collect();
    let index: HashMap<DeviceId, usize> = devices
        .iter()
        .enumerate()
        .map(|(position, device)| (device.id.clone(), position))
        .collect();
    for ModuleRow(module) in modules {
        if let Some(&position) = index.get(&module.device_id) {
            devices[position].modules.push(module);
        }
    }
    devices
}

const INSERT_DEVICE: &str = "INSERT INTO devices (id, created_at, updated_at, deleted_at, location_id, type, name) VALUES (?, ?, ?, ?, ?, ?, ?)";
const INSERT_MODULE: &str = "INSERT INTO modules (device_id, name, value) VALUES (?, ?, ?)";
const SELECT_BY_ID: &str = "SELECT d.id, d.created_at, d.updated_at, d.deleted_at, d.type, d.name, l.id AS location_id, l.type AS location_type, l.name AS location_name FROM devices d JOIN locations l ON l.id = d.location_id WHERE d.deleted_at IS NULL AND d.id = ?";
const SELECT_BY_LOCATION: &str = "SELECT d.id, d.created_at, d.updated_at, d.deleted_at, d.type, d.name, l.id AS location_id, l.type AS location_type, l.name AS location_name FROM devices d JOIN locations l ON l.id = d.location_id WHERE d.deleted_at IS NULL AND d.location_id = ? ORDER BY d.id";
const SELECT_ALL: &str = "SELECT d.id, d.created_at, d.updated_at, d.deleted_at, d.type, d.name, l.id AS location_id, l.type AS location_type, l.name AS location_name FROM devices d JOIN locations l ON l.id = d.location_id WHERE d.deleted_at IS NULL ORDER BY d.id";
const SELECT_MODULES_BY_DEVICE: &str =
    "SELECT id, device_id, name, value FROM modules WHERE device_id = ? ORDER BY id";
const SELECT_MODULES_BY_LOCATION: &str = "SELECT m.id, m.device_id, m.name, m.value FROM modules m JOIN devices d ON d.id = m.device_id WHERE d.location_id = ? ORDER BY m.id";
const SELECT_ALL_MODULES: &str = "SELECT id, device_id, name, value FROM modules ORDER BY id";
const UPDATE_LOCATION: &str = "UPDATE devices SET location_id = ?, updated_at = ? WHERE id = ?";
const COUNT_BY_LOCATION: &str =
    "SELECT COUNT(*) FROM devices WHERE deleted_at IS NULL AND location_id = ?";

/// `SQLite`-backed device repository.
#[derive(Clone)]
pub struct SqliteDeviceRepository {
    pool: SqlitePool,
}

impl SqliteDeviceRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl DeviceRepository for SqliteDeviceRepository {
    fn create(
        &self,
        mut device: Device,
    ) -> impl Future<Output = Result<Device, HomeLinkError>> + Send {
        let pool = self.pool.clone();
        async move {
            let location_id = device
                .location
                .id
                .ok_or_else(|| FormatError::UnresolvedLocation {
                    device_id: device.id.to_string(),
                })?;

            let mut tx = pool.begin().await.map_err(StorageError::from)?;
            sqlx::query(INSERT_DEVICE)
                .bind(device.id.as_str())
                .bind(time::to_stored(&device.created_at))
                .bind(time::to_stored(&device.updated_at))
                .bind(device.deleted_at.as_ref().map(time::to_stored))
                .bind(location_id.get())
                .bind(&device.kind)
                .bind(&device.name)
                .execute(&mut *tx)
                .await
                .map_err(|err| error::on_write(err, "Device", &device.id))?;

            for module in &mut device.modules {
                let result = sqlx::query(INSERT_MODULE)
                    .bind(device.id.as_str())
                    .bind(&module.name)
                    .bind(&module.value)
                    .execute(&mut *tx)
                    .await
                    .map_err(|err| error::on_write(err, "Module", &module.name))?;
                module.id = Some(ModuleId::new(result.last_insert_rowid()));
            }
            tx.commit().await.map_err(StorageError::from)?;

            Ok(device)
        }
    }

    fn get_by_id(
        &self,
        id: &DeviceId,
    ) -> impl Future<Output = Result<Option<Device>, HomeLinkError>> + Send {
        let pool = self.pool.clone();
        let id = id.clone();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
                .bind(id.as_str())
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;
            let Some(row) = row else {
                return Ok(None);
            };

            let modules: Vec<ModuleRow> = sqlx::query_as(SELECT_MODULES_BY_DEVICE)
                .bind(id.as_str())
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(assemble(vec![row], modules).pop())
        }
    }

    fn get_by_location_id(
        &self,
        location_id: LocationId,
    ) -> impl Future<Output = Result<Vec<Device>, HomeLinkError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BY_LOCATION)
                .bind(location_id.get())
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;
            let modules: Vec<ModuleRow> = sqlx::query_as(SELECT_MODULES_BY_LOCATION)
                .bind(location_id.get())
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(assemble(rows, modules))
        }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Device>, HomeLinkError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;
            let modules: Vec<ModuleRow> = sqlx::query_as(SELECT_ALL_MODULES)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(assemble(rows, modules))
        }
    }

    fn update_location(
        &self,
        id: &DeviceId,
        location_id: LocationId,
    ) -> impl Future<Output = Result<(), HomeLinkError>> + Send {
        let pool = self.pool.clone();
        let id = id.clone();
        async move {
            let result = sqlx::query(UPDATE_LOCATION)
                .bind(location_id.get())
                .bind(time::to_stored(&time::now()))
                .bind(id.as_str())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            error::ensure_affected(result.rows_affected(), "update device location")
        }
    }

    fn count_by_location(
        &self,
        location_id: LocationId,
    ) -> impl Future<Output = Result<u64, HomeLinkError>> + Send {
        let pool = self.pool.clone();
        async move {
            let count: i64 = sqlx::query_scalar(COUNT_BY_LOCATION)
                .bind(location_id.get())
                .fetch_one(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(u64::try_from(count).unwrap_or_default())
        }
    }
}
