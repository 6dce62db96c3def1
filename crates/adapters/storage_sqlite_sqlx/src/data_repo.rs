//! `SQLite` implementation of [`DataRepository`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use homelink_app::ports::DataRepository;
use homelink_domain::data::Data;
use homelink_domain::error::HomeLinkError;
use homelink_domain::id::{DataId, DeviceId, ModuleId};
use homelink_domain::time;

use crate::error::{self, StorageError};

/// Wrapper for converting database rows into domain [`Data`].
struct Wrapper(Data);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: i64 = row.try_get("id")?;
        let device_id: String = row.try_get("device_id")?;
        let module_id: Option<i64> = row.try_get("module_id")?;
        let created_at: String = row.try_get("created_at")?;

        Ok(Self(Data {
            id: Some(DataId::new(id)),
            device_id: DeviceId::new(device_id),
            module_id: module_id.map(ModuleId::new),
            module_name: row.try_get("module_name")?,
            module_value: row.try_get("module_value")?,
            created_at: time::from_stored(&created_at).map_err(error::decode)?,
        }))
    }
}

const INSERT: &str = "INSERT INTO data (device_id, module_id, module_name, module_value, created_at) VALUES (?, ?, ?, ?, ?)";
const SELECT_BY_DEVICE: &str = "SELECT id, device_id, module_id, module_name, module_value, created_at FROM data WHERE device_id = ? ORDER BY id DESC LIMIT ?";

/// `SQLite`-backed telemetry store.
#[derive(Clone)]
pub struct SqliteDataRepository {
    pool: SqlitePool,
}

impl SqliteDataRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl DataRepository for SqliteDataRepository {
    fn insert(&self, data: Data) -> impl Future<Output = Result<Data, HomeLinkError>> + Send {
        let pool = self.pool.clone();
        async move {
            let result = sqlx::query(INSERT)
                .bind(data.device_id.as_str())
                .bind(data.module_id.map(ModuleId::get))
                .bind(&data.module_name)
                .bind(&data.module_value)
                .bind(time::to_stored(&data.created_at))
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            error::ensure_affected(result.rows_affected(), "insert data")?;
            Ok(Data {
                id: Some(DataId::new(result.last_insert_rowid())),
                ..data
            })
        }
    }

    fn find_by_device(
        &self,
        device_id: &DeviceId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Data>, HomeLinkError>> + Send {
        let pool = self.pool.clone();
        let device_id = device_id.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BY_DEVICE)
                .bind(device_id.as_str())
                .bind(i64::try_from(limit).unwrap_or(i64::MAX))
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device_repo::SqliteDeviceRepository;
    use crate::location_repo::SqliteLocationRepository;
    use crate::pool::Config;
    use homelink_app::ports::{DeviceRepository, LocationRepository};
    use homelink_domain::channel::Channel;
    use homelink_domain::device::Device;
    use homelink_domain::location::Location;

    async fn setup() -> (SqliteDataRepository, Device) {
        let db = Config::in_memory().build().await.unwrap();
        let location = SqliteLocationRepository::new(db.pool().clone())
            .create(Location::builder().kind("room").name("Kitchen").build().unwrap())
            .await
            .unwrap();
        let device = Device::builder()
            .id("dev42")
            .kind("light")
            .location(location)
            .module("lightSensor", "0")
            .build()
            .unwrap();
        let device = SqliteDeviceRepository::new(db.pool().clone())
            .create(device)
            .await
            .unwrap();
        (SqliteDataRepository::new(db.pool().clone()), device)
    }

    fn reading(device: &Device, module: &str, value: &str) -> Data {
        let channel: Channel = device.channel(module).unwrap();
        let mut data = Data::from_channel(&channel, value);
        data.module_id = device.module(module).and_then(|m| m.id);
        data
    }

    #[tokio::test]
    async fn should_insert_reading_with_id() {
        let (repo, device) = setup().await;

        let stored = repo.insert(reading(&device, "lightSensor", "1")).await.unwrap();

        assert!(stored.id.is_some());
        assert!(stored.is_resolved());
    }

    #[tokio::test]
    async fn should_keep_unresolved_module_id_empty() {
        let (repo, device) = setup().await;
        repo.insert(reading(&device, "temperatureSensor", "21.5"))
            .await
            .unwrap();

        let readings = repo.find_by_device(&device.id, 10).await.unwrap();

        assert_eq!(readings.len(), 1);
        assert!(readings[0].module_id.is_none());
        assert_eq!(readings[0].module_name, "temperatureSensor");
    }

    #[tokio::test]
    async fn should_return_newest_readings_first_up_to_limit() {
        let (repo, device) = setup().await;
        for value in ["1", "0", "1", "0"] {
            repo.insert(reading(&device, "lightSensor", value))
                .await
                .unwrap();
        }

        let readings = repo.find_by_device(&device.id, 3).await.unwrap();

        assert_eq!(readings.len(), 3);
        assert_eq!(readings[0].module_value, "0");
        assert!(readings.windows(2).all(|pair| pair[0].id > pair[1].id));
    }
}
