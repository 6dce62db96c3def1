//! `SQLite` implementation of [`ModuleRepository`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use homelink_app::ports::ModuleRepository;
use homelink_domain::error::HomeLinkError;
use homelink_domain::id::{DeviceId, ModuleId};
use homelink_domain::module::Module;

use crate::error::{self, StorageError};

/// Wrapper for converting database rows into domain [`Module`].
pub(crate) struct ModuleRow(pub(crate) Module);

impl<'r> FromRow<'r, SqliteRow> for ModuleRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: i64 = row.try_get("id")?;
        let device_id: String = row.try_get("device_id")?;

        Ok(Self(Module {
            id: Some(ModuleId::new(id)),
            device_id: DeviceId::new(device_id),
            name: row.try_get("name")?,
            value: row.try_get("value")?,
        }))
    }
}

const SELECT_BY_ID: &str = "SELECT id, device_id, name, value FROM modules WHERE id = ?";
const UPDATE_VALUE: &str = "UPDATE modules SET value = ? WHERE id = ?";

/// `SQLite`-backed module repository.
#[derive(Clone)]
pub struct SqliteModuleRepository {
    pool: SqlitePool,
}

impl SqliteModuleRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl ModuleRepository for SqliteModuleRepository {
    fn get_by_id(
        &self,
        id: ModuleId,
    ) -> impl Future<Output = Result<Option<Module>, HomeLinkError>> + Send {
        let pool = self.pool.clone();
        async move {
            let row: Option<ModuleRow> = sqlx::query_as(SELECT_BY_ID)
                .bind(id.get())
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(row.map(|row| row.0))
        }
    }

    fn update_value(
        &self,
        id: ModuleId,
        value: &str,
    ) -> impl Future<Output = Result<(), HomeLinkError>> + Send {
        let pool = self.pool.clone();
        let value = value.to_string();
        async move {
            let result = sqlx::query(UPDATE_VALUE)
                .bind(value)
                .bind(id.get())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            error::ensure_affected(result.rows_affected(), "update module value")
        }
    }
}
