//! `SQLite` implementation of [`LocationRepository`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use homelink_app::ports::LocationRepository;
use homelink_domain::error::{HomeLinkError, PersistenceError};
use homelink_domain::id::LocationId;
use homelink_domain::location::Location;

use crate::error::{self, StorageError};

/// Wrapper for converting database rows into domain [`Location`].
struct Wrapper(Location);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Location> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: i64 = row.try_get("id")?;
        let kind: String = row.try_get("type")?;
        let name: String = row.try_get("name")?;

        Ok(Self(Location {
            id: Some(LocationId::new(id)),
            kind,
            name,
        }))
    }
}

const INSERT: &str = "INSERT INTO locations (id, type, name) VALUES (?, ?, ?)";
const SELECT_BY_ID: &str = "SELECT id, type, name FROM locations WHERE id = ?";
const SELECT_BY_NAME: &str = "SELECT id, type, name FROM locations WHERE name = ?";
const SELECT_ALL: &str = "SELECT id, type, name FROM locations ORDER BY id";
const UPDATE: &str = "UPDATE locations SET type = ?, name = ? WHERE id = ?";
const DELETE_BY_ID: &str = "DELETE FROM locations WHERE id = ?";

/// `SQLite`-backed location repository.
#[derive(Clone)]
pub struct SqliteLocationRepository {
    pool: SqlitePool,
}

impl SqliteLocationRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl LocationRepository for SqliteLocationRepository {
    fn create(
        &self,
        location: Location,
    ) -> impl Future<Output = Result<Location, HomeLinkError>> + Send {
        let pool = self.pool.clone();
        async move {
            let result = sqlx::query(INSERT)
                .bind(location.id.map(LocationId::get))
                .bind(&location.kind)
                .bind(&location.name)
                .execute(&pool)
                .await
                .map_err(|err| error::on_write(err, "Location", &location.name))?;

            Ok(Location {
                id: Some(LocationId::new(result.last_insert_rowid())),
                ..location
            })
        }
    }

    fn get_by_id(
        &self,
        id: LocationId,
    ) -> impl Future<Output = Result<Option<Location>, HomeLinkError>> + Send {
        let pool = self.pool.clone();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
                .bind(id.get())
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(Wrapper::maybe(row))
        }
    }

    fn find_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Location>, HomeLinkError>> + Send {
        let pool = self.pool.clone();
        let name = name.to_string();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_NAME)
                .bind(name)
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(Wrapper::maybe(row))
        }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Location>, HomeLinkError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn update(
        &self,
        location: Location,
    ) -> impl Future<Output = Result<Location, HomeLinkError>> + Send {
        let pool = self.pool.clone();
        async move {
            let id = location.id.ok_or(PersistenceError::NoRowsAffected {
                operation: "update location",
            })?;
            let result = sqlx::query(UPDATE)
                .bind(&location.kind)
                .bind(&location.name)
                .bind(id.get())
                .execute(&pool)
                .await
                .map_err(|err| error::on_write(err, "Location", &location.name))?;

            error::ensure_affected(result.rows_affected(), "update location")?;
            Ok(location)
        }
    }

    fn delete(&self, id: LocationId) -> impl Future<Output = Result<(), HomeLinkError>> + Send {
        let pool = self.pool.clone();
        async move {
            let result = sqlx::query(DELETE_BY_ID)
                .bind(id.get())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            error::ensure_affected(result.rows_affected(), "delete location")
        }
    }
}
