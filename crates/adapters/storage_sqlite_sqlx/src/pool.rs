//! `SQLite` connection pool setup and migration runner.

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::error::StorageError;

const MEMORY_URL: &str = "sqlite::memory:";

/// Configuration for the `SQLite` storage adapter.
#[derive(Debug, Clone)]
pub struct Config {
    /// `SQLite` connection URL (e.g. `sqlite:homelink.db` or `sqlite::memory:`).
    pub database_url: String,
    /// Upper bound of pooled connections.
    pub max_connections: u32,
}

impl Config {
    /// A private in-memory database.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            database_url: MEMORY_URL.to_string(),
            max_connections: 1,
        }
    }

    /// Build a [`Database`] from this configuration.
    ///
    /// Creates the connection pool, creates the database file if missing,
    /// and runs all pending migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the connection or migrations fail.
    pub async fn build(self) -> Result<Database, StorageError> {
        Database::initialize(&self).await
    }

    // Every connection to an in-memory database opens a fresh, empty one.
    fn effective_max_connections(&self) -> u32 {
        if self.database_url.contains(":memory:") || self.database_url.contains("mode=memory") {
            1
        } else {
            self.max_connections.max(1)
        }
    }
}

/// Holds the `SQLite` connection pool and provides access to it.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to the database and run migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the connection or migrations fail.
    async fn initialize(config: &Config) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(&config.database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.effective_max_connections())
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!(url = %config.database_url, "database ready");

        Ok(Self { pool })
    }

    /// Borrow the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn should_create_pool_and_run_migrations_when_using_memory_db() {
        let db = Config::in_memory().build().await.unwrap();

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' AND name != '_sqlx_migrations' ORDER BY name",
        )
        .fetch_all(db.pool())
        .await
        .unwrap();

        let names: Vec<&str> = tables.iter().map(|row| row.0.as_str()).collect();
        assert_eq!(names, ["data", "devices", "locations", "modules"]);
    }

    #[test]
    fn should_force_single_connection_for_memory_databases() {
        let config = Config {
            database_url: MEMORY_URL.to_string(),
            max_connections: 8,
        };
        assert_eq!(config.effective_max_connections(), 1);

        let config = Config {
            database_url: "sqlite:homelink.db".to_string(),
            max_connections: 8,
        };
        assert_eq!(config.effective_max_connections(), 8);
    }
}
