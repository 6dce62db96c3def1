//! # homelink-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the repository port traits defined in `homelink-app::ports::storage`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//!
//! ## Dependency rule
//! Depends on `homelink-app` (for port traits) and `homelink-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod data_repo;
mod device_repo;
mod error;
mod location_repo;
mod module_repo;
mod pool;

pub use data_repo::SqliteDataRepository;
pub use device_repo::SqliteDeviceRepository;
pub use error::StorageError;
pub use location_repo::SqliteLocationRepository;
pub use module_repo::SqliteModuleRepository;
pub use pool::{Config, Database};
