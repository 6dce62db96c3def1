//! Storage-specific error type wrapping sqlx errors.

use homelink_domain::error::{HomeLinkError, PersistenceError};

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// Failed to run migrations.
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<StorageError> for HomeLinkError {
    fn from(err: StorageError) -> Self {
        PersistenceError::Backend(Box::new(err)).into()
    }
}

/// Map a failed write, turning unique-constraint violations into
/// [`PersistenceError::Conflict`] on `entity` / `key`.
pub(crate) fn on_write(err: sqlx::Error, entity: &'static str, key: impl ToString) -> HomeLinkError {
    if let sqlx::Error::Database(db) = &err
        && db.is_unique_violation()
    {
        return PersistenceError::Conflict {
            entity,
            key: key.to_string(),
        }
        .into();
    }
    StorageError::from(err).into()
}

/// Fail with [`PersistenceError::NoRowsAffected`] when a write matched nothing.
pub(crate) fn ensure_affected(rows: u64, operation: &'static str) -> Result<(), HomeLinkError> {
    if rows == 0 {
        return Err(PersistenceError::NoRowsAffected { operation }.into());
    }
    Ok(())
}

/// Wrap a column decoding failure the way sqlx reports its own.
pub(crate) fn decode<E>(err: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::Decode(Box::new(err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_wrap_backend_failures_as_persistence_errors() {
        let err = HomeLinkError::from(StorageError::from(sqlx::Error::RowNotFound));
        assert!(matches!(
            err,
            HomeLinkError::Persistence(PersistenceError::Backend(_))
        ));
    }

    #[test]
    fn should_keep_non_unique_failures_as_backend_errors() {
        let err = on_write(sqlx::Error::PoolTimedOut, "Location", "Kitchen");
        assert!(!err.is_conflict());
    }

    #[test]
    fn should_report_zero_rows_affected() {
        let err = ensure_affected(0, "update location").unwrap_err();
        assert_eq!(err.to_string(), "update location: 0 rows affected");
        assert!(ensure_affected(1, "update location").is_ok());
    }
}
