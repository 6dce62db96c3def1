//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`HomeLinkError`] via `#[from]` / `From` impls at the port boundary.

use crate::coercion::CoercionError;
use crate::id::LocationId;

/// Boxed error produced by an adapter (database driver, MQTT client, …).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error for every homelink operation.
#[derive(Debug, thiserror::Error)]
pub enum HomeLinkError {
    /// Malformed topic or payload shape.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// A device, location or module is absent from the store.
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// A raw value cannot be interpreted as the module's declared type.
    #[error(transparent)]
    Coercion(#[from] CoercionError),

    /// A module name outside the fixed enumeration.
    #[error(transparent)]
    UnknownModule(#[from] UnknownModuleError),

    /// The store rejected or failed an operation.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// The pub/sub transport failed to accept an outbound message.
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    /// A location cannot be removed while devices still reference it.
    #[error("location {id} still holds {devices} device(s)")]
    LocationInUse { id: LocationId, devices: u64 },
}

/// Malformed topic or payload.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// Topic does not split into the expected number of segments.
    #[error("invalid channel format {topic:?}: expected {expected} segments, got {actual}")]
    SegmentCount {
        topic: String,
        expected: usize,
        actual: usize,
    },

    /// Topic does not start with the channel root.
    #[error("invalid channel root in {topic:?}")]
    Root { topic: String },

    /// Location segment is not a positive integer.
    #[error("invalid location id {segment:?} in channel {topic:?}")]
    LocationId { topic: String, segment: String },

    /// A channel segment is empty or contains a separator.
    #[error("invalid channel segment {segment:?}")]
    Segment { segment: String },

    /// The message carried no value.
    #[error("no value in payload")]
    EmptyPayload,

    /// The payload is not valid UTF-8 text.
    #[error("payload is not valid UTF-8")]
    Encoding(#[source] std::str::Utf8Error),

    /// JSON payload could not be decoded.
    #[error("failed to decode JSON payload")]
    Json(#[source] serde_json::Error),

    /// A required field is missing or empty.
    #[error("missing field {0:?}")]
    MissingField(&'static str),

    /// The same module name appears twice in one announcement.
    #[error("duplicate module {0:?}")]
    DuplicateModule(String),

    /// A device must have a persisted location before a channel can be built.
    #[error("device {device_id:?} has no resolved location")]
    UnresolvedLocation { device_id: String },
}

/// A record was not found.
#[derive(Debug, thiserror::Error)]
#[error("{entity} with id {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// A module name outside the fixed enumeration.
#[derive(Debug, thiserror::Error)]
#[error("module {name:?} not found")]
pub struct UnknownModuleError {
    pub name: String,
}

/// Store-level failures.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// The backend failed to execute the operation.
    #[error("store operation failed")]
    Backend(#[source] BoxError),

    /// A write completed without touching any row.
    #[error("{operation}: 0 rows affected")]
    NoRowsAffected { operation: &'static str },

    /// A unique constraint rejected the write.
    #[error("{entity} {key} already exists")]
    Conflict { entity: &'static str, key: String },
}

impl HomeLinkError {
    /// Whether this error reports a missing record.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether this error reports a unique-constraint conflict.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::Persistence(PersistenceError::Conflict { .. })
        )
    }
}
