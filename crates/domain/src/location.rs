//! Location: a named, typed grouping (room, floor, garage) devices belong to.

use serde::{Deserialize, Serialize};

use crate::error::{FormatError, HomeLinkError};
use crate::id::LocationId;

/// A named, typed grouping such as a room.
///
/// Names are unique across the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Store key, `None` for a candidate that has not been resolved yet.
    pub id: Option<LocationId>,
    /// Free-form category, e.g. `room`.
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
}

impl Location {
    /// Create a builder for constructing a [`Location`].
    #[must_use]
    pub fn builder() -> LocationBuilder {
        LocationBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`HomeLinkError::Format`] when `name` or `kind` is empty.
    pub fn validate(&self) -> Result<(), HomeLinkError> {
        if self.name.is_empty() {
            return Err(FormatError::MissingField("location_name").into());
        }
        if self.kind.is_empty() {
            return Err(FormatError::MissingField("location_type").into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`Location`].
#[derive(Debug, Default)]
pub struct LocationBuilder {
    id: Option<LocationId>,
    kind: Option<String>,
    name: Option<String>,
}

impl LocationBuilder {
    #[must_use]
    pub fn id(mut self, id: LocationId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Consume the builder, validate, and return a [`Location`].
    ///
    /// # Errors
    ///
    /// Returns [`HomeLinkError::Format`] if `name` or `kind` is missing.
    pub fn build(self) -> Result<Location, HomeLinkError> {
        let location = Location {
            id: self.id,
            kind: self.kind.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
        };
        location.validate()?;
        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_build_valid_location_when_name_and_kind_provided() {
        let location = Location::builder()
            .id(LocationId::new(3))
            .kind("room")
            .name("Kitchen")
            .build()
            .unwrap();
        assert_eq!(location.id, Some(LocationId::new(3)));
        assert_eq!(location.kind, "room");
        assert_eq!(location.name, "Kitchen");
    }

    #[test]
    fn should_return_format_error_when_name_is_missing() {
        let result = Location::builder().kind("room").build();
        assert!(matches!(
            result,
            Err(HomeLinkError::Format(FormatError::MissingField(
                "location_name"
            )))
        ));
    }

    #[test]
    fn should_serialize_kind_as_type() {
        let location = Location::builder()
            .kind("room")
            .name("Kitchen")
            .build()
            .unwrap();
        let json = serde_json::to_value(&location).unwrap();
        assert_eq!(json["type"], "room");
        assert!(json["id"].is_null());
    }
}
