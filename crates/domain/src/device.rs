//! Device: a physical endpoint that identifies itself and owns modules.

use serde::{Deserialize, Serialize};

use crate::channel::Channel;
use crate::error::{FormatError, HomeLinkError};
use crate::id::DeviceId;
use crate::location::Location;
use crate::module::Module;
use crate::time::{self, Timestamp};

/// A physical IoT endpoint.
///
/// The identifier is chosen by the device itself, never generated here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    /// Soft-delete marker. Never set by the hub itself.
    pub deleted_at: Option<Timestamp>,
    pub location: Location,
    /// Device category, e.g. `light`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Human-readable label.
    pub name: String,
    pub modules: Vec<Module>,
}

impl Device {
    /// Create a builder for constructing a [`Device`].
    #[must_use]
    pub fn builder() -> DeviceBuilder {
        DeviceBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`HomeLinkError::Format`] when the id or type is empty, a
    /// module name appears twice, or the location is invalid.
    pub fn validate(&self) -> Result<(), HomeLinkError> {
        if self.id.is_empty() {
            return Err(FormatError::MissingField("id").into());
        }
        if self.kind.is_empty() {
            return Err(FormatError::MissingField("type").into());
        }
        for (index, module) in self.modules.iter().enumerate() {
            if self.modules[..index].iter().any(|m| m.name == module.name) {
                return Err(FormatError::DuplicateModule(module.name.clone()).into());
            }
        }
        self.location.validate()
    }

    /// Find an owned module by its wire name.
    #[must_use]
    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.iter().find(|module| module.name == name)
    }

    /// The channel addressing `segment` on this device.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::UnresolvedLocation`] when the location has no
    /// store key yet, or a segment error from [`Channel::new`].
    pub fn channel(&self, segment: impl Into<String>) -> Result<Channel, FormatError> {
        let location_id = self
            .location
            .id
            .ok_or_else(|| FormatError::UnresolvedLocation {
                device_id: self.id.to_string(),
            })?;
        Channel::new(
            self.location.kind.clone(),
            location_id,
            self.kind.clone(),
            self.id.clone(),
            segment,
        )
    }
}

/// Step-by-step builder for [`Device`].
#[derive(Debug, Default)]
pub struct DeviceBuilder {
    id: Option<DeviceId>,
    created_at: Option<Timestamp>,
    location: Option<Location>,
    kind: Option<String>,
    name: Option<String>,
    modules: Vec<(String, String)>,
}

impl DeviceBuilder {
    #[must_use]
    pub fn id(mut self, id: impl Into<DeviceId>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn created_at(mut self, created_at: Timestamp) -> Self {
        self.created_at = Some(created_at);
        self
    }

    #[must_use]
    pub fn location(mut self, location: Location) -> Self {
        self.location = Some(location);
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

    /// Append an owned module with its raw value.
    #[must_use]
    pub fn module(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.modules.push((name.into(), value.into()));
        self
    }

    /// Consume the builder, validate, and return a [`Device`].
    ///
    /// # Errors
    ///
    /// Returns [`HomeLinkError::Format`] if a required field is missing or a
    /// module is listed twice.
    pub fn build(self) -> Result<Device, HomeLinkError> {
        let id = self.id.unwrap_or_else(|| DeviceId::new(String::new()));
        let created_at = self.created_at.unwrap_or_else(time::now);
        let location = self.location.ok_or(FormatError::MissingField("location"))?;
        let modules = self
            .modules
            .into_iter()
            .map(|(name, value)| Module::new(id.clone(), name, value))
            .collect();
        let device = Device {
            id,
            created_at,
            updated_at: created_at,
            deleted_at: None,
            location,
            kind: self.kind.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            modules,
        };
        device.validate()?;
        Ok(device)
    }
}
