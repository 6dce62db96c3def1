//! Startup message: the JSON document exchanged during the provisioning
//! handshake.
//!
//! A device publishes it on its `startup` channel when it boots; the hub
//! answers with the same shape on the device's `setup` channel, filled from
//! the registry.

use serde::{Deserialize, Serialize};

use crate::device::Device;
use crate::error::{FormatError, HomeLinkError};
use crate::id::LocationId;
use crate::location::Location;
use crate::module::ModuleName;

/// Self-description a device announces on boot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartupMessage {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// `0` (or any non-positive value) when the device does not know its
    /// location yet.
    #[serde(default)]
    pub location_id: i64,
    pub location_type: String,
    pub location_name: String,
    #[serde(default)]
    pub modules: Vec<ModuleReport>,
}

/// One module entry of a [`StartupMessage`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleReport {
    pub name: String,
    pub value: String,
}

impl StartupMessage {
    /// Decode a JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::Json`] when the payload is not a valid
    /// startup document.
    pub fn from_payload(payload: &[u8]) -> Result<Self, FormatError> {
        serde_json::from_slice(payload).map_err(FormatError::Json)
    }

    /// Encode as a JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::Json`] if serialization fails.
    pub fn to_payload(&self) -> Result<String, FormatError> {
        serde_json::to_string(self).map_err(FormatError::Json)
    }

    /// Snapshot of a registered device, used as the provisioning response.
    #[must_use]
    pub fn from_device(device: &Device) -> Self {
        Self {
            id: device.id.to_string(),
            kind: device.kind.clone(),
            location_id: device.location.id.map_or(0, LocationId::get),
            location_type: device.location.kind.clone(),
            location_name: device.location.name.clone(),
            modules: device
                .modules
                .iter()
                .map(|module| ModuleReport {
                    name: module.name.clone(),
                    value: module.value.clone(),
                })
                .collect(),
        }
    }

    /// Materialize the candidate device described by this message.
    ///
    /// The candidate location carries the announced id when it is positive.
    ///
    /// # Errors
    ///
    /// Returns [`HomeLinkError::UnknownModule`] for a module name outside the
    /// enumeration, or [`HomeLinkError::Format`] for missing fields and
    /// duplicate modules.
    pub fn to_device(&self) -> Result<Device, HomeLinkError> {
        let mut location = Location::builder()
            .kind(&self.location_type)
            .name(&self.location_name);
        if self.location_id > 0 {
            location = location.id(LocationId::new(self.location_id));
        }

        let mut device = Device::builder()
            .id(self.id.as_str())
            .kind(&self.kind)
            .location(location.build()?);
        for module in &self.modules {
            module.name.parse::<ModuleName>()?;
            device = device.module(&module.name, &module.value);
        }
        device.build()
    }
}
