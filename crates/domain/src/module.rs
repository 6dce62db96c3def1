//! Module: a sensor or actuator capability owned by a device.
//!
//! A [`Module`] is the durable, generic form: a name and a raw string value.
//! Business logic works on the [`TypedModule`] obtained by converting it,
//! which validates the name against [`ModuleName`] and coerces the value.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::coercion::{self, ModuleValue, RawValue, ValueKind};
use crate::error::{HomeLinkError, UnknownModuleError};
use crate::id::{DeviceId, ModuleId};

/// The closed set of module kinds.
///
/// When adding a kind, extend [`ModuleName::ALL`], the string mapping and
/// the conversion in [`TypedModule::from_value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModuleName {
    LightController,
    LightSensor,
    PresenceDetector,
    LuminositySensor,
    TemperatureSensor,
    ConsumptionSensor,
    Reset,
}

impl ModuleName {
    pub const ALL: [Self; 7] = [
        Self::LightController,
        Self::LightSensor,
        Self::PresenceDetector,
        Self::LuminositySensor,
        Self::TemperatureSensor,
        Self::ConsumptionSensor,
        Self::Reset,
    ];

    /// Wire name, as used in channel segments and payloads.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LightController => "lightController",
            Self::LightSensor => "lightSensor",
            Self::PresenceDetector => "presenceDetector",
            Self::LuminositySensor => "luminositySensor",
            Self::TemperatureSensor => "temperatureSensor",
            Self::ConsumptionSensor => "consumptionSensor",
            Self::Reset => "reset",
        }
    }

    /// Representation the module's raw value is coerced to.
    #[must_use]
    pub fn value_kind(self) -> ValueKind {
        match self {
            Self::LightController | Self::LightSensor | Self::PresenceDetector | Self::Reset => {
                ValueKind::Bool
            }
            Self::LuminositySensor | Self::TemperatureSensor | Self::ConsumptionSensor => {
                ValueKind::Float
            }
        }
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModuleName {
    type Err = UnknownModuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| UnknownModuleError {
                name: s.to_string(),
            })
    }
}

/// Generic persisted form of a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    /// Store key, `None` until the module has been persisted.
    pub id: Option<ModuleId>,
    pub device_id: DeviceId,
    pub name: String,
    pub value: String,
}

impl Module {
    /// Create an unsaved module.
    #[must_use]
    pub fn new(device_id: DeviceId, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: None,
            device_id,
            name: name.into(),
            value: value.into(),
        }
    }

    /// Validate the module name against the enumeration.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownModuleError`] for names outside [`ModuleName`].
    pub fn module_name(&self) -> Result<ModuleName, UnknownModuleError> {
        self.name.parse()
    }

    /// Convert into the typed representation.
    ///
    /// # Errors
    ///
    /// Returns [`HomeLinkError::UnknownModule`] for an unknown name and
    /// [`HomeLinkError::Coercion`] when the raw value does not fit the type.
    pub fn to_typed(&self) -> Result<TypedModule, HomeLinkError> {
        TypedModule::try_from(self)
    }
}

/// A module interpreted according to its kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypedModule {
    LightController { on: bool },
    LightSensor { is_on: bool },
    PresenceDetector { is_presence: bool },
    LuminositySensor { value_lumen: f64 },
    TemperatureSensor { value_degrees: f64 },
    ConsumptionSensor { value_watt_hour: f64 },
    Reset { bool_value: bool },
}

impl TypedModule {
    /// Build the typed module of kind `name` from an untyped value.
    ///
    /// # Errors
    ///
    /// Returns [`HomeLinkError::Coercion`] when `value` does not fit the
    /// kind's representation.
    pub fn from_value<'a>(
        name: ModuleName,
        value: impl Into<RawValue<'a>>,
    ) -> Result<Self, HomeLinkError> {
        let value = value.into();
        let module = match name {
            ModuleName::LightController => Self::LightController {
                on: coercion::to_bool(value)?,
            },
            ModuleName::LightSensor => Self::LightSensor {
                is_on: coercion::to_bool(value)?,
            },
            ModuleName::PresenceDetector => Self::PresenceDetector {
                is_presence: coercion::to_bool(value)?,
            },
            ModuleName::LuminositySensor => Self::LuminositySensor {
                value_lumen: coercion::to_float(value)?,
            },
            ModuleName::TemperatureSensor => Self::TemperatureSensor {
                value_degrees: coercion::to_float(value)?,
            },
            ModuleName::ConsumptionSensor => Self::ConsumptionSensor {
                value_watt_hour: coercion::to_float(value)?,
            },
            ModuleName::Reset => Self::Reset {
                bool_value: coercion::to_bool(value)?,
            },
        };
        Ok(module)
    }

    /// The command that tells a device to clear its state and re-announce,
    /// built from the raw value `"1"`.
    ///
    /// # Errors
    ///
    /// Propagates a coercion failure of the reset literal.
    pub fn reset() -> Result<Self, HomeLinkError> {
        Self::from_value(ModuleName::Reset, "1")
    }

    #[must_use]
    pub fn name(&self) -> ModuleName {
        match self {
            Self::LightController { .. } => ModuleName::LightController,
            Self::LightSensor { .. } => ModuleName::LightSensor,
            Self::PresenceDetector { .. } => ModuleName::PresenceDetector,
            Self::LuminositySensor { .. } => ModuleName::LuminositySensor,
            Self::TemperatureSensor { .. } => ModuleName::TemperatureSensor,
            Self::ConsumptionSensor { .. } => ModuleName::ConsumptionSensor,
            Self::Reset { .. } => ModuleName::Reset,
        }
    }

    #[must_use]
    pub fn value(&self) -> ModuleValue {
        match *self {
            Self::LightController { on: value }
            | Self::LightSensor { is_on: value }
            | Self::PresenceDetector { is_presence: value }
            | Self::Reset { bool_value: value } => ModuleValue::Bool(value),
            Self::LuminositySensor { value_lumen: value }
            | Self::TemperatureSensor {
                value_degrees: value,
            }
            | Self::ConsumptionSensor {
                value_watt_hour: value,
            } => ModuleValue::Float(value),
        }
    }
}

impl TryFrom<&Module> for TypedModule {
    type Error = HomeLinkError;

    fn try_from(module: &Module) -> Result<Self, Self::Error> {
        let name = module.module_name()?;
        Self::from_value(name, module.value.as_str())
    }
}
