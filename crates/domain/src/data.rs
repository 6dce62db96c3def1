//! Data: an append-only telemetry reading reported by a device module.

use serde::{Deserialize, Serialize};

use crate::channel::Channel;
use crate::id::{DataId, DeviceId, ModuleId};
use crate::time::{self, Timestamp};

/// A timestamped reading.
///
/// `module_id` stays `None` when the reported module name does not match
/// any module the device registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Data {
    /// Store key, `None` until inserted.
    pub id: Option<DataId>,
    pub device_id: DeviceId,
    pub module_id: Option<ModuleId>,
    pub module_name: String,
    pub module_value: String,
    pub created_at: Timestamp,
}

impl Data {
    /// Draft a reading from the channel it arrived on.
    #[must_use]
    pub fn from_channel(channel: &Channel, value: impl Into<String>) -> Self {
        Self {
            id: None,
            device_id: channel.device_id.clone(),
            module_id: None,
            module_name: channel.module.clone(),
            module_value: value.into(),
            created_at: time::now(),
        }
    }

    /// Whether the reading was matched to a registered module.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.module_id.is_some()
    }
}
