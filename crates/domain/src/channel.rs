//! Channel naming protocol: the wire contract between devices and the hub.
//!
//! Every topic has exactly six `/`-separated segments:
//!
//! ```text
//! home/{locationType}/{locationID}/{deviceType}/{deviceID}/{module}
//! ```
//!
//! The last segment is a module name for telemetry and commands, or one of
//! the handshake suffixes [`STARTUP`] (inbound) and [`SETUP`] (outbound).

use std::fmt;
use std::str::FromStr;

use crate::error::FormatError;
use crate::id::{DeviceId, LocationId};

/// Literal first segment of every device channel.
pub const ROOT: &str = "home";

/// Last segment of a device's startup announcement.
pub const STARTUP: &str = "startup";

/// Last segment of the provisioning response sent back to a device.
pub const SETUP: &str = "setup";

const SEGMENTS: usize = 6;

/// A fully qualified device channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Channel {
    pub location_type: String,
    pub location_id: LocationId,
    pub device_type: String,
    pub device_id: DeviceId,
    pub module: String,
}

impl Channel {
    /// Assemble a channel, rejecting segments that would break the layout.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::Segment`] when a segment is empty or contains
    /// `/`, and [`FormatError::LocationId`] for a non-positive location id.
    pub fn new(
        location_type: impl Into<String>,
        location_id: LocationId,
        device_type: impl Into<String>,
        device_id: DeviceId,
        module: impl Into<String>,
    ) -> Result<Self, FormatError> {
        let channel = Self {
            location_type: location_type.into(),
            location_id,
            device_type: device_type.into(),
            device_id,
            module: module.into(),
        };
        for segment in [
            channel.location_type.as_str(),
            channel.device_type.as_str(),
            channel.device_id.as_str(),
            channel.module.as_str(),
        ] {
            check_segment(segment)?;
        }
        if location_id.get() <= 0 {
            return Err(FormatError::LocationId {
                topic: channel.to_string(),
                segment: location_id.to_string(),
            });
        }
        Ok(channel)
    }

    /// Same device, different last segment.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::Segment`] when `module` is not a valid segment.
    pub fn with_module(&self, module: impl Into<String>) -> Result<Self, FormatError> {
        let module = module.into();
        check_segment(&module)?;
        Ok(Self {
            module,
            ..self.clone()
        })
    }

    /// Whether this channel carries a startup announcement.
    #[must_use]
    pub fn is_startup(&self) -> bool {
        self.module == STARTUP
    }
}

fn check_segment(segment: &str) -> Result<(), FormatError> {
    if segment.is_empty() || segment.contains('/') {
        return Err(FormatError::Segment {
            segment: segment.to_string(),
        });
    }
    Ok(())
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{ROOT}/{}/{}/{}/{}/{}",
            self.location_type, self.location_id, self.device_type, self.device_id, self.module
        )
    }
}

impl FromStr for Channel {
    type Err = FormatError;

    fn from_str(topic: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = topic.split('/').collect();
        let [root, location_type, location_id, device_type, device_id, module] = segments[..]
        else {
            return Err(FormatError::SegmentCount {
                topic: topic.to_string(),
                expected: SEGMENTS,
                actual: segments.len(),
            });
        };
        if root != ROOT {
            return Err(FormatError::Root {
                topic: topic.to_string(),
            });
        }
        let location_id = location_id
            .parse::<LocationId>()
            .ok()
            .filter(|id| id.get() > 0)
            .ok_or_else(|| FormatError::LocationId {
                topic: topic.to_string(),
                segment: location_id.to_string(),
            })?;
        Self::new(
            location_type,
            location_id,
            device_type,
            DeviceId::from(device_id),
            module,
        )
    }
}
