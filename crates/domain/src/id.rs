//! Typed identifiers.
//!
//! Locations, modules and readings are keyed by store-assigned integers.
//! Devices carry the identifier they announce themselves with.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! define_row_id {
    ($(#[doc = $doc:expr])* $name:ident($inner:ty)) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name($inner);

        impl $name {
            /// Wrap a raw store key.
            #[must_use]
            pub const fn new(value: $inner) -> Self {
                Self(value)
            }

            /// Access the raw store key.
            #[must_use]
            pub const fn get(self) -> $inner {
                self.0
            }
        }

        impl From<$inner> for $name {
            fn from(value: $inner) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse().map(Self)
            }
        }
    };
}

define_row_id!(
    /// Identifier of a [`Location`](crate::location::Location). Appears in channel names.
    ///
    /// Spans the store's whole positive rowid range, so any id a device
    /// announces stays decodable once stored.
    LocationId(i64)
);

define_row_id!(
    /// Identifier of a persisted [`Module`](crate::module::Module).
    ModuleId(i64)
);

define_row_id!(
    /// Identifier of a persisted [`Data`](crate::data::Data) reading.
    DataId(i64)
);

/// Identifier a [`Device`](crate::device::Device) assigns to itself.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Wrap a device-supplied identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for DeviceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}
