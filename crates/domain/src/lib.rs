//! # homelink-domain
//!
//! Pure domain model for the homelink IoT hub.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - **Value coercion** of untyped wire values into bool/float/int
//! - **Modules** (sensors/actuators): the closed set of kinds and the
//!   conversion from the generic stored form to typed modules
//! - **Devices** and **Locations**: the registry records
//! - **Channels**: the topic naming protocol shared with every device
//! - **Data**: telemetry readings
//! - **Startup messages**: the provisioning handshake document
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod channel;
pub mod coercion;
pub mod data;
pub mod device;
pub mod location;
pub mod module;
pub mod startup;
