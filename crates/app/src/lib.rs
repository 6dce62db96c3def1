//! # homelink-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters implement:
//!   - `LocationRepository`, `DeviceRepository`, `ModuleRepository`,
//!     `DataRepository`: persistence
//!   - `MessagePublisher`: outbound messages to devices
//!   - `MessageHandler`: inbound messages from the transport
//! - Provide the use-case services:
//!   - `DeviceService`: registration, location resolution, relocation, reset
//!   - `LocationService`: location maintenance
//!   - `ModuleService`: typed module access and set commands
//!   - `TelemetryService`: reading ingestion and history
//!   - `ProvisioningService`: the startup handshake
//! - Route inbound topics to the right service (`Dispatcher`)
//!
//! The daemon wires only the inbound path: `Dispatcher`, `ProvisioningService`
//! and `TelemetryService`. `LocationService`, `ModuleService`,
//! `DeviceService::update_location` and `DeviceService::reset` are library
//! API for an operator-facing surface (a CLI or an HTTP adapter) built on the
//! same repositories and publisher.
//!
//! ## Dependency rule
//! Depends on `homelink-domain` only. Never imports adapter crates. Adapters
//! depend on *this* crate, not the reverse.

pub mod dispatcher;
pub mod ports;
pub mod services;

#[cfg(test)]
mod testing;
