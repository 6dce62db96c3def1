//! # homelinkd: homelink daemon
//!
//! Composition root that wires all adapters together and starts listening.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Initialize logging
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct repository implementations (adapters)
//! - Construct application services, injecting repositories via port traits
//! - Connect to the MQTT broker and hand every message to the dispatcher
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer: no domain logic belongs here.

mod config;
mod shutdown;

use std::sync::Arc;

use homelink_adapter_storage_sqlite_sqlx::{
    SqliteDataRepository, SqliteDeviceRepository, SqliteLocationRepository,
};
use homelink_app::dispatcher::Dispatcher;
use homelink_app::services::device_service::DeviceService;
use homelink_app::services::provisioning_service::ProvisioningService;
use homelink_app::services::telemetry_service::TelemetryService;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .with_target(true)
        .init();

    // Database
    let db = config.storage().build().await?;
    let pool = db.pool().clone();

    // Repositories
    let device_repo = SqliteDeviceRepository::new(pool.clone());
    let location_repo = SqliteLocationRepository::new(pool.clone());
    let data_repo = SqliteDataRepository::new(pool);

    // Transport
    let (publisher, listener) = homelink_adapter_mqtt::connect(&config.mqtt)?;

    // Services
    let registry = Arc::new(DeviceService::new(
        device_repo.clone(),
        location_repo,
        publisher.clone(),
    ));
    let provisioning = Arc::new(ProvisioningService::new(registry, publisher));
    let telemetry = Arc::new(TelemetryService::new(device_repo, data_repo));
    let dispatcher = Dispatcher::new(provisioning, telemetry);

    tracing::info!(subscription = %config.mqtt.subscription, "homelinkd started");
    listener.run(dispatcher, shutdown::shutdown_signal()).await;
    tracing::info!("homelinkd stopped");

    Ok(())
}
