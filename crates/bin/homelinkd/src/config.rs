//! Configuration loading: a TOML file with environment variable overrides.
//!
//! Looks for `homelink.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use homelink_adapter_mqtt::MqttConfig;
use serde::Deserialize;

const CONFIG_FILE: &str = "homelink.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database settings.
    pub database: DatabaseConfig,
    /// Broker connection settings.
    pub mqtt: MqttConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
    /// Upper bound of pooled connections.
    pub max_connections: u32,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `homelink.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, an
    /// override cannot be parsed, or the result fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file(CONFIG_FILE)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(val) = lookup("HOMELINK_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = lookup("HOMELINK_BROKER_HOST") {
            self.mqtt.broker_host = val;
        }
        if let Some(val) = lookup("HOMELINK_BROKER_PORT") {
            self.mqtt.broker_port = parse("HOMELINK_BROKER_PORT", &val)?;
        }
        if let Some(val) = lookup("HOMELINK_BROKER_QOS") {
            self.mqtt.qos = parse("HOMELINK_BROKER_QOS", &val)?;
        }
        if let Some(val) = lookup("HOMELINK_SUBSCRIPTION") {
            self.mqtt.subscription = val;
        }
        if let Some(val) = lookup("HOMELINK_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = lookup("RUST_LOG") {
            self.logging.filter = val;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.is_empty() {
            return Err(ConfigError::Validation(
                "database url must not be empty".to_string(),
            ));
        }
        if self.mqtt.broker_port == 0 {
            return Err(ConfigError::Validation(
                "broker port must be non-zero".to_string(),
            ));
        }
        if self.mqtt.subscription.is_empty() {
            return Err(ConfigError::Validation(
                "subscription must not be empty".to_string(),
            ));
        }
        self.mqtt
            .qos()
            .map_err(|err| ConfigError::Validation(err.to_string()))?;
        Ok(())
    }

    /// Storage adapter settings derived from this configuration.
    #[must_use]
    pub fn storage(&self) -> homelink_adapter_storage_sqlite_sqlx::Config {
        homelink_adapter_storage_sqlite_sqlx::Config {
            database_url: self.database.url.clone(),
            max_connections: self.database.max_connections,
        }
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Override {
        key,
        value: value.to_string(),
    })
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:homelink.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "homelinkd=info,homelink_app=info,homelink_adapter_mqtt=info".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// An environment variable holds a value of the wrong shape.
    #[error("invalid value {value:?} for {key}")]
    Override { key: &'static str, value: String },
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
