//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! `config/default.toml`, an optional `config/{env}.toml` overlay, and
//! `MODELHUB__SECTION__KEY` environment variables. Each sub-module
//! represents a logical configuration section.

pub mod converter;
pub mod ingest;
pub mod logging;
pub mod storage;

use serde::{Deserialize, Serialize};
use validator::Validate;

pub use self::converter::{CommandSpec, ConverterConfig, PreconversionSpec};
pub use self::ingest::IngestConfig;
pub use self::logging::LoggingConfig;
pub use self::storage::StorageConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AppConfig {
    /// Database connection settings.
    #[validate(nested)]
    pub database: DatabaseConfig,
    /// Raw and working directory roots.
    pub storage: StorageConfig,
    /// Upload and extraction limits.
    #[validate(nested)]
    pub ingest: IngestConfig,
    /// External converter commands.
    #[validate(nested)]
    pub converter: ConverterConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Database connection pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[validate(range(min = 1, max = 200))]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    pub min_connections: u32,
    /// Connection timeout in seconds.
    pub connect_timeout_seconds: u64,
    /// Idle connection timeout in seconds.
    pub idle_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://modelhub@localhost:5432/modelhub".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_seconds: 10,
            idle_timeout_seconds: 300,
        }
    }
}

impl AppConfig {
    /// Load configuration for the given environment name.
    ///
    /// `base` is the path (without extension) of the default file; the
    /// environment overlay is looked up next to it.
    pub fn load(base: &str, env: &str) -> Result<Self, AppError> {
        let overlay = match base.rsplit_once('/') {
            Some((dir, _)) => format!("{dir}/{env}"),
            None => env.to_string(),
        };

        let config = config::Config::builder()
            .add_source(config::File::with_name(base).required(false))
            .add_source(config::File::with_name(&overlay).required(false))
            .add_source(
                config::Environment::with_prefix("MODELHUB")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        config.validate()?;
        Ok(config)
    }
}
