//! CLI command definitions and dispatch.

pub mod annotate;
pub mod category;
pub mod ingest;
pub mod migrate;
pub mod models;
pub mod validate;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use modelhub_core::config::AppConfig;
use modelhub_core::error::AppError;
use modelhub_database::{DatabasePool, ModelStore, PgModelStore};

/// ModelHub: 3D model ingestion and annotation
#[derive(Debug, Parser)]
#[command(name = "modelhub", version, about, long_about = None)]
pub struct Cli {
    /// Base configuration file, without the `.toml` extension
    #[arg(short, long, default_value = "config/default")]
    pub config: String,

    /// Environment overlay (`config/<env>.toml`)
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Apply database migrations
    Migrate,
    /// Ingest an uploaded model archive
    Ingest(ingest::IngestArgs),
    /// Validate a mobility document offline
    Validate(validate::ValidateArgs),
    /// Save an annotation for a model
    Annotate(annotate::AnnotateArgs),
    /// Shape category management
    Category(category::CategoryArgs),
    /// Model and annotation listings
    Models(models::ModelsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: AppConfig) -> Result<(), AppError> {
        match &self.command {
            Commands::Migrate => migrate::execute(&config).await,
            Commands::Ingest(args) => ingest::execute(args, &config).await,
            Commands::Validate(args) => validate::execute(args).await,
            Commands::Annotate(args) => annotate::execute(args, &config).await,
            Commands::Category(args) => category::execute(args, &config).await,
            Commands::Models(args) => models::execute(args, &config).await,
        }
    }
}

/// Helper: connect to the configured database.
pub async fn connect(config: &AppConfig) -> Result<DatabasePool, AppError> {
    DatabasePool::connect(&config.database).await
}

/// Helper: the PostgreSQL-backed store.
pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn ModelStore>, AppError> {
    let pool = connect(config).await?;
    Ok(Arc::new(PgModelStore::new(pool.pool().clone())))
}
