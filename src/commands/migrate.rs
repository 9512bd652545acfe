//! Database migration command.

use modelhub_core::config::AppConfig;
use modelhub_core::error::AppError;

use crate::output;

/// Run all pending migrations.
pub async fn execute(config: &AppConfig) -> Result<(), AppError> {
    let pool = super::connect(config).await?;
    modelhub_database::migration::run_migrations(pool.pool()).await?;
    pool.close().await;
    output::print_success("All migrations applied successfully.");
    Ok(())
}
