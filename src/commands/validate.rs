//! Offline tree validation.

use std::path::PathBuf;

use clap::Args;

use modelhub_core::error::AppError;
use modelhub_entity::annotation::MobilityDocument;
use modelhub_service::validate_annotation;

use crate::output;

/// Arguments for the validate command
#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// A `mobility_v3.json` document (`{"partnet": [...], "mobility": [...]}`)
    pub file: PathBuf,
}

/// Validate both trees of a mobility document.
pub async fn execute(args: &ValidateArgs) -> Result<(), AppError> {
    let raw = tokio::fs::read(&args.file).await?;
    let document: MobilityDocument = serde_json::from_slice(&raw)
        .map_err(|e| AppError::validation(format!("Malformed mobility document: {e}")))?;

    validate_annotation(&document.partnet, &document.mobility)?;
    output::print_success(&format!(
        "Valid: {} parts, {} joints",
        document.partnet.len(),
        document.mobility.len()
    ));
    Ok(())
}
