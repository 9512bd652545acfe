//! Model upload command.

use std::path::PathBuf;

use clap::Args;
use tokio_util::sync::CancellationToken;

use modelhub_core::config::AppConfig;
use modelhub_core::error::AppError;
use modelhub_service::{IngestService, RequestContext};

use crate::output;

/// Arguments for the ingest command
#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Path to the zip archive to ingest
    pub file: PathBuf,

    /// Uploading user
    #[arg(short, long)]
    pub user: String,

    /// Override the declared file name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Output format hint passed to the converter
    #[arg(long)]
    pub format: Option<String>,
}

/// Execute the ingest command. Ctrl-C cancels a running conversion.
pub async fn execute(args: &IngestArgs, config: &AppConfig) -> Result<(), AppError> {
    let file = tokio::fs::File::open(&args.file).await.map_err(|e| {
        AppError::not_found(format!("Cannot open {}: {e}", args.file.display()))
    })?;
    let file_name = args.name.clone().unwrap_or_else(|| {
        args.file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.zip")
            .to_string()
    });

    let store = super::open_store(config).await?;
    let service = IngestService::from_config(store, config);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let ctx = RequestContext::with_cancellation(&args.user, cancel);
    let outcome = service
        .ingest(&ctx, file, &file_name, args.format.as_deref())
        .await?;

    if outcome.is_created() {
        output::print_success(&format!("Ingested model {}", outcome.identity().id));
    } else {
        output::print_success(&format!(
            "Content already ingested; access granted to {}",
            outcome.identity().id
        ));
    }
    output::print_json(&outcome)
}
