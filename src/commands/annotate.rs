//! Annotation save command.

use std::path::PathBuf;

use bytes::Bytes;
use clap::Args;
use serde::Deserialize;
use uuid::Uuid;

use modelhub_core::config::AppConfig;
use modelhub_core::error::AppError;
use modelhub_entity::annotation::{AnnotationFlags, MotionNode, PartNode};
use modelhub_service::{AnnotationService, ModelLayout, RequestContext, SaveAnnotationRequest};

use crate::output;

/// Arguments for the annotate command
#[derive(Debug, Args)]
pub struct AnnotateArgs {
    /// Model to annotate
    pub model_id: Uuid,

    /// JSON body as sent by the annotation tool
    #[arg(short, long)]
    pub request: PathBuf,

    /// Replacement `model.bin`
    #[arg(short, long)]
    pub buffer: Option<PathBuf>,

    /// Annotating user
    #[arg(short, long)]
    pub user: String,
}

/// Save body of the annotation tool.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveBody {
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    shape_annotated: bool,
    #[serde(default)]
    part_annotated: bool,
    #[serde(default)]
    mobility_annotated: bool,
    #[serde(default)]
    part_tree: Vec<PartNode>,
    #[serde(default)]
    motion_tree: Vec<MotionNode>,
    scene: serde_json::Value,
}

/// Execute the annotate command
pub async fn execute(args: &AnnotateArgs, config: &AppConfig) -> Result<(), AppError> {
    let raw = tokio::fs::read(&args.request).await?;
    let body: SaveBody = serde_json::from_slice(&raw)
        .map_err(|e| AppError::validation(format!("Malformed save request: {e}")))?;
    let buffer = match &args.buffer {
        Some(path) => Some(Bytes::from(tokio::fs::read(path).await?)),
        None => None,
    };

    let store = super::open_store(config).await?;
    let service = AnnotationService::new(store, ModelLayout::from(&config.storage));
    let ctx = RequestContext::new(&args.user);

    let record = service
        .save(
            &ctx,
            SaveAnnotationRequest {
                model_id: args.model_id,
                category: body.category,
                flags: AnnotationFlags {
                    shape_annotated: body.shape_annotated,
                    part_annotated: body.part_annotated,
                    mobility_annotated: body.mobility_annotated,
                },
                part_tree: body.part_tree,
                motion_tree: body.motion_tree,
                scene: body.scene,
                buffer,
            },
        )
        .await?;

    output::print_success(&format!("Annotation saved for {}", record.model_id));
    output::print_json(&record)
}
