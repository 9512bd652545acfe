//! Annotation save: validate, stage the working-copy files, persist.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tempfile::NamedTempFile;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use modelhub_database::ModelStore;
use modelhub_entity::annotation::{
    AnnotationFlags, AnnotationRecord, MobilityDocument, MotionNode, PartNode,
};
use modelhub_entity::category::ShapeCategory;

use super::error::AnnotationError;
use super::validator::validate_annotation;
use crate::context::RequestContext;
use crate::layout::{BUFFER_FILE, MOBILITY_FILE, ModelLayout, SCENE_FILE};

/// Data submitted by the annotation tool for one save.
#[derive(Debug, Clone)]
pub struct SaveAnnotationRequest {
    /// Model being annotated.
    pub model_id: Uuid,
    /// Raw category value; `""`, `"null"` and `"none"` mean no category.
    pub category: Option<String>,
    /// Completeness flags.
    pub flags: AnnotationFlags,
    /// Part hierarchy.
    pub part_tree: Vec<PartNode>,
    /// Motion hierarchy.
    pub motion_tree: Vec<MotionNode>,
    /// The edited scene, written to the working `model.gltf`.
    pub scene: serde_json::Value,
    /// Replacement `model.bin`, if the tool sent one.
    pub buffer: Option<Bytes>,
}

/// Validates and persists annotation saves.
#[derive(Clone)]
pub struct AnnotationService {
    /// Persistence.
    store: Arc<dyn ModelStore>,
    /// Path resolver.
    layout: ModelLayout,
}

impl std::fmt::Debug for AnnotationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotationService")
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

impl AnnotationService {
    /// Creates a new annotation service.
    pub fn new(store: Arc<dyn ModelStore>, layout: ModelLayout) -> Self {
        Self { store, layout }
    }

    /// Loads the current annotation record of a model.
    pub async fn load(&self, model_id: Uuid) -> Result<AnnotationRecord, AnnotationError> {
        self.store
            .find_annotation(model_id)
            .await?
            .ok_or(AnnotationError::ModelNotFound { id: model_id })
    }

    /// Saves an annotation.
    ///
    /// Nothing is written unless every check passes. The working-copy files
    /// are staged next to their targets, the record is updated, and only
    /// then are the staged files renamed into place. If a rename fails, the
    /// files already replaced and the previous record are both restored.
    #[instrument(skip_all, fields(model_id = %req.model_id, user_id = %ctx.user_id))]
    pub async fn save(
        &self,
        ctx: &RequestContext,
        req: SaveAnnotationRequest,
    ) -> Result<AnnotationRecord, AnnotationError> {
        let model_id = req.model_id;
        let category = ShapeCategory::normalize(req.category.as_deref());

        if req.flags.shape_annotated && category.is_none() {
            return Err(AnnotationError::CategoryNotAnnotated);
        }

        if req.flags.is_complete() {
            validate_annotation(&req.part_tree, &req.motion_tree)?;
        }

        if let Some(name) = &category {
            if !self.store.category_exists(name).await? {
                return Err(AnnotationError::UnknownCategory { name: name.clone() });
            }
        }

        let working_dir = self.layout.working_dir(model_id);
        let working_dir_exists = tokio::fs::metadata(&working_dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !working_dir_exists {
            return Err(AnnotationError::ModelNotFound { id: model_id });
        }
        let previous = self.load(model_id).await?;

        let record = AnnotationRecord {
            model_id,
            category,
            flags: req.flags,
            part_tree: req.part_tree,
            motion_tree: req.motion_tree,
            annotator_id: Some(ctx.user_id.clone()),
            updated_at: Utc::now(),
        };
        let document = MobilityDocument {
            partnet: record.part_tree.clone(),
            mobility: record.motion_tree.clone(),
        };

        let staged = {
            let dir = working_dir.clone();
            let scene = req.scene;
            let buffer = req.buffer;
            tokio::task::spawn_blocking(move || {
                StagedFiles::write(&dir, buffer.as_deref(), &scene, &document)
            })
            .await??
        };

        self.store.update_annotation(&record).await?;

        let persisted = tokio::task::spawn_blocking(move || staged.persist())
            .await
            .map_err(AnnotationError::from)
            .and_then(|r| r);
        if let Err(e) = persisted {
            if let Err(revert) = self.store.update_annotation(&previous).await {
                warn!(error = %revert, "Failed to restore previous annotation record");
            }
            return Err(e);
        }

        if let Err(e) = self.store.touch_access(model_id, &ctx.user_id).await {
            warn!(error = %e, "Failed to refresh access time");
        }

        info!(
            category = ?record.category,
            complete = record.flags.is_complete(),
            parts = record.part_tree.len(),
            joints = record.motion_tree.len(),
            "Annotation saved"
        );
        Ok(record)
    }
}

/// Working-copy files written to temporary names, awaiting rename.
struct StagedFiles {
    files: Vec<(NamedTempFile, PathBuf)>,
}

impl StagedFiles {
    /// Writes `model.bin` (if given), `model.gltf` and `mobility_v3.json`
    /// as temporaries inside `dir`.
    fn write(
        dir: &Path,
        buffer: Option<&[u8]>,
        scene: &serde_json::Value,
        document: &MobilityDocument,
    ) -> Result<Self, AnnotationError> {
        let mut files = Vec::with_capacity(3);

        if let Some(buffer) = buffer {
            let mut file = temp_in(dir, BUFFER_FILE)?;
            file.write_all(buffer)?;
            file.as_file().sync_all()?;
            files.push((file, dir.join(BUFFER_FILE)));
        }

        let mut file = temp_in(dir, SCENE_FILE)?;
        write_pretty(&mut file, scene)?;
        files.push((file, dir.join(SCENE_FILE)));

        let mut file = temp_in(dir, MOBILITY_FILE)?;
        write_pretty(&mut file, document)?;
        files.push((file, dir.join(MOBILITY_FILE)));

        Ok(Self { files })
    }

    /// Renames every staged file onto its target.
    ///
    /// Each existing target is hard-linked to a `.prev` sibling first. If a
    /// later rename fails, the targets already replaced get their old content
    /// back and targets that did not exist before are removed.
    fn persist(self) -> Result<(), AnnotationError> {
        let mut replaced: Vec<(PathBuf, Option<PathBuf>)> = Vec::with_capacity(self.files.len());

        for (file, target) in self.files {
            let step = keep_previous(&target).and_then(|backup| match file.persist(&target) {
                Ok(_) => Ok(backup),
                Err(e) => {
                    if let Some(backup) = &backup {
                        let _ = fs::remove_file(backup);
                    }
                    Err(e.error)
                }
            });
            match step {
                Ok(backup) => replaced.push((target, backup)),
                Err(e) => {
                    roll_back(replaced);
                    return Err(e.into());
                }
            }
        }

        for backup in replaced.into_iter().filter_map(|(_, backup)| backup) {
            let _ = fs::remove_file(backup);
        }
        Ok(())
    }
}

/// Links the current content of `target` to its `.prev` sibling. `None`
/// when there is nothing to keep.
fn keep_previous(target: &Path) -> io::Result<Option<PathBuf>> {
    let name = target.file_name().unwrap_or_default().to_string_lossy();
    let backup = target.with_file_name(format!(".{name}.prev"));

    match fs::remove_file(&backup) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    match fs::hard_link(target, &backup) {
        Ok(()) => Ok(Some(backup)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

fn roll_back(replaced: Vec<(PathBuf, Option<PathBuf>)>) {
    for (target, backup) in replaced.into_iter().rev() {
        let restored = match &backup {
            Some(backup) => fs::rename(backup, &target),
            None => fs::remove_file(&target),
        };
        if let Err(e) = restored {
            warn!(target = %target.display(), error = %e, "Failed to roll back working-copy file");
        }
    }
}

fn temp_in(dir: &Path, name: &str) -> std::io::Result<NamedTempFile> {
    tempfile::Builder::new()
        .prefix(&format!(".{name}-"))
        .tempfile_in(dir)
}

/// JSON with 4-space indentation.
fn write_pretty<T: Serialize>(file: &mut NamedTempFile, value: &T) -> Result<(), AnnotationError> {
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(
        std::io::BufWriter::new(file.as_file_mut()),
        formatter,
    );
    value.serialize(&mut ser)?;
    let mut writer = ser.into_inner();
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(())
}
