//! The ingestion orchestrator.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::io::AsyncRead;
use tokio::sync::Semaphore;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use modelhub_converter::{
    ArchiveExtractor, ArchiveLimits, ConversionChain, ConversionError, StagedUpload,
    locate_model_file, stage_upload,
};
use modelhub_core::config::AppConfig;
use modelhub_database::ModelStore;
use modelhub_entity::model::{IngestedModel, ModelIdentity, NewModel};

use super::dedup::{SingleFlight, grant_existing};
use super::error::IngestError;
use crate::context::RequestContext;
use crate::layout::{BUFFER_FILE, ModelLayout, SCENE_FILE, TEXTURES_DIR};

/// Result of one upload.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IngestOutcome {
    /// New content: extracted, converted and published.
    Created(IngestedModel),
    /// Known content: the user was granted access to the existing identity.
    Granted(ModelIdentity),
}

impl IngestOutcome {
    /// The identity the upload resolved to.
    pub fn identity(&self) -> &ModelIdentity {
        match self {
            Self::Created(model) => &model.identity,
            Self::Granted(identity) => identity,
        }
    }

    /// Returns `true` if this upload created the identity.
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Orchestrates upload → dedup → extract → locate → convert → publish.
pub struct IngestService {
    /// Persistence.
    store: Arc<dyn ModelStore>,
    /// Path resolver.
    layout: ModelLayout,
    /// Bounded archive extraction.
    extractor: ArchiveExtractor,
    /// Converter chain.
    chain: ConversionChain,
    /// Caps concurrently running converters.
    conversions: Arc<Semaphore>,
    /// Per-checksum serialization inside this process.
    flights: SingleFlight,
}

impl std::fmt::Debug for IngestService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestService")
            .field("layout", &self.layout)
            .field("extractor", &self.extractor)
            .field("available_conversions", &self.conversions.available_permits())
            .finish_non_exhaustive()
    }
}

impl IngestService {
    /// Creates a new ingestion service.
    pub fn new(
        store: Arc<dyn ModelStore>,
        layout: ModelLayout,
        extractor: ArchiveExtractor,
        chain: ConversionChain,
        max_concurrent_conversions: usize,
    ) -> Self {
        Self {
            store,
            layout,
            extractor,
            chain,
            conversions: Arc::new(Semaphore::new(max_concurrent_conversions.max(1))),
            flights: SingleFlight::new(),
        }
    }

    /// Builds the service from application configuration.
    pub fn from_config(store: Arc<dyn ModelStore>, config: &AppConfig) -> Self {
        Self::new(
            store,
            ModelLayout::from(&config.storage),
            ArchiveExtractor::new(ArchiveLimits::from(&config.ingest)),
            ConversionChain::new(config.converter.clone()),
            config.ingest.max_concurrent_conversions,
        )
    }

    /// The path resolver in use.
    pub fn layout(&self) -> &ModelLayout {
        &self.layout
    }

    /// Ingests one uploaded archive for the context's user.
    ///
    /// Identical content is converted once: a known checksum only adds an
    /// access grant. A new identity is persisted only after the canonical
    /// scene and its working copy are verified on disk; on any failure
    /// before that, the identity's directories are removed.
    #[instrument(skip_all, fields(user_id = %ctx.user_id, file_name = %file_name))]
    pub async fn ingest<R>(
        &self,
        ctx: &RequestContext,
        upload: R,
        file_name: &str,
        format_hint: Option<&str>,
    ) -> Result<IngestOutcome, IngestError>
    where
        R: AsyncRead + Unpin,
    {
        let start = Instant::now();
        let staging_dir = self.layout.upload_staging_dir();
        let staged = tokio::select! {
            staged = stage_upload(upload, file_name, &staging_dir) => staged?,
            _ = ctx.cancel.cancelled() => return Err(ConversionError::Cancelled.into()),
        };

        let _flight = tokio::select! {
            guard = self.flights.acquire(&staged.checksum) => guard,
            _ = ctx.cancel.cancelled() => return Err(ConversionError::Cancelled.into()),
        };

        if let Some(existing) = self.store.find_by_checksum(&staged.checksum).await? {
            let identity = grant_existing(self.store.as_ref(), existing, &ctx.user_id).await?;
            info!(model_id = %identity.id, checksum = %staged.checksum, "Upload matched existing model");
            return Ok(IngestOutcome::Granted(identity));
        }

        let id = Uuid::new_v4();
        self.claim_dirs(id).await?;

        let source_file_name = match self.build(ctx, id, &staged, format_hint).await {
            Ok(name) => name,
            Err(e) => {
                self.discard(id).await;
                return Err(e);
            }
        };

        let identity = ModelIdentity::new(id, staged.checksum.clone(), source_file_name);
        let new_model = NewModel::for_upload(identity.clone(), &ctx.user_id);
        match self.store.create_model(&new_model).await {
            Ok(()) => {
                info!(
                    model_id = %id,
                    checksum = %staged.checksum,
                    size = staged.size,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Model ingested"
                );
                Ok(IngestOutcome::Created(IngestedModel {
                    identity,
                    canonical_scene_path: self.layout.raw_scene(id),
                    raw_copy_path: self.layout.raw_dir(id),
                    working_copy_path: self.layout.working_dir(id),
                }))
            }
            Err(e) if e.is_conflict() => {
                warn!(model_id = %id, checksum = %staged.checksum, "Checksum ingested concurrently, falling back to existing model");
                self.discard(id).await;
                let existing = self
                    .store
                    .find_by_checksum(&staged.checksum)
                    .await?
                    .ok_or(IngestError::Persistence(e))?;
                let identity = grant_existing(self.store.as_ref(), existing, &ctx.user_id).await?;
                Ok(IngestOutcome::Granted(identity))
            }
            Err(e) => {
                self.discard(id).await;
                Err(e.into())
            }
        }
    }

    /// Creates the identity's raw and working directories, refusing to
    /// reuse existing ones.
    async fn claim_dirs(&self, id: Uuid) -> Result<(), IngestError> {
        tokio::fs::create_dir_all(self.layout.raw_root()).await?;
        tokio::fs::create_dir_all(self.layout.working_root()).await?;

        let raw = self.layout.raw_dir(id);
        claim_dir(&raw, id).await?;
        if let Err(e) = claim_dir(&self.layout.working_dir(id), id).await {
            remove_best_effort(&raw).await;
            return Err(e);
        }
        Ok(())
    }

    /// Extract, locate, convert, verify and mirror. Returns the model
    /// file's path inside the archive.
    async fn build(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        staged: &StagedUpload,
        format_hint: Option<&str>,
    ) -> Result<String, IngestError> {
        let extracted = {
            let extractor = self.extractor.clone();
            let archive = staged.path().to_path_buf();
            let destination = self.layout.original_dir(id);
            tokio::task::spawn_blocking(move || extractor.extract(&archive, &destination))
                .await??
        };

        let (entry, format) = locate_model_file(&extracted.entries)?;
        let source = extracted.root.join(&entry.path);
        let source_file_name = entry.path.to_string_lossy().into_owned();
        info!(model_id = %id, file = %source_file_name, %format, entries = extracted.entries.len(), "Model file located");

        let scene = self.layout.raw_scene(id);
        let report = {
            let _permit = tokio::select! {
                permit = self.conversions.acquire() => {
                    permit.map_err(|_| ConversionError::Cancelled)?
                }
                _ = ctx.cancel.cancelled() => return Err(ConversionError::Cancelled.into()),
            };
            self.chain
                .convert(&source, &scene, format_hint, &ctx.cancel)
                .await?
        };

        if !tokio::fs::try_exists(&scene).await? {
            return Err(IngestError::ConversionVerificationFailed { path: scene });
        }
        info!(
            model_id = %id,
            preconverted_by = ?report.preconverted_by,
            output_bytes = report.output_bytes,
            elapsed_ms = report.duration_ms,
            "Model converted"
        );

        let raw_dir = self.layout.raw_dir(id);
        let working_dir = self.layout.working_dir(id);
        let working_scene = self.layout.working_scene(id);
        tokio::task::spawn_blocking(move || mirror_working_copy(&raw_dir, &working_dir))
            .await?
            .map_err(|e| IngestError::WorkingCopyFailed {
                reason: e.to_string(),
            })?;
        if !tokio::fs::try_exists(&working_scene).await? {
            return Err(IngestError::WorkingCopyFailed {
                reason: format!("{} is missing", working_scene.display()),
            });
        }

        Ok(source_file_name)
    }

    /// Removes both directories of an abandoned identity.
    async fn discard(&self, id: Uuid) {
        remove_best_effort(&self.layout.raw_dir(id)).await;
        remove_best_effort(&self.layout.working_dir(id)).await;
    }
}

async fn claim_dir(path: &Path, id: Uuid) -> Result<(), IngestError> {
    match tokio::fs::create_dir(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            Err(IngestError::IdentityCollision { id })
        }
        Err(e) => Err(e.into()),
    }
}

async fn remove_best_effort(path: &Path) {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove scratch directory"),
    }
}

/// Copies the scene, its buffer and textures from the raw directory into
/// the working directory.
fn mirror_working_copy(raw_dir: &Path, working_dir: &Path) -> io::Result<()> {
    fs::copy(raw_dir.join(SCENE_FILE), working_dir.join(SCENE_FILE))?;

    let buffer = raw_dir.join(BUFFER_FILE);
    if buffer.is_file() {
        fs::copy(&buffer, working_dir.join(BUFFER_FILE))?;
    }

    let textures = raw_dir.join(TEXTURES_DIR);
    if textures.is_dir() {
        copy_tree(&textures, &working_dir.join(TEXTURES_DIR))?;
    }
    Ok(())
}

fn copy_tree(from: &Path, to: &Path) -> io::Result<()> {
    let mut pending: Vec<(PathBuf, PathBuf)> = vec![(from.to_path_buf(), to.to_path_buf())];
    while let Some((src, dst)) = pending.pop() {
        fs::create_dir_all(&dst)?;
        for entry in fs::read_dir(&src)? {
            let entry = entry?;
            let target = dst.join(entry.file_name());
            if entry.file_type()?.is_dir() {
                pending.push((entry.path(), target));
            } else {
                fs::copy(entry.path(), target)?;
            }
        }
    }
    Ok(())
}
