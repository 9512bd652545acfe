//! On-disk layout of ingested models.
//!
//! Every path under the raw and working roots is derived here.
//!
//! ```text
//! <raw-root>/<id>/original/...         extracted upload
//! <raw-root>/<id>/model.gltf           canonical scene
//! <raw-root>/<id>/model.bin            optional buffer
//! <raw-root>/<id>/textures/...         optional textures
//! <working-root>/<id>/model.gltf       annotator's copy
//! <working-root>/<id>/model.bin
//! <working-root>/<id>/mobility_v3.json
//! ```

use std::path::{Path, PathBuf};

use modelhub_core::config::StorageConfig;
use uuid::Uuid;

/// Scene file name.
pub const SCENE_FILE: &str = "model.gltf";
/// Binary buffer file name.
pub const BUFFER_FILE: &str = "model.bin";
/// Texture directory name.
pub const TEXTURES_DIR: &str = "textures";
/// Extracted upload directory name.
pub const ORIGINAL_DIR: &str = "original";
/// Annotation file name.
pub const MOBILITY_FILE: &str = "mobility_v3.json";
/// Scratch directory for uploads being hashed.
const UPLOADS_DIR: &str = ".uploads";

/// Resolves identity-keyed paths under the raw and working roots.
#[derive(Debug, Clone)]
pub struct ModelLayout {
    raw_root: PathBuf,
    working_root: PathBuf,
}

impl ModelLayout {
    /// Layout over explicit roots.
    pub fn new(raw_root: impl Into<PathBuf>, working_root: impl Into<PathBuf>) -> Self {
        Self {
            raw_root: raw_root.into(),
            working_root: working_root.into(),
        }
    }

    /// Root of all raw copies.
    pub fn raw_root(&self) -> &Path {
        &self.raw_root
    }

    /// Root of all working copies.
    pub fn working_root(&self) -> &Path {
        &self.working_root
    }

    /// Where uploads are staged while hashed.
    pub fn upload_staging_dir(&self) -> PathBuf {
        self.raw_root.join(UPLOADS_DIR)
    }

    /// `<raw-root>/<id>`.
    pub fn raw_dir(&self, id: Uuid) -> PathBuf {
        self.raw_root.join(id.to_string())
    }

    /// `<raw-root>/<id>/original`.
    pub fn original_dir(&self, id: Uuid) -> PathBuf {
        self.raw_dir(id).join(ORIGINAL_DIR)
    }

    /// `<raw-root>/<id>/model.gltf`.
    pub fn raw_scene(&self, id: Uuid) -> PathBuf {
        self.raw_dir(id).join(SCENE_FILE)
    }

    /// `<working-root>/<id>`.
    pub fn working_dir(&self, id: Uuid) -> PathBuf {
        self.working_root.join(id.to_string())
    }

    /// `<working-root>/<id>/model.gltf`.
    pub fn working_scene(&self, id: Uuid) -> PathBuf {
        self.working_dir(id).join(SCENE_FILE)
    }

    /// `<working-root>/<id>/model.bin`.
    pub fn working_buffer(&self, id: Uuid) -> PathBuf {
        self.working_dir(id).join(BUFFER_FILE)
    }

    /// `<working-root>/<id>/mobility_v3.json`.
    pub fn mobility_file(&self, id: Uuid) -> PathBuf {
        self.working_dir(id).join(MOBILITY_FILE)
    }
}

impl From<&StorageConfig> for ModelLayout {
    fn from(config: &StorageConfig) -> Self {
        Self::new(&config.raw_root, &config.working_root)
    }
}
