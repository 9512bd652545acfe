//! Content-addressed model identity.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::grant::AccessGrant;
use crate::annotation::AnnotationRecord;

/// One distinct uploaded model, keyed by the checksum of the uploaded bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ModelIdentity {
    /// Unique model identifier.
    pub id: Uuid,
    /// Base64 SHA-256 of the original upload. Unique across identities.
    pub checksum: String,
    /// Path of the model file inside the uploaded archive.
    pub source_file_name: String,
    /// When the identity was created.
    pub created_at: DateTime<Utc>,
}

impl ModelIdentity {
    /// Create a new identity stamped with the current time.
    pub fn new(id: Uuid, checksum: impl Into<String>, source_file_name: impl Into<String>) -> Self {
        Self {
            id,
            checksum: checksum.into(),
            source_file_name: source_file_name.into(),
            created_at: Utc::now(),
        }
    }
}

/// A fully ingested model with its on-disk locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestedModel {
    /// The durable identity.
    pub identity: ModelIdentity,
    /// The converted `model.gltf` under the raw directory.
    pub canonical_scene_path: PathBuf,
    /// `<raw-root>/<id>`.
    pub raw_copy_path: PathBuf,
    /// `<working-root>/<id>`.
    pub working_copy_path: PathBuf,
}

/// Everything persisted in one step when a new identity becomes durable.
#[derive(Debug, Clone)]
pub struct NewModel {
    /// The identity row.
    pub identity: ModelIdentity,
    /// The uploader's grant.
    pub grant: AccessGrant,
    /// The initial, unannotated record.
    pub annotation: AnnotationRecord,
}

impl NewModel {
    /// Bundle a fresh identity with the uploader's grant and an empty record.
    pub fn for_upload(identity: ModelIdentity, user_id: &str) -> Self {
        let grant = AccessGrant::uploader(identity.id, user_id);
        let annotation = AnnotationRecord::empty(identity.id);
        Self {
            identity,
            grant,
            annotation,
        }
    }
}
