//! Ingestion errors.

use modelhub_converter::ConversionError;
use modelhub_core::error::{AppError, ErrorKind};
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// Why an ingestion was rejected or failed.
#[derive(Debug, Error)]
pub enum IngestError {
    // --- Dedup errors ---
    /// The user already holds a grant on identical content.
    #[error("model already uploaded by this user ({model_id})")]
    AlreadyUploadedByUser {
        /// The existing identity.
        model_id: Uuid,
    },

    // --- Orchestration errors ---
    /// The freshly generated identity's directory already exists.
    #[error("identity collision: directory for {id} already exists")]
    IdentityCollision {
        /// Generated identity.
        id: Uuid,
    },

    /// The converter finished but the canonical scene is missing.
    #[error("conversion verification failed: {path} does not exist")]
    ConversionVerificationFailed {
        /// Expected scene path.
        path: PathBuf,
    },

    /// The working copy could not be produced.
    #[error("failed to create working copy: {reason}")]
    WorkingCopyFailed {
        /// Cause.
        reason: String,
    },

    // --- Wrapped errors ---
    /// Extraction, location or conversion failed.
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// The store failed.
    #[error(transparent)]
    Persistence(#[from] AppError),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Blocking task failed to complete.
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Conversion(e) => e.into(),
            IngestError::Persistence(e) => e,
            other => {
                let kind = match &other {
                    IngestError::AlreadyUploadedByUser { .. }
                    | IngestError::ConversionVerificationFailed { .. } => ErrorKind::Validation,
                    IngestError::WorkingCopyFailed { .. } | IngestError::Io(_) => {
                        ErrorKind::Storage
                    }
                    _ => ErrorKind::Internal,
                };
                AppError::with_source(kind, other.to_string(), other)
            }
        }
    }
}
