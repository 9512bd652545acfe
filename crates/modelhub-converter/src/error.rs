//! Error type for the ingestion leaf stages.
//!
//! Every variant carries the context needed to show it to the uploader.
//! Input-shape and conversion failures map to `Validation`; process and
//! filesystem faults map to infrastructure kinds.

use std::path::PathBuf;

use modelhub_core::error::{AppError, ErrorKind};
use thiserror::Error;

/// Errors from extraction, location, hashing and conversion.
#[derive(Debug, Error)]
pub enum ConversionError {
    // --- Archive errors ---
    /// The upload could not be read as a zip archive.
    #[error("Failed to parse .zip file, the uploaded file may be corrupted: {reason}")]
    CorruptArchive {
        /// Parser message.
        reason: String,
    },

    /// The archive has more entries than allowed.
    #[error("Archive contains {count} entries, exceeding the limit of {limit}")]
    TooManyEntries {
        /// Entries in the archive.
        count: usize,
        /// Maximum allowed entries.
        limit: usize,
    },

    /// The archive expands to more bytes than allowed.
    #[error("Archive expands beyond the {limit} byte limit")]
    ArchiveTooLarge {
        /// Maximum allowed uncompressed bytes.
        limit: u64,
    },

    /// The destination path has no parent to stage extraction in.
    #[error("Cannot determine parent directory for: {path}")]
    NoParentDir {
        /// The destination path.
        path: PathBuf,
    },

    // --- Locator errors ---
    /// No entry has a recognized model extension.
    #[error("Uploaded archive does not contain a model file")]
    NoModelFileFound,

    /// More than one entry has a recognized model extension.
    #[error("Uploaded archive contains multiple model files: {first} and {second}")]
    AmbiguousModelFile {
        /// First matching entry.
        first: PathBuf,
        /// Second matching entry.
        second: PathBuf,
    },

    // --- Converter errors ---
    /// A best-effort pre-conversion step failed.
    #[error("Pre-conversion '{stage}' failed: {reason}")]
    PreconversionFailed {
        /// Stage name.
        stage: String,
        /// Why it failed.
        reason: String,
    },

    /// The primary converter exited unsuccessfully.
    #[error("Converter '{stage}' failed with exit code {code}: {stderr}")]
    PrimaryConversionFailed {
        /// Stage name.
        stage: String,
        /// Exit code, `-1` if killed by a signal.
        code: i32,
        /// Truncated stderr.
        stderr: String,
    },

    /// The converter reported success but the output is missing or empty.
    #[error("Converter reported success but produced no output at {path}")]
    ConversionProducedNoOutput {
        /// Expected output path.
        path: PathBuf,
    },

    /// The converter executable could not be found.
    #[error("Converter executable not found: {program}")]
    ConverterNotFound {
        /// Program name or path.
        program: String,
    },

    /// The converter ran longer than the configured timeout.
    #[error("Converter '{stage}' timed out after {timeout_seconds}s")]
    ConverterTimedOut {
        /// Stage name.
        stage: String,
        /// The timeout that was exceeded.
        timeout_seconds: u64,
    },

    /// The caller cancelled the operation.
    #[error("Conversion was cancelled")]
    Cancelled,

    // --- Generic errors ---
    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Blocking task failed to complete.
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ConversionError {
    /// Returns `true` if the upload itself was rejected.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::CorruptArchive { .. }
                | Self::TooManyEntries { .. }
                | Self::ArchiveTooLarge { .. }
                | Self::NoModelFileFound
                | Self::AmbiguousModelFile { .. }
                | Self::PreconversionFailed { .. }
                | Self::PrimaryConversionFailed { .. }
                | Self::ConversionProducedNoOutput { .. }
        )
    }
}

impl From<ConversionError> for AppError {
    fn from(err: ConversionError) -> Self {
        let kind = match &err {
            e if e.is_input_error() => ErrorKind::Validation,
            ConversionError::Cancelled => ErrorKind::Cancelled,
            ConversionError::ConverterNotFound { .. }
            | ConversionError::ConverterTimedOut { .. } => ErrorKind::ExternalService,
            ConversionError::Io(_) | ConversionError::NoParentDir { .. } => ErrorKind::Storage,
            _ => ErrorKind::Internal,
        };
        AppError::with_source(kind, err.to_string(), err)
    }
}
