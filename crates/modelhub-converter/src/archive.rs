//! Bounded zip extraction.
//!
//! Entries are written into a hidden staging directory next to the
//! destination and renamed into place only after every entry succeeded.
//! A failed extraction leaves nothing under the destination name.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use modelhub_core::config::IngestConfig;
use tracing::{debug, warn};
use zip::ZipArchive;

use crate::error::ConversionError;

/// Buffer size for streaming entry contents.
const BUFFER_SIZE: usize = 64 * 1024;

/// Abuse-prevention bounds for one archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveLimits {
    /// Maximum number of entries.
    pub max_entries: usize,
    /// Maximum cumulative uncompressed bytes.
    pub max_uncompressed_bytes: u64,
}

impl From<&IngestConfig> for ArchiveLimits {
    fn from(config: &IngestConfig) -> Self {
        Self {
            max_entries: config.max_archive_entries,
            max_uncompressed_bytes: config.max_uncompressed_bytes,
        }
    }
}

impl Default for ArchiveLimits {
    fn default() -> Self {
        Self::from(&IngestConfig::default())
    }
}

/// One extracted entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Path relative to the extraction root.
    pub path: PathBuf,
    /// Whether the entry is a directory.
    pub is_dir: bool,
    /// Uncompressed size in bytes.
    pub size: u64,
}

/// The result of a successful extraction.
#[derive(Debug, Clone)]
pub struct ExtractedArchive {
    /// Final extraction directory.
    pub root: PathBuf,
    /// Entries in archive order.
    pub entries: Vec<ArchiveEntry>,
    /// Total bytes written.
    pub total_bytes: u64,
}

/// Extracts untrusted zip archives under [`ArchiveLimits`].
#[derive(Debug, Clone, Default)]
pub struct ArchiveExtractor {
    limits: ArchiveLimits,
}

impl ArchiveExtractor {
    /// Create an extractor with the given limits.
    pub fn new(limits: ArchiveLimits) -> Self {
        Self { limits }
    }

    /// The limits in force.
    pub fn limits(&self) -> ArchiveLimits {
        self.limits
    }

    /// Extract `archive_path` into `destination`.
    ///
    /// Blocking; run it on a blocking thread from async code.
    pub fn extract(
        &self,
        archive_path: &Path,
        destination: &Path,
    ) -> Result<ExtractedArchive, ConversionError> {
        let file = File::open(archive_path)?;
        let mut archive = ZipArchive::new(file).map_err(corrupt)?;

        if archive.len() > self.limits.max_entries {
            return Err(ConversionError::TooManyEntries {
                count: archive.len(),
                limit: self.limits.max_entries,
            });
        }

        let parent = destination
            .parent()
            .ok_or_else(|| ConversionError::NoParentDir {
                path: destination.to_path_buf(),
            })?;
        fs::create_dir_all(parent)?;

        // Removed on drop unless we reach the rename below.
        let staging = tempfile::Builder::new()
            .prefix(".extract-")
            .tempdir_in(parent)?;

        let mut entries = Vec::with_capacity(archive.len());
        let mut declared_total = 0u64;
        let mut written_total = 0u64;
        let mut buffer = vec![0u8; BUFFER_SIZE];

        for i in 0..archive.len() {
            if i >= self.limits.max_entries {
                return Err(ConversionError::TooManyEntries {
                    count: i + 1,
                    limit: self.limits.max_entries,
                });
            }

            let mut entry = archive.by_index(i).map_err(corrupt)?;

            declared_total = declared_total.saturating_add(entry.size());
            if declared_total > self.limits.max_uncompressed_bytes {
                return Err(ConversionError::ArchiveTooLarge {
                    limit: self.limits.max_uncompressed_bytes,
                });
            }

            let Some(relative) = entry.enclosed_name() else {
                warn!(name = %entry.name(), "Skipping archive entry with unsafe path");
                continue;
            };
            let out_path = staging.path().join(&relative);

            if entry.is_dir() {
                fs::create_dir_all(&out_path)?;
                entries.push(ArchiveEntry {
                    path: relative,
                    is_dir: true,
                    size: 0,
                });
                continue;
            }

            if let Some(p) = out_path.parent() {
                fs::create_dir_all(p)?;
            }
            let mut outfile = File::create(&out_path)?;
            let mut written = 0u64;
            loop {
                let n = entry.read(&mut buffer).map_err(|e| ConversionError::CorruptArchive {
                    reason: format!("{}: {e}", relative.display()),
                })?;
                if n == 0 {
                    break;
                }
                written += n as u64;
                written_total += n as u64;
                // Declared sizes can lie; bound what actually lands on disk.
                if written_total > self.limits.max_uncompressed_bytes {
                    return Err(ConversionError::ArchiveTooLarge {
                        limit: self.limits.max_uncompressed_bytes,
                    });
                }
                outfile.write_all(&buffer[..n])?;
            }

            entries.push(ArchiveEntry {
                path: relative,
                is_dir: false,
                size: written,
            });
        }

        let staged = staging.keep();
        if let Err(e) = fs::rename(&staged, destination) {
            let _ = fs::remove_dir_all(&staged);
            return Err(e.into());
        }

        debug!(
            destination = %destination.display(),
            entries = entries.len(),
            bytes = written_total,
            "Archive extracted"
        );

        Ok(ExtractedArchive {
            root: destination.to_path_buf(),
            entries,
            total_bytes: written_total,
        })
    }
}

fn corrupt(err: zip::result::ZipError) -> ConversionError {
    ConversionError::CorruptArchive {
        reason: err.to_string(),
    }
}
