//! Upload and extraction limits.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Default maximum number of entries in an uploaded archive.
pub const DEFAULT_MAX_ARCHIVE_ENTRIES: usize = 1000;
/// Default maximum cumulative uncompressed size (100 MiB).
pub const DEFAULT_MAX_UNCOMPRESSED_BYTES: u64 = 100 * 1024 * 1024;

/// Abuse-prevention bounds applied while ingesting an upload.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct IngestConfig {
    /// Maximum number of archive entries (files and directories).
    #[validate(range(min = 1))]
    pub max_archive_entries: usize,
    /// Maximum cumulative uncompressed size of all entries, in bytes.
    #[validate(range(min = 1))]
    pub max_uncompressed_bytes: u64,
    /// Maximum number of converter processes running at once.
    #[validate(range(min = 1, max = 64))]
    pub max_concurrent_conversions: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_archive_entries: DEFAULT_MAX_ARCHIVE_ENTRIES,
            max_uncompressed_bytes: DEFAULT_MAX_UNCOMPRESSED_BYTES,
            max_concurrent_conversions: 4,
        }
    }
}
