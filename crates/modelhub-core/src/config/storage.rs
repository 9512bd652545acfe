//! Model directory roots.

use serde::{Deserialize, Serialize};

/// Where ingested models live on disk.
///
/// Every identity owns `<raw_root>/<id>` and `<working_root>/<id>`; both
/// roots must be on a volume that supports atomic rename.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root of the immutable raw copies (extracted archive + converted scene).
    pub raw_root: String,
    /// Root of the mutable working copies edited by annotators.
    pub working_root: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            raw_root: "./data/models/raw".to_string(),
            working_root: "./data/models/partnet".to_string(),
        }
    }
}
