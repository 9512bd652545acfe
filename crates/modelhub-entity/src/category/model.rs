//! Shape category entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A category a shape can be annotated with (e.g. `Chair`, `Laptop`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ShapeCategory {
    /// Category name. Unique.
    pub name: String,
    /// When the category was added.
    pub created_at: DateTime<Utc>,
}

impl ShapeCategory {
    /// Normalize a submitted category value.
    ///
    /// The annotation tool sends `""`, `"null"` or `"none"` for "no
    /// category"; those map to `None`.
    pub fn normalize(value: Option<&str>) -> Option<String> {
        let value = value?.trim();
        match value {
            "" | "null" | "none" => None,
            other => Some(other.to_string()),
        }
    }
}
