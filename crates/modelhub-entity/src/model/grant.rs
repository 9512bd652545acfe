//! Per-user access to a model identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Access level given to anyone who uploads a model's content.
pub const UPLOADER_ACCESS_LEVEL: i32 = 5;

/// A user's access to a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AccessGrant {
    /// The model the grant applies to.
    pub model_id: Uuid,
    /// The grantee.
    pub user_id: String,
    /// Access level.
    pub access_level: i32,
    /// When the grant was created.
    pub created_at: DateTime<Utc>,
    /// Last time the grantee saved work on the model.
    pub accessed_at: DateTime<Utc>,
}

impl AccessGrant {
    /// The grant given to an uploader.
    pub fn uploader(model_id: Uuid, user_id: &str) -> Self {
        let now = Utc::now();
        Self {
            model_id,
            user_id: user_id.to_string(),
            access_level: UPLOADER_ACCESS_LEVEL,
            created_at: now,
            accessed_at: now,
        }
    }
}
