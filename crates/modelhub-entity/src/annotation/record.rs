//! Annotation record entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::motion::MotionNode;
use super::part::PartNode;

/// The three completeness flags an annotator sets on a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnnotationFlags {
    /// A category has been chosen.
    pub shape_annotated: bool,
    /// The part hierarchy is complete.
    pub part_annotated: bool,
    /// The motion hierarchy is complete.
    pub mobility_annotated: bool,
}

impl AnnotationFlags {
    /// All three stages are marked done.
    pub fn is_complete(&self) -> bool {
        self.shape_annotated && self.part_annotated && self.mobility_annotated
    }
}

/// The annotation state of one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    /// The annotated model.
    pub model_id: Uuid,
    /// Shape category, if chosen.
    pub category: Option<String>,
    /// Completeness flags.
    #[serde(flatten)]
    pub flags: AnnotationFlags,
    /// Part hierarchy.
    pub part_tree: Vec<PartNode>,
    /// Motion hierarchy.
    pub motion_tree: Vec<MotionNode>,
    /// Who saved last.
    pub annotator_id: Option<String>,
    /// When the record was last saved.
    pub updated_at: DateTime<Utc>,
}

impl AnnotationRecord {
    /// An unannotated record for a freshly ingested model.
    pub fn empty(model_id: Uuid) -> Self {
        Self {
            model_id,
            category: None,
            flags: AnnotationFlags::default(),
            part_tree: Vec::new(),
            motion_tree: Vec::new(),
            annotator_id: None,
            updated_at: Utc::now(),
        }
    }
}

/// Contents of `mobility_v3.json` in a model's working directory.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MobilityDocument {
    /// Part hierarchy.
    #[serde(default)]
    pub partnet: Vec<PartNode>,
    /// Motion hierarchy.
    #[serde(default)]
    pub mobility: Vec<MotionNode>,
}
