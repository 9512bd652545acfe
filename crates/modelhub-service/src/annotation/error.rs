//! Annotation errors.

use modelhub_core::error::{AppError, ErrorKind};
use thiserror::Error;
use uuid::Uuid;

/// A violated rule of the part or motion tree.
///
/// Messages name the offending node and are meant for the annotator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeValidationError {
    // --- Part tree ---
    /// No part has a negative parent.
    #[error("invalid partnet: no root part")]
    NoRootPart,

    /// More than one part has a negative parent.
    #[error("invalid partnet: multiple root parts {ids:?}")]
    MultipleRootParts {
        /// Ids of the root candidates.
        ids: Vec<i64>,
    },

    /// A declared child id names no part.
    #[error("invalid partnet: {parent_name}:{parent}'s child {child} does not exist")]
    UnknownChildPart {
        /// Declaring part.
        parent: i64,
        /// Declaring part's name.
        parent_name: String,
        /// Missing child id.
        child: i64,
    },

    /// A part is reached twice from the root.
    #[error("invalid partnet: cycle detected at part {part}")]
    CycleDetected {
        /// Part reached a second time.
        part: i64,
    },

    /// A child does not point back at the part listing it.
    #[error("invalid partnet: inconsistent parent-child relation for {parent_name}:{parent}, {child}")]
    InconsistentParentChild {
        /// Declaring part.
        parent: i64,
        /// Declaring part's name.
        parent_name: String,
        /// Child whose parent differs.
        child: i64,
    },

    /// Some parts are not reachable from the root.
    #[error("invalid partnet: invalid tree structure ({reached} of {total} parts reachable from the root)")]
    InvalidTreeStructure {
        /// Parts reached from the root.
        reached: usize,
        /// Parts submitted.
        total: usize,
    },

    // --- Motion tree ---
    /// No motion node has a negative parent.
    #[error("invalid mobility: no root")]
    NoMotionRoot,

    /// More than one motion node has a negative parent.
    #[error("invalid mobility: multiple roots {ids:?}")]
    MultipleMotionRoots {
        /// Ids of the root candidates.
        ids: Vec<i64>,
    },

    /// A motion node's parent does not exist.
    #[error("invalid mobility: invalid parent {parent} on {node}")]
    InvalidMotionParent {
        /// Offending node.
        node: i64,
        /// Missing parent id.
        parent: i64,
    },

    /// A motion node is reached twice from the root.
    #[error("invalid mobility: cycle detected at mobility {node}")]
    MotionCycleDetected {
        /// Node reached a second time.
        node: i64,
    },

    /// Some motion nodes are not reachable from the root.
    #[error("invalid mobility: invalid tree structure ({reached} of {total} nodes reachable from the root)")]
    InvalidMotionTreeStructure {
        /// Nodes reached from the root.
        reached: usize,
        /// Nodes submitted.
        total: usize,
    },

    /// A motion node has no joint kind.
    #[error("invalid mobility: joint of {node} is not annotated")]
    UnannotatedJoint {
        /// Node label (`name:id` or `id`).
        node: String,
    },

    /// The motion root is a hinge or slider.
    #[error("invalid mobility: root {node} must not move")]
    RootMustNotMove {
        /// Root label.
        node: String,
    },

    /// A hinge or slider has a (near) zero axis direction.
    #[error("invalid mobility: invalid axis direction at mobility {node}")]
    DegenerateJointAxis {
        /// Node label.
        node: String,
    },

    /// An attached part is not in the part tree.
    #[error("invalid mobility: part {part} attached to {node} does not exist")]
    AttachedPartNotFound {
        /// Node label.
        node: String,
        /// Missing part id.
        part: i64,
    },

    /// An attached part has children.
    #[error("invalid mobility: part {part} attached to {node} is not a leaf")]
    AttachedPartNotLeaf {
        /// Node label.
        node: String,
        /// Non-leaf part id.
        part: i64,
    },
}

/// Why an annotation save was rejected or failed.
#[derive(Debug, Error)]
pub enum AnnotationError {
    /// No such model, or its working copy is missing.
    #[error("invalid model id {id}")]
    ModelNotFound {
        /// Requested model.
        id: Uuid,
    },

    /// Shape marked annotated without a category.
    #[error("category is not annotated")]
    CategoryNotAnnotated,

    /// The category is not in the catalog.
    #[error("invalid category '{name}'")]
    UnknownCategory {
        /// Submitted category.
        name: String,
    },

    /// The trees failed validation.
    #[error(transparent)]
    InvalidTree(#[from] TreeValidationError),

    /// The store failed.
    #[error(transparent)]
    Persistence(#[from] AppError),

    /// Writing the working copy failed.
    #[error("Failed to write working copy: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding a file failed.
    #[error("Failed to encode annotation: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Blocking task failed to complete.
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<TreeValidationError> for AppError {
    fn from(err: TreeValidationError) -> Self {
        AppError::with_source(ErrorKind::Validation, err.to_string(), err)
    }
}

impl From<AnnotationError> for AppError {
    fn from(err: AnnotationError) -> Self {
        match err {
            AnnotationError::Persistence(e) => e,
            AnnotationError::ModelNotFound { .. } => AppError::not_found(err.to_string()),
            AnnotationError::CategoryNotAnnotated | AnnotationError::UnknownCategory { .. } => {
                AppError::validation(err.to_string())
            }
            AnnotationError::InvalidTree(e) => e.into(),
            AnnotationError::Io(_) => AppError::with_source(ErrorKind::Storage, err.to_string(), err),
            AnnotationError::Serialization(_) => {
                AppError::with_source(ErrorKind::Serialization, err.to_string(), err)
            }
            AnnotationError::Join(_) => AppError::with_source(ErrorKind::Internal, err.to_string(), err),
        }
    }
}
