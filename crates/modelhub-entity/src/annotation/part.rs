//! Part hierarchy node.

use serde::{Deserialize, Serialize};

/// One node of the part tree as submitted by the annotation tool.
///
/// A negative `parent` marks the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartNode {
    /// Part id, unique within one tree.
    pub id: i64,
    /// Parent part id, negative for the root.
    pub parent: i64,
    /// Declared children, in display order.
    #[serde(default)]
    pub children: Vec<i64>,
    /// Display name.
    #[serde(default)]
    pub name: String,
}

impl PartNode {
    /// Returns `true` if this node claims to be the root.
    pub fn is_root(&self) -> bool {
        self.parent < 0
    }

    /// Returns `true` if this node has no declared children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}
