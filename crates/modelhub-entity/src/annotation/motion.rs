//! Motion (joint) hierarchy node.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of joint connecting a motion node to its parent.
///
/// Unrecognized joint names are kept verbatim so a saved tree reads back
/// exactly as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JointKind {
    /// Rigidly attached to the parent.
    Fixed,
    /// Rotates about an axis.
    Hinge,
    /// Translates along an axis.
    Slider,
    /// Unconstrained.
    Free,
    /// Any other joint name.
    Other(String),
}

impl JointKind {
    /// Returns `true` for joints that move relative to their parent along
    /// an axis.
    pub fn is_moving(&self) -> bool {
        matches!(self, Self::Hinge | Self::Slider)
    }

    /// Return the joint as its wire name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Fixed => "fixed",
            Self::Hinge => "hinge",
            Self::Slider => "slider",
            Self::Free => "free",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for JointKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "fixed" => Self::Fixed,
            "hinge" => Self::Hinge,
            "slider" => Self::Slider,
            "free" => Self::Free,
            _ => Self::Other(value),
        }
    }
}

impl From<JointKind> for String {
    fn from(value: JointKind) -> Self {
        match value {
            JointKind::Other(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for JointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Joint axis in model space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JointAxis {
    /// A point on the axis.
    pub origin: [f64; 3],
    /// Axis direction. Not necessarily normalized.
    pub direction: [f64; 3],
}

impl JointAxis {
    /// Squared length of the direction vector.
    pub fn direction_norm_squared(&self) -> f64 {
        let [x, y, z] = self.direction;
        x * x + y * y + z * z
    }
}

/// Motion range of a joint.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JointLimit {
    /// Lower bound.
    pub a: f64,
    /// Upper bound.
    pub b: f64,
    /// Unbounded motion.
    pub no_limit: bool,
    /// A slider that also rotates about its axis.
    pub rotates: bool,
    /// Unbounded rotation for a rotating slider.
    pub no_rotation_limit: bool,
    /// Rotation bound for a rotating slider.
    pub rotation_limit: f64,
}

/// Axis and limits of a joint.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JointData {
    /// Joint axis.
    pub axis: JointAxis,
    /// Joint limits.
    pub limit: JointLimit,
}

/// A part-tree leaf bound to a motion node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachedPart {
    /// Part id in the part tree.
    pub id: i64,
    /// Part display name.
    #[serde(default)]
    pub name: String,
}

/// One node of the motion tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionNode {
    /// Motion node id, unique within one tree.
    pub id: i64,
    /// Parent motion node id, negative for the root.
    pub parent: i64,
    /// Joint kind; `None` until annotated.
    #[serde(default)]
    pub joint: Option<JointKind>,
    /// Optional display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Part-tree leaves moved by this joint.
    #[serde(default)]
    pub parts: Vec<AttachedPart>,
    /// Joint geometry.
    #[serde(default, rename = "jointData")]
    pub joint_data: JointData,
}

impl MotionNode {
    /// Returns `true` if this node claims to be the root.
    pub fn is_root(&self) -> bool {
        self.parent < 0
    }

    /// Name for error messages: the display name when set, else the id.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("{name}:{}", self.id),
            None => self.id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let json = r#"{
            "id": 3,
            "parent": 0,
            "joint": "hinge",
            "name": "door",
            "parts": [{"id": 7, "name": "panel"}],
            "jointData": {
                "axis": {"origin": [0, 0, 0], "direction": [0, 1, 0]},
                "limit": {"a": -90, "b": 0, "noLimit": false, "rotates": false,
                          "noRotationLimit": false, "rotationLimit": 0}
            }
        }"#;
        let node: MotionNode = serde_json::from_str(json).unwrap();
        assert_eq!(node.joint, Some(JointKind::Hinge));
        assert_eq!(node.parts[0].id, 7);
        assert_eq!(node.joint_data.axis.direction, [0.0, 1.0, 0.0]);
        assert_eq!(node.joint_data.limit.a, -90.0);

        let value = serde_json::to_value(&node).unwrap();
        assert!(value.get("jointData").is_some());
        assert!(value["jointData"]["limit"].get("noLimit").is_some());
    }

    #[test]
    fn test_unannotated_joint() {
        let node: MotionNode =
            serde_json::from_str(r#"{"id": 0, "parent": -1, "joint": null, "parts": []}"#).unwrap();
        assert!(node.joint.is_none());
        assert!(node.is_root());
    }

    #[test]
    fn test_unknown_joint_preserved() {
        let kind: JointKind = serde_json::from_str(r#""ball""#).unwrap();
        assert_eq!(kind, JointKind::Other("ball".to_string()));
        assert!(!kind.is_moving());
        assert_eq!(serde_json::to_string(&kind).unwrap(), r#""ball""#);
    }
}
