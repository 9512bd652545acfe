//! Structural and physical checks for submitted part/mobility trees.
//!
//! Pure and synchronous: adjacency maps are built once per call and every
//! traversal is iterative with an explicit visited set, so malformed input
//! (cycles, duplicate ids, dangling references) always terminates.
//!
//! Part tree, in order: single root, child existence, traversal from the
//! root (cycle check), parent/child agreement, spanning.
//! Motion tree, in order: single root, parent existence, traversal from the
//! root (cycle check) and spanning, joint completeness, immovable root,
//! axis validity, leaf binding against the part tree.

use std::collections::{HashMap, HashSet};

use modelhub_entity::annotation::{MotionNode, PartNode};

use super::error::TreeValidationError;

/// Squared axis length at or below which a joint axis is degenerate.
pub const AXIS_EPSILON: f64 = 1e-6;

/// Validate both trees, part tree first.
pub fn validate_annotation(
    parts: &[PartNode],
    motions: &[MotionNode],
) -> Result<(), TreeValidationError> {
    let part_index = validate_part_tree(parts)?;
    validate_motion_tree(motions, &part_index)
}

/// Validate the part tree and return its id index.
pub fn validate_part_tree(parts: &[PartNode]) -> Result<HashMap<i64, &PartNode>, TreeValidationError> {
    let roots: Vec<&PartNode> = parts.iter().filter(|p| p.is_root()).collect();
    let root = match roots.as_slice() {
        [] => return Err(TreeValidationError::NoRootPart),
        [root] => *root,
        many => {
            return Err(TreeValidationError::MultipleRootParts {
                ids: many.iter().map(|p| p.id).collect(),
            });
        }
    };

    let index: HashMap<i64, &PartNode> = parts.iter().map(|p| (p.id, p)).collect();

    for part in parts {
        if let Some(&child) = part.children.iter().find(|&&c| !index.contains_key(&c)) {
            return Err(TreeValidationError::UnknownChildPart {
                parent: part.id,
                parent_name: part.name.clone(),
                child,
            });
        }
    }

    let mut visited = HashSet::from([root.id]);
    let mut stack = vec![root];
    while let Some(part) = stack.pop() {
        for &child in &part.children {
            if !visited.insert(child) {
                return Err(TreeValidationError::CycleDetected { part: child });
            }
            if let Some(&node) = index.get(&child) {
                stack.push(node);
            }
        }
    }

    for part in parts {
        for &child in &part.children {
            let agrees = index.get(&child).is_some_and(|c| c.parent == part.id);
            if !agrees {
                return Err(TreeValidationError::InconsistentParentChild {
                    parent: part.id,
                    parent_name: part.name.clone(),
                    child,
                });
            }
        }
    }

    if visited.len() != parts.len() {
        return Err(TreeValidationError::InvalidTreeStructure {
            reached: visited.len(),
            total: parts.len(),
        });
    }

    Ok(index)
}

/// Validate the motion tree against an already validated part index.
pub fn validate_motion_tree(
    motions: &[MotionNode],
    parts: &HashMap<i64, &PartNode>,
) -> Result<(), TreeValidationError> {
    let roots: Vec<&MotionNode> = motions.iter().filter(|m| m.is_root()).collect();
    let root = match roots.as_slice() {
        [] => return Err(TreeValidationError::NoMotionRoot),
        [root] => *root,
        many => {
            return Err(TreeValidationError::MultipleMotionRoots {
                ids: many.iter().map(|m| m.id).collect(),
            });
        }
    };

    let ids: HashSet<i64> = motions.iter().map(|m| m.id).collect();
    if let Some(orphan) = motions
        .iter()
        .find(|m| !m.is_root() && !ids.contains(&m.parent))
    {
        return Err(TreeValidationError::InvalidMotionParent {
            node: orphan.id,
            parent: orphan.parent,
        });
    }

    let mut children: HashMap<i64, Vec<i64>> = HashMap::new();
    for node in motions.iter().filter(|m| !m.is_root()) {
        children.entry(node.parent).or_default().push(node.id);
    }

    let mut visited = HashSet::from([root.id]);
    let mut stack = vec![root.id];
    while let Some(id) = stack.pop() {
        for &child in children.get(&id).map(Vec::as_slice).unwrap_or_default() {
            if !visited.insert(child) {
                return Err(TreeValidationError::MotionCycleDetected { node: child });
            }
            stack.push(child);
        }
    }
    if visited.len() != motions.len() {
        return Err(TreeValidationError::InvalidMotionTreeStructure {
            reached: visited.len(),
            total: motions.len(),
        });
    }

    if let Some(node) = motions.iter().find(|m| m.joint.is_none()) {
        return Err(TreeValidationError::UnannotatedJoint { node: node.label() });
    }

    if root.joint.as_ref().is_some_and(|j| j.is_moving()) {
        return Err(TreeValidationError::RootMustNotMove { node: root.label() });
    }

    for node in motions {
        let moving = node.joint.as_ref().is_some_and(|j| j.is_moving());
        // Written as a negated `>` so NaN components count as degenerate.
        if moving && !(node.joint_data.axis.direction_norm_squared() > AXIS_EPSILON) {
            return Err(TreeValidationError::DegenerateJointAxis { node: node.label() });
        }
    }

    for node in motions {
        for attached in &node.parts {
            match parts.get(&attached.id) {
                None => {
                    return Err(TreeValidationError::AttachedPartNotFound {
                        node: node.label(),
                        part: attached.id,
                    });
                }
                Some(part) if !part.is_leaf() => {
                    return Err(TreeValidationError::AttachedPartNotLeaf {
                        node: node.label(),
                        part: attached.id,
                    });
                }
                Some(_) => {}
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelhub_entity::annotation::{AttachedPart, JointAxis, JointData, JointKind};

    fn part(id: i64, parent: i64, children: &[i64]) -> PartNode {
        PartNode {
            id,
            parent,
            children: children.to_vec(),
            name: format!("part{id}"),
        }
    }

    fn motion(id: i64, parent: i64, joint: Option<JointKind>, parts: &[i64]) -> MotionNode {
        MotionNode {
            id,
            parent,
            joint,
            name: None,
            parts: parts
                .iter()
                .map(|&p| AttachedPart {
                    id: p,
                    name: format!("part{p}"),
                })
                .collect(),
            joint_data: JointData {
                axis: JointAxis {
                    origin: [0.0; 3],
                    direction: [1.0, 0.0, 0.0],
                },
                ..Default::default()
            },
        }
    }

    /// Body with a door: parts 0 -> {1, 2}, motion 0 (fixed, body) -> 1 (hinge, door).
    fn cabinet() -> (Vec<PartNode>, Vec<MotionNode>) {
        let parts = vec![part(0, -1, &[1, 2]), part(1, 0, &[]), part(2, 0, &[])];
        let motions = vec![
            motion(0, -1, Some(JointKind::Fixed), &[1]),
            motion(1, 0, Some(JointKind::Hinge), &[2]),
        ];
        (parts, motions)
    }

    #[test]
    fn test_valid_cabinet() {
        let (parts, motions) = cabinet();
        assert_eq!(validate_annotation(&parts, &motions), Ok(()));
    }

    #[test]
    fn test_single_part_fixed_root() {
        let parts = vec![part(0, -1, &[])];
        let motions = vec![motion(0, -1, Some(JointKind::Fixed), &[0])];
        assert_eq!(validate_annotation(&parts, &motions), Ok(()));
    }

    #[test]
    fn test_no_root_part() {
        let parts = vec![part(1, 2, &[]), part(2, 1, &[])];
        assert_eq!(
            validate_part_tree(&parts).unwrap_err(),
            TreeValidationError::NoRootPart
        );
        assert_eq!(
            validate_part_tree(&[]).unwrap_err(),
            TreeValidationError::NoRootPart
        );
    }

    #[test]
    fn test_two_roots() {
        let parts = vec![part(1, -1, &[]), part(2, -1, &[])];
        assert_eq!(
            validate_part_tree(&parts).unwrap_err(),
            TreeValidationError::MultipleRootParts { ids: vec![1, 2] }
        );
    }

    #[test]
    fn test_cycle_back_to_root() {
        let parts = vec![part(1, -1, &[2]), part(2, 1, &[1])];
        assert_eq!(
            validate_part_tree(&parts).unwrap_err(),
            TreeValidationError::CycleDetected { part: 1 }
        );
    }

    #[test]
    fn test_self_loop_is_cycle() {
        let parts = vec![part(1, -1, &[2]), part(2, 1, &[2])];
        assert_eq!(
            validate_part_tree(&parts).unwrap_err(),
            TreeValidationError::CycleDetected { part: 2 }
        );
    }

    #[test]
    fn test_dangling_parent_is_disconnected() {
        let parts = vec![part(1, -1, &[]), part(2, 5, &[])];
        assert_eq!(
            validate_part_tree(&parts).unwrap_err(),
            TreeValidationError::InvalidTreeStructure {
                reached: 1,
                total: 2
            }
        );
    }

    #[test]
    fn test_unknown_child() {
        let parts = vec![part(1, -1, &[9])];
        assert!(matches!(
            validate_part_tree(&parts).unwrap_err(),
            TreeValidationError::UnknownChildPart { parent: 1, child: 9, .. }
        ));
    }

    #[test]
    fn test_child_with_wrong_parent() {
        let parts = vec![part(1, -1, &[2, 3]), part(2, 1, &[]), part(3, 2, &[])];
        assert!(matches!(
            validate_part_tree(&parts).unwrap_err(),
            TreeValidationError::InconsistentParentChild { parent: 1, child: 3, .. }
        ));
    }

    #[test]
    fn test_disconnected_cycle_off_root() {
        let parts = vec![part(1, -1, &[]), part(2, 3, &[3]), part(3, 2, &[2])];
        assert_eq!(
            validate_part_tree(&parts).unwrap_err(),
            TreeValidationError::InvalidTreeStructure {
                reached: 1,
                total: 3
            }
        );
    }

    #[test]
    fn test_motion_roots() {
        let (parts, _) = cabinet();
        assert_eq!(
            validate_annotation(&parts, &[]).unwrap_err(),
            TreeValidationError::NoMotionRoot
        );

        let motions = vec![
            motion(0, -1, Some(JointKind::Fixed), &[1]),
            motion(1, -1, Some(JointKind::Fixed), &[2]),
        ];
        assert_eq!(
            validate_annotation(&parts, &motions).unwrap_err(),
            TreeValidationError::MultipleMotionRoots { ids: vec![0, 1] }
        );
    }

    #[test]
    fn test_motion_missing_parent() {
        let (parts, mut motions) = cabinet();
        motions[1].parent = 7;
        assert_eq!(
            validate_annotation(&parts, &motions).unwrap_err(),
            TreeValidationError::InvalidMotionParent { node: 1, parent: 7 }
        );
    }

    #[test]
    fn test_motion_cycle_off_root() {
        let (parts, mut motions) = cabinet();
        motions.push(motion(2, 3, Some(JointKind::Fixed), &[]));
        motions.push(motion(3, 2, Some(JointKind::Fixed), &[]));
        assert_eq!(
            validate_annotation(&parts, &motions).unwrap_err(),
            TreeValidationError::InvalidMotionTreeStructure {
                reached: 2,
                total: 4
            }
        );
    }

    #[test]
    fn test_duplicate_motion_id_is_cycle() {
        let (parts, mut motions) = cabinet();
        motions.push(motion(1, 0, Some(JointKind::Fixed), &[]));
        assert_eq!(
            validate_annotation(&parts, &motions).unwrap_err(),
            TreeValidationError::MotionCycleDetected { node: 1 }
        );
    }

    #[test]
    fn test_unannotated_joint() {
        let (parts, mut motions) = cabinet();
        motions[1].joint = None;
        motions[1].name = Some("door".into());
        assert_eq!(
            validate_annotation(&parts, &motions).unwrap_err(),
            TreeValidationError::UnannotatedJoint {
                node: "door:1".into()
            }
        );
    }

    #[test]
    fn test_root_must_not_move() {
        for joint in [JointKind::Hinge, JointKind::Slider] {
            let (parts, mut motions) = cabinet();
            motions[0].joint = Some(joint);
            assert_eq!(
                validate_annotation(&parts, &motions).unwrap_err(),
                TreeValidationError::RootMustNotMove { node: "0".into() }
            );
        }
    }

    #[test]
    fn test_degenerate_axis() {
        let (parts, mut motions) = cabinet();
        motions[1].joint_data.axis.direction = [0.0, 0.0, 0.0];
        assert_eq!(
            validate_annotation(&parts, &motions).unwrap_err(),
            TreeValidationError::DegenerateJointAxis { node: "1".into() }
        );

        motions[1].joint_data.axis.direction = [1.0, 0.0, 0.0];
        assert_eq!(validate_annotation(&parts, &motions), Ok(()));

        motions[1].joint_data.axis.direction = [f64::NAN, 0.0, 0.0];
        assert!(validate_annotation(&parts, &motions).is_err());
    }

    #[test]
    fn test_fixed_joint_axis_not_checked() {
        let (parts, mut motions) = cabinet();
        motions[0].joint_data.axis.direction = [0.0, 0.0, 0.0];
        assert_eq!(validate_annotation(&parts, &motions), Ok(()));
    }

    #[test]
    fn test_attached_part_must_exist() {
        let (parts, mut motions) = cabinet();
        motions[1].parts.push(AttachedPart {
            id: 42,
            name: "ghost".into(),
        });
        assert_eq!(
            validate_annotation(&parts, &motions).unwrap_err(),
            TreeValidationError::AttachedPartNotFound {
                node: "1".into(),
                part: 42
            }
        );
    }

    #[test]
    fn test_attached_part_must_be_leaf() {
        let parts = vec![part(0, -1, &[1]), part(1, 0, &[2]), part(2, 1, &[])];
        let motions = vec![motion(0, -1, Some(JointKind::Fixed), &[1])];
        assert_eq!(
            validate_annotation(&parts, &motions).unwrap_err(),
            TreeValidationError::AttachedPartNotLeaf {
                node: "0".into(),
                part: 1
            }
        );

        let motions = vec![motion(0, -1, Some(JointKind::Fixed), &[2])];
        assert_eq!(validate_annotation(&parts, &motions), Ok(()));
    }

    #[test]
    fn test_part_errors_reported_before_motion_errors() {
        let parts = vec![part(1, -1, &[]), part(2, -1, &[])];
        assert!(matches!(
            validate_annotation(&parts, &[]).unwrap_err(),
            TreeValidationError::MultipleRootParts { .. }
        ));
    }
}
