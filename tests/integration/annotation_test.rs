//! Annotation save and tree validation integration tests.

mod helpers;

use bytes::Bytes;
use serde_json::json;
use uuid::Uuid;

use modelhub_database::ModelStore;
use modelhub_entity::annotation::{
    AnnotationFlags, MobilityDocument, MotionNode, PartNode,
};
use modelhub_service::{
    AnnotationError, RequestContext, SaveAnnotationRequest, TreeValidationError,
    validate_annotation,
};

use helpers::*;

fn parts(value: serde_json::Value) -> Vec<PartNode> {
    serde_json::from_value(value).unwrap()
}

fn motions(value: serde_json::Value) -> Vec<MotionNode> {
    serde_json::from_value(value).unwrap()
}

fn fixed_root(part: i64) -> serde_json::Value {
    json!([{
        "id": 0,
        "parent": -1,
        "joint": "fixed",
        "parts": [{"id": part, "name": "body"}],
        "jointData": {
            "axis": {"origin": [0.0, 0.0, 0.0], "direction": [0.0, 0.0, 0.0]},
            "limit": {"a": 0.0, "b": 0.0, "noLimit": true}
        }
    }])
}

async fn ingested(env: &TestEnv) -> Uuid {
    env.ingest
        .ingest(
            &RequestContext::new("uploader"),
            &chair_archive()[..],
            "chair.zip",
            None,
        )
        .await
        .unwrap()
        .identity()
        .id
}

fn complete(model_id: Uuid) -> SaveAnnotationRequest {
    SaveAnnotationRequest {
        model_id,
        category: Some("Chair".to_string()),
        flags: AnnotationFlags {
            shape_annotated: true,
            part_annotated: true,
            mobility_annotated: true,
        },
        part_tree: parts(json!([{"id": 0, "parent": -1, "children": [], "name": "body"}])),
        motion_tree: motions(fixed_root(0)),
        scene: json!({"asset": {"version": "2.0"}, "nodes": [{"name": "body"}]}),
        buffer: Some(Bytes::from_static(b"buffer")),
    }
}

#[tokio::test]
async fn test_end_to_end_save_round_trip() {
    let env = TestEnv::new(COPY_CONVERTER);
    env.store.create_category("Chair").await.unwrap();
    let id = ingested(&env).await;
    let req = complete(id);
    let submitted_parts = serde_json::to_string(&req.part_tree).unwrap();
    let submitted_motions = serde_json::to_string(&req.motion_tree).unwrap();

    let ctx = RequestContext::new("annotator");
    let record = env.annotation.save(&ctx, req).await.unwrap();

    let stored = env.store.find_annotation(id).await.unwrap().unwrap();
    assert_eq!(stored, record);
    assert_eq!(stored.category.as_deref(), Some("Chair"));
    assert!(stored.flags.is_complete());
    assert_eq!(serde_json::to_string(&stored.part_tree).unwrap(), submitted_parts);
    assert_eq!(
        serde_json::to_string(&stored.motion_tree).unwrap(),
        submitted_motions
    );

    let file = std::fs::read_to_string(env.layout.mobility_file(id)).unwrap();
    let document: MobilityDocument = serde_json::from_str(&file).unwrap();
    assert_eq!(document.partnet, stored.part_tree);
    assert_eq!(document.mobility, stored.motion_tree);

    let scene: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(env.layout.working_scene(id)).unwrap())
            .unwrap();
    assert_eq!(scene["nodes"][0]["name"], "body");
    assert_eq!(std::fs::read(env.layout.working_buffer(id)).unwrap(), b"buffer");

    // The raw copy is untouched by the save.
    let raw = std::fs::read_to_string(env.layout.raw_scene(id)).unwrap();
    assert!(raw.starts_with("v 0 0 0"));
}

#[tokio::test]
async fn test_rejected_save_leaves_previous_state() {
    let env = TestEnv::new(COPY_CONVERTER);
    env.store.create_category("Chair").await.unwrap();
    let id = ingested(&env).await;
    let ctx = RequestContext::new("annotator");

    let mut partial = complete(id);
    partial.flags.mobility_annotated = false;
    let saved = env.annotation.save(&ctx, partial).await.unwrap();
    let file_before = std::fs::read_to_string(env.layout.mobility_file(id)).unwrap();

    let mut bad = complete(id);
    bad.part_tree = parts(json!([
        {"id": 1, "parent": -1, "children": [2]},
        {"id": 2, "parent": 1, "children": [1]}
    ]));
    bad.motion_tree = motions(fixed_root(2));
    let err = env.annotation.save(&ctx, bad).await.unwrap_err();
    assert!(matches!(
        err,
        AnnotationError::InvalidTree(TreeValidationError::CycleDetected { part: 1 })
    ));

    assert_eq!(env.store.find_annotation(id).await.unwrap().unwrap(), saved);
    assert_eq!(
        std::fs::read_to_string(env.layout.mobility_file(id)).unwrap(),
        file_before
    );
}

#[tokio::test]
async fn test_save_for_unknown_model() {
    let env = TestEnv::new(COPY_CONVERTER);
    env.store.create_category("Chair").await.unwrap();

    let missing = Uuid::new_v4();
    let err = env
        .annotation
        .save(&RequestContext::new("annotator"), complete(missing))
        .await
        .unwrap_err();
    assert!(matches!(err, AnnotationError::ModelNotFound { id } if id == missing));
}

#[tokio::test]
async fn test_uncategorized_shape_rejected() {
    let env = TestEnv::new(COPY_CONVERTER);
    let id = ingested(&env).await;

    let mut req = complete(id);
    req.category = Some("null".to_string());
    let err = env
        .annotation
        .save(&RequestContext::new("annotator"), req)
        .await
        .unwrap_err();
    assert!(matches!(err, AnnotationError::CategoryNotAnnotated));
}

#[test]
fn test_wire_trees_validate() {
    let ok_parts = parts(json!([
        {"id": 0, "parent": -1, "children": [1, 2], "name": "cabinet"},
        {"id": 1, "parent": 0, "children": [], "name": "frame"},
        {"id": 2, "parent": 0, "children": [], "name": "door"}
    ]));
    let ok_motions = motions(json!([
        {"id": 0, "parent": -1, "joint": "fixed", "parts": [{"id": 1, "name": "frame"}]},
        {
            "id": 1, "parent": 0, "joint": "hinge", "name": "door",
            "parts": [{"id": 2, "name": "door"}],
            "jointData": {"axis": {"origin": [0, 0, 0], "direction": [0, 1, 0]}}
        }
    ]));
    assert_eq!(validate_annotation(&ok_parts, &ok_motions), Ok(()));

    let two_roots = parts(json!([
        {"id": 1, "parent": -1, "children": []},
        {"id": 2, "parent": -1, "children": []}
    ]));
    assert!(matches!(
        validate_annotation(&two_roots, &ok_motions),
        Err(TreeValidationError::MultipleRootParts { .. })
    ));

    let dangling = parts(json!([
        {"id": 1, "parent": -1, "children": []},
        {"id": 2, "parent": 5, "children": []}
    ]));
    assert!(matches!(
        validate_annotation(&dangling, &ok_motions),
        Err(TreeValidationError::InvalidTreeStructure { .. })
    ));

    let mut zero_axis = ok_motions.clone();
    zero_axis[1].joint_data.axis.direction = [0.0, 0.0, 0.0];
    assert_eq!(
        validate_annotation(&ok_parts, &zero_axis),
        Err(TreeValidationError::DegenerateJointAxis {
            node: "door:1".to_string()
        })
    );

    let mut moving_root = ok_motions.clone();
    moving_root[0].joint = Some("hinge".to_string().into());
    assert!(matches!(
        validate_annotation(&ok_parts, &moving_root),
        Err(TreeValidationError::RootMustNotMove { .. })
    ));

    let mut bound_to_root = ok_motions;
    bound_to_root[0].parts[0].id = 0;
    assert!(matches!(
        validate_annotation(&ok_parts, &bound_to_root),
        Err(TreeValidationError::AttachedPartNotLeaf { part: 0, .. })
    ));
}
