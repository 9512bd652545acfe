//! Ingestion pipeline integration tests.

mod helpers;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use uuid::Uuid;

use modelhub_converter::ConversionError;
use modelhub_core::result::AppResult;
use modelhub_core::types::{PageRequest, PageResponse};
use modelhub_database::{MemoryModelStore, ModelStore};
use modelhub_entity::annotation::{AnnotationFilter, AnnotationRecord};
use modelhub_entity::category::ShapeCategory;
use modelhub_entity::model::{AccessGrant, ModelIdentity, NewModel};
use modelhub_service::{IngestError, IngestOutcome, RequestContext};

use helpers::*;

#[tokio::test]
async fn test_ingest_creates_identity_and_working_copy() {
    let env = TestEnv::new(COPY_CONVERTER);
    let ctx = RequestContext::new("alice@example.com");

    let outcome = env
        .ingest
        .ingest(&ctx, &chair_archive()[..], "chair.zip", None)
        .await
        .unwrap();

    let IngestOutcome::Created(model) = outcome else {
        panic!("expected a new identity");
    };
    let id = model.identity.id;
    assert_eq!(model.identity.source_file_name, "chair/chair.obj");
    assert_eq!(model.canonical_scene_path, env.layout.raw_scene(id));
    assert!(model.canonical_scene_path.is_file());
    assert!(env.layout.working_scene(id).is_file());
    assert!(
        env.layout
            .original_dir(id)
            .join("chair/README.txt")
            .is_file()
    );

    assert_eq!(env.store.model_count().await, 1);
    let grant = env.store.grant(id, "alice@example.com").await.unwrap();
    assert_eq!(grant.access_level, 5);
    let record = env.store.find_annotation(id).await.unwrap().unwrap();
    assert_eq!(record.category, None);
    assert!(record.part_tree.is_empty());

    assert_eq!(env.raw_identities(), vec![id.to_string()]);
    assert_eq!(env.working_identities(), vec![id.to_string()]);
}

#[tokio::test]
async fn test_identical_content_is_converted_once() {
    let counter_dir = tempfile::tempdir().unwrap();
    let counter = counter_dir.path().join("runs");
    let env = TestEnv::new(&counting_converter(&counter));
    let archive = chair_archive();

    let first = env
        .ingest
        .ingest(&RequestContext::new("alice"), &archive[..], "a.zip", None)
        .await
        .unwrap();
    let second = env
        .ingest
        .ingest(&RequestContext::new("bob"), &archive[..], "b.zip", None)
        .await
        .unwrap();

    assert!(first.is_created());
    assert!(matches!(second, IngestOutcome::Granted(_)));
    assert_eq!(first.identity(), second.identity());

    let id = first.identity().id;
    assert_eq!(env.store.model_count().await, 1);
    assert_eq!(env.store.grant_count(id).await, 2);
    assert_eq!(env.raw_identities().len(), 1);
    assert_eq!(std::fs::read_to_string(&counter).unwrap().lines().count(), 1);
}

#[tokio::test]
async fn test_same_user_uploading_twice() {
    let env = TestEnv::new(COPY_CONVERTER);
    let ctx = RequestContext::new("alice");
    let archive = chair_archive();

    let first = env
        .ingest
        .ingest(&ctx, &archive[..], "a.zip", None)
        .await
        .unwrap();
    let err = env
        .ingest
        .ingest(&ctx, &archive[..], "a.zip", None)
        .await
        .unwrap_err();

    assert!(
        matches!(err, IngestError::AlreadyUploadedByUser { model_id } if model_id == first.identity().id)
    );
    assert_eq!(env.store.grant_count(first.identity().id).await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_identical_uploads_convert_once() {
    let counter_dir = tempfile::tempdir().unwrap();
    let counter = counter_dir.path().join("runs");
    let script = format!("sleep 0.2; {}", counting_converter(&counter));
    let env = TestEnv::new(&script);
    let archive = chair_archive();

    let alice = RequestContext::new("alice");
    let bob = RequestContext::new("bob");
    let (a, b) = tokio::join!(
        env.ingest.ingest(&alice, &archive[..], "a.zip", None),
        env.ingest.ingest(&bob, &archive[..], "b.zip", None),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(a.identity(), b.identity());
    assert_eq!(
        [a.is_created(), b.is_created()]
            .iter()
            .filter(|c| **c)
            .count(),
        1
    );
    assert_eq!(env.store.model_count().await, 1);
    assert_eq!(std::fs::read_to_string(&counter).unwrap().lines().count(), 1);
}

/// Store that lets a rival process win the checksum race on the first
/// `create_model` call.
struct RacingStore {
    inner: Arc<MemoryModelStore>,
    raced: AtomicBool,
}

#[async_trait]
impl ModelStore for RacingStore {
    async fn find_by_checksum(&self, checksum: &str) -> AppResult<Option<ModelIdentity>> {
        self.inner.find_by_checksum(checksum).await
    }

    async fn find_model(&self, id: Uuid) -> AppResult<Option<ModelIdentity>> {
        self.inner.find_model(id).await
    }

    async fn has_grant(&self, model_id: Uuid, user_id: &str) -> AppResult<bool> {
        self.inner.has_grant(model_id, user_id).await
    }

    async fn grant_access(&self, grant: &AccessGrant) -> AppResult<bool> {
        self.inner.grant_access(grant).await
    }

    async fn create_model(&self, model: &NewModel) -> AppResult<()> {
        if !self.raced.swap(true, Ordering::SeqCst) {
            let rival = ModelIdentity::new(
                Uuid::new_v4(),
                model.identity.checksum.clone(),
                model.identity.source_file_name.clone(),
            );
            self.inner
                .create_model(&NewModel::for_upload(rival, "rival"))
                .await?;
        }
        self.inner.create_model(model).await
    }

    async fn find_annotation(&self, model_id: Uuid) -> AppResult<Option<AnnotationRecord>> {
        self.inner.find_annotation(model_id).await
    }

    async fn update_annotation(&self, record: &AnnotationRecord) -> AppResult<()> {
        self.inner.update_annotation(record).await
    }

    async fn touch_access(&self, model_id: Uuid, user_id: &str) -> AppResult<()> {
        self.inner.touch_access(model_id, user_id).await
    }

    async fn list_categories(&self) -> AppResult<Vec<ShapeCategory>> {
        self.inner.list_categories().await
    }

    async fn create_category(&self, name: &str) -> AppResult<ShapeCategory> {
        self.inner.create_category(name).await
    }

    async fn category_exists(&self, name: &str) -> AppResult<bool> {
        self.inner.category_exists(name).await
    }

    async fn list_models(&self, page: &PageRequest) -> AppResult<PageResponse<ModelIdentity>> {
        self.inner.list_models(page).await
    }

    async fn list_annotations(
        &self,
        filter: &AnnotationFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<AnnotationRecord>> {
        self.inner.list_annotations(filter, page).await
    }
}

#[tokio::test]
async fn test_checksum_race_falls_back_to_grant() {
    let memory = Arc::new(MemoryModelStore::new());
    let racing = Arc::new(RacingStore {
        inner: memory.clone(),
        raced: AtomicBool::new(false),
    });
    let env = TestEnv::with_store(COPY_CONVERTER, racing, memory);

    let outcome = env
        .ingest
        .ingest(&RequestContext::new("alice"), &chair_archive()[..], "a.zip", None)
        .await
        .unwrap();

    let IngestOutcome::Granted(identity) = outcome else {
        panic!("expected fallback to the rival identity");
    };
    assert_eq!(env.store.model_count().await, 1);
    assert!(env.store.grant(identity.id, "alice").await.is_some());
    assert!(env.store.grant(identity.id, "rival").await.is_some());
    // The loser's scratch directories are gone.
    assert!(env.raw_identities().is_empty());
    assert!(env.working_identities().is_empty());
}

#[tokio::test]
async fn test_zero_exit_without_output_creates_nothing() {
    let env = TestEnv::new(SILENT_CONVERTER);

    let err = env
        .ingest
        .ingest(&RequestContext::new("alice"), &chair_archive()[..], "a.zip", None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        IngestError::Conversion(ConversionError::ConversionProducedNoOutput { .. })
    ));
    assert_eq!(env.store.model_count().await, 0);
    assert!(env.raw_identities().is_empty());
    assert!(env.working_identities().is_empty());
}

#[tokio::test]
async fn test_failing_converter_names_stage() {
    let env = TestEnv::new(FAILING_CONVERTER);

    let err = env
        .ingest
        .ingest(&RequestContext::new("alice"), &chair_archive()[..], "a.zip", None)
        .await
        .unwrap_err();

    match err {
        IngestError::Conversion(ConversionError::PrimaryConversionFailed { stage, stderr, .. }) => {
            assert_eq!(stage, "primary");
            assert!(stderr.contains("unsupported mesh"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(env.store.model_count().await, 0);
    assert!(env.raw_identities().is_empty());
}

#[tokio::test]
async fn test_archive_without_model_file() {
    let env = TestEnv::new(COPY_CONVERTER);
    let archive = zip_bytes(&[("notes.txt", b"nothing here")]);

    let err = env
        .ingest
        .ingest(&RequestContext::new("alice"), &archive[..], "a.zip", None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        IngestError::Conversion(ConversionError::NoModelFileFound)
    ));
    assert!(env.raw_identities().is_empty());
}

#[tokio::test]
async fn test_archive_with_two_models() {
    let env = TestEnv::new(COPY_CONVERTER);
    let archive = zip_bytes(&[("a.obj", b"v 0 0 0"), ("b.OBJ", b"v 0 0 0")]);

    let err = env
        .ingest
        .ingest(&RequestContext::new("alice"), &archive[..], "a.zip", None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        IngestError::Conversion(ConversionError::AmbiguousModelFile { .. })
    ));
    assert_eq!(env.store.model_count().await, 0);
}

#[tokio::test]
async fn test_corrupt_upload() {
    let env = TestEnv::new(COPY_CONVERTER);

    let err = env
        .ingest
        .ingest(&RequestContext::new("alice"), &b"not a zip"[..], "a.zip", None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        IngestError::Conversion(ConversionError::CorruptArchive { .. })
    ));
    assert!(env.raw_identities().is_empty());
}

#[tokio::test]
async fn test_buffer_and_textures_are_mirrored() {
    let env = TestEnv::new(ASSET_CONVERTER);

    let outcome = env
        .ingest
        .ingest(&RequestContext::new("alice"), &chair_archive()[..], "a.zip", None)
        .await
        .unwrap();
    let id = outcome.identity().id;

    assert_eq!(
        std::fs::read_to_string(env.layout.working_buffer(id)).unwrap(),
        "bin"
    );
    assert!(
        env.layout
            .working_dir(id)
            .join("textures/wood.png")
            .is_file()
    );
    assert!(!env.layout.working_dir(id).join("original").exists());
}

#[tokio::test]
async fn test_cancelled_ingestion_leaves_nothing() {
    let env = TestEnv::new(&format!("sleep 5; {COPY_CONVERTER}"));
    let ctx = RequestContext::new("alice");
    ctx.cancel.cancel();

    let err = env
        .ingest
        .ingest(&ctx, &chair_archive()[..], "a.zip", None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        IngestError::Conversion(ConversionError::Cancelled)
    ));
    assert_eq!(env.store.model_count().await, 0);
    assert!(env.raw_identities().is_empty());
    assert!(env.working_identities().is_empty());
}
