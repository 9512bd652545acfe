//! The persistence seam used by ingestion, annotation and catalog services.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use modelhub_core::result::AppResult;
use modelhub_core::types::{PageRequest, PageResponse};
use modelhub_entity::annotation::{AnnotationFilter, AnnotationRecord};
use modelhub_entity::category::ShapeCategory;
use modelhub_entity::model::{AccessGrant, ModelIdentity, NewModel};

pub use memory::MemoryModelStore;
pub use postgres::PgModelStore;

/// Persistence for model identities, grants, annotations and categories.
///
/// Implementations report a uniqueness violation as
/// [`ErrorKind::Conflict`](modelhub_core::ErrorKind::Conflict) and use that
/// kind for nothing else.
#[async_trait]
pub trait ModelStore: Send + Sync + 'static {
    /// Look up an identity by upload checksum.
    async fn find_by_checksum(&self, checksum: &str) -> AppResult<Option<ModelIdentity>>;

    /// Look up an identity by id.
    async fn find_model(&self, id: Uuid) -> AppResult<Option<ModelIdentity>>;

    /// Whether `user_id` holds a grant on the model.
    async fn has_grant(&self, model_id: Uuid, user_id: &str) -> AppResult<bool>;

    /// Insert a grant. Returns `false` if the user already held one.
    async fn grant_access(&self, grant: &AccessGrant) -> AppResult<bool>;

    /// Persist a new identity, its first grant and its empty annotation
    /// record atomically. A duplicate checksum is a `Conflict`.
    async fn create_model(&self, model: &NewModel) -> AppResult<()>;

    /// Load the annotation record of a model.
    async fn find_annotation(&self, model_id: Uuid) -> AppResult<Option<AnnotationRecord>>;

    /// Replace the annotation record of a model. `NotFound` if absent.
    async fn update_annotation(&self, record: &AnnotationRecord) -> AppResult<()>;

    /// Refresh the access timestamp of a user's grant, if one exists.
    async fn touch_access(&self, model_id: Uuid, user_id: &str) -> AppResult<()>;

    /// All categories, by name.
    async fn list_categories(&self) -> AppResult<Vec<ShapeCategory>>;

    /// Add a category. A duplicate name is a `Conflict`.
    async fn create_category(&self, name: &str) -> AppResult<ShapeCategory>;

    /// Whether the named category exists.
    async fn category_exists(&self, name: &str) -> AppResult<bool>;

    /// Identities, newest first.
    async fn list_models(&self, page: &PageRequest) -> AppResult<PageResponse<ModelIdentity>>;

    /// Annotation records matching `filter`, most recently updated first.
    async fn list_annotations(
        &self,
        filter: &AnnotationFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<AnnotationRecord>>;
}
