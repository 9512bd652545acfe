//! Category catalog and model listings.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use modelhub_core::error::AppError;
use modelhub_core::types::{PageRequest, PageResponse};
use modelhub_database::ModelStore;
use modelhub_entity::annotation::{AnnotationFilter, AnnotationRecord};
use modelhub_entity::category::ShapeCategory;
use modelhub_entity::model::ModelIdentity;

/// Read-mostly queries over categories, identities and annotations.
#[derive(Clone)]
pub struct CatalogService {
    /// Persistence.
    store: Arc<dyn ModelStore>,
}

impl std::fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogService").finish_non_exhaustive()
    }
}

impl CatalogService {
    /// Creates a new catalog service.
    pub fn new(store: Arc<dyn ModelStore>) -> Self {
        Self { store }
    }

    /// All shape categories, by name.
    pub async fn list_categories(&self) -> Result<Vec<ShapeCategory>, AppError> {
        self.store.list_categories().await
    }

    /// Adds a shape category. The name is trimmed and must not be empty.
    pub async fn create_category(&self, name: &str) -> Result<ShapeCategory, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Category name must not be empty"));
        }
        let category = self.store.create_category(name).await?;
        info!(category = %category.name, "Category created");
        Ok(category)
    }

    /// Ingested identities, newest first.
    pub async fn list_models(
        &self,
        page: &PageRequest,
    ) -> Result<PageResponse<ModelIdentity>, AppError> {
        self.store.list_models(page).await
    }

    /// Annotation records matching `filter`, most recently updated first.
    pub async fn list_annotations(
        &self,
        filter: &AnnotationFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<AnnotationRecord>, AppError> {
        self.store.list_annotations(filter, page).await
    }

    /// One model's annotation record.
    pub async fn get_annotation(&self, model_id: Uuid) -> Result<AnnotationRecord, AppError> {
        self.store
            .find_annotation(model_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Model {model_id} not found")))
    }
}
