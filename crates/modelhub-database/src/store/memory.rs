//! In-memory model store for single-process tooling and tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use modelhub_core::error::AppError;
use modelhub_core::result::AppResult;
use modelhub_core::types::{PageRequest, PageResponse};
use modelhub_entity::annotation::{AnnotationFilter, AnnotationRecord};
use modelhub_entity::category::ShapeCategory;
use modelhub_entity::model::{AccessGrant, ModelIdentity, NewModel};

use super::ModelStore;

#[derive(Debug, Default)]
struct InnerState {
    models: HashMap<Uuid, ModelIdentity>,
    by_checksum: HashMap<String, Uuid>,
    grants: HashMap<(Uuid, String), AccessGrant>,
    annotations: HashMap<Uuid, AnnotationRecord>,
    categories: BTreeMap<String, ShapeCategory>,
}

/// [`ModelStore`] holding everything behind one Tokio mutex.
///
/// Enforces the same uniqueness rules as the PostgreSQL schema.
#[derive(Debug, Clone, Default)]
pub struct MemoryModelStore {
    state: Arc<Mutex<InnerState>>,
}

impl MemoryModelStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of identities stored.
    pub async fn model_count(&self) -> usize {
        self.state.lock().await.models.len()
    }

    /// Number of grants stored for a model.
    pub async fn grant_count(&self, model_id: Uuid) -> usize {
        self.state
            .lock()
            .await
            .grants
            .keys()
            .filter(|(id, _)| *id == model_id)
            .count()
    }

    /// Fetch a grant.
    pub async fn grant(&self, model_id: Uuid, user_id: &str) -> Option<AccessGrant> {
        self.state
            .lock()
            .await
            .grants
            .get(&(model_id, user_id.to_string()))
            .cloned()
    }
}

fn page_of<T: serde::Serialize>(mut items: Vec<T>, page: &PageRequest) -> PageResponse<T> {
    let total = items.len() as u64;
    let start = (page.offset as usize).min(items.len());
    let end = start.saturating_add(page.limit as usize).min(items.len());
    let window: Vec<T> = items.drain(start..end).collect();
    PageResponse::new(window, page, total)
}

#[async_trait]
impl ModelStore for MemoryModelStore {
    async fn find_by_checksum(&self, checksum: &str) -> AppResult<Option<ModelIdentity>> {
        let state = self.state.lock().await;
        Ok(state
            .by_checksum
            .get(checksum)
            .and_then(|id| state.models.get(id))
            .cloned())
    }

    async fn find_model(&self, id: Uuid) -> AppResult<Option<ModelIdentity>> {
        Ok(self.state.lock().await.models.get(&id).cloned())
    }

    async fn has_grant(&self, model_id: Uuid, user_id: &str) -> AppResult<bool> {
        Ok(self
            .state
            .lock()
            .await
            .grants
            .contains_key(&(model_id, user_id.to_string())))
    }

    async fn grant_access(&self, grant: &AccessGrant) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        if !state.models.contains_key(&grant.model_id) {
            return Err(AppError::database(format!(
                "Model {} does not exist",
                grant.model_id
            )));
        }
        let key = (grant.model_id, grant.user_id.clone());
        if state.grants.contains_key(&key) {
            return Ok(false);
        }
        state.grants.insert(key, grant.clone());
        Ok(true)
    }

    async fn create_model(&self, model: &NewModel) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let identity = &model.identity;
        if state.by_checksum.contains_key(&identity.checksum) {
            return Err(AppError::conflict(format!(
                "Model with checksum {} already exists",
                identity.checksum
            )));
        }
        if state.models.contains_key(&identity.id) {
            return Err(AppError::conflict(format!("Model {} already exists", identity.id)));
        }

        state
            .by_checksum
            .insert(identity.checksum.clone(), identity.id);
        state.models.insert(identity.id, identity.clone());
        state.grants.insert(
            (model.grant.model_id, model.grant.user_id.clone()),
            model.grant.clone(),
        );
        state
            .annotations
            .insert(model.annotation.model_id, model.annotation.clone());
        Ok(())
    }

    async fn find_annotation(&self, model_id: Uuid) -> AppResult<Option<AnnotationRecord>> {
        Ok(self.state.lock().await.annotations.get(&model_id).cloned())
    }

    async fn update_annotation(&self, record: &AnnotationRecord) -> AppResult<()> {
        let mut state = self.state.lock().await;
        match state.annotations.get_mut(&record.model_id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(AppError::not_found(format!(
                "Model {} not found",
                record.model_id
            ))),
        }
    }

    async fn touch_access(&self, model_id: Uuid, user_id: &str) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if let Some(grant) = state.grants.get_mut(&(model_id, user_id.to_string())) {
            grant.accessed_at = Utc::now();
        }
        Ok(())
    }

    async fn list_categories(&self) -> AppResult<Vec<ShapeCategory>> {
        Ok(self.state.lock().await.categories.values().cloned().collect())
    }

    async fn create_category(&self, name: &str) -> AppResult<ShapeCategory> {
        let mut state = self.state.lock().await;
        if state.categories.contains_key(name) {
            return Err(AppError::conflict(format!("Category '{name}' already exists")));
        }
        let category = ShapeCategory {
            name: name.to_string(),
            created_at: Utc::now(),
        };
        state.categories.insert(name.to_string(), category.clone());
        Ok(category)
    }

    async fn category_exists(&self, name: &str) -> AppResult<bool> {
        Ok(self.state.lock().await.categories.contains_key(name))
    }

    async fn list_models(&self, page: &PageRequest) -> AppResult<PageResponse<ModelIdentity>> {
        let state = self.state.lock().await;
        let mut models: Vec<ModelIdentity> = state.models.values().cloned().collect();
        models.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page_of(models, page))
    }

    async fn list_annotations(
        &self,
        filter: &AnnotationFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<AnnotationRecord>> {
        let state = self.state.lock().await;
        let mut records: Vec<AnnotationRecord> = state
            .annotations
            .values()
            .filter(|r| {
                filter.matches(
                    r.category.as_deref(),
                    r.flags.shape_annotated,
                    r.flags.part_annotated,
                    r.flags.mobility_annotated,
                )
            })
            .cloned()
            .collect();
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(page_of(records, page))
    }
}
