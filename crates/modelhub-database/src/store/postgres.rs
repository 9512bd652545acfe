//! PostgreSQL model store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use modelhub_core::error::{AppError, ErrorKind};
use modelhub_core::result::AppResult;
use modelhub_core::types::{PageRequest, PageResponse};
use modelhub_entity::annotation::{
    AnnotationFilter, AnnotationFlags, AnnotationRecord, CategoryFilter, MotionNode, PartNode,
};
use modelhub_entity::category::ShapeCategory;
use modelhub_entity::model::{AccessGrant, ModelIdentity, NewModel};

use super::ModelStore;

/// [`ModelStore`] backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgModelStore {
    pool: PgPool,
}

impl PgModelStore {
    /// Create a store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AnnotationRow {
    model_id: Uuid,
    category: Option<String>,
    shape_annotated: bool,
    part_annotated: bool,
    mobility_annotated: bool,
    part_tree: Json<Vec<PartNode>>,
    motion_tree: Json<Vec<MotionNode>>,
    annotator_id: Option<String>,
    updated_at: DateTime<Utc>,
}

impl From<AnnotationRow> for AnnotationRecord {
    fn from(row: AnnotationRow) -> Self {
        Self {
            model_id: row.model_id,
            category: row.category,
            flags: AnnotationFlags {
                shape_annotated: row.shape_annotated,
                part_annotated: row.part_annotated,
                mobility_annotated: row.mobility_annotated,
            },
            part_tree: row.part_tree.0,
            motion_tree: row.motion_tree.0,
            annotator_id: row.annotator_id,
            updated_at: row.updated_at,
        }
    }
}

/// Map a sqlx error, turning unique violations into `Conflict`.
fn map_write_error(e: sqlx::Error, context: &str) -> AppError {
    let unique = matches!(&e, sqlx::Error::Database(db) if db.is_unique_violation());
    if unique {
        AppError::with_source(ErrorKind::Conflict, format!("{context}: already exists"), e)
    } else {
        AppError::with_source(ErrorKind::Database, context.to_string(), e)
    }
}

fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::with_source(ErrorKind::Database, context, e)
}

/// Nullable bind values for the annotation listing filter.
fn filter_binds(filter: &AnnotationFilter) -> (Option<bool>, Option<bool>, Option<bool>, Option<String>, bool) {
    let (named, uncategorized) = match &filter.category {
        CategoryFilter::All => (None, false),
        CategoryFilter::Uncategorized => (None, true),
        CategoryFilter::Named(name) => (Some(name.clone()), false),
    };
    (
        filter.shape_annotated.required(),
        filter.part_annotated.required(),
        filter.mobility_annotated.required(),
        named,
        uncategorized,
    )
}

const ANNOTATION_WHERE: &str = "WHERE ($1::boolean IS NULL OR shape_annotated = $1) \
     AND ($2::boolean IS NULL OR part_annotated = $2) \
     AND ($3::boolean IS NULL OR mobility_annotated = $3) \
     AND ($4::text IS NULL OR category = $4) \
     AND (NOT $5 OR category IS NULL)";

#[async_trait]
impl ModelStore for PgModelStore {
    async fn find_by_checksum(&self, checksum: &str) -> AppResult<Option<ModelIdentity>> {
        sqlx::query_as::<_, ModelIdentity>("SELECT * FROM raw_models WHERE checksum = $1")
            .bind(checksum)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find model by checksum"))
    }

    async fn find_model(&self, id: Uuid) -> AppResult<Option<ModelIdentity>> {
        sqlx::query_as::<_, ModelIdentity>("SELECT * FROM raw_models WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find model"))
    }

    async fn has_grant(&self, model_id: Uuid, user_id: &str) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM model_access WHERE model_id = $1 AND user_id = $2)",
        )
        .bind(model_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to check model access"))
    }

    async fn grant_access(&self, grant: &AccessGrant) -> AppResult<bool> {
        let result = sqlx::query(
            "INSERT INTO model_access (model_id, user_id, access_level, created_at, accessed_at) \
             VALUES ($1, $2, $3, $4, $5) ON CONFLICT (model_id, user_id) DO NOTHING",
        )
        .bind(grant.model_id)
        .bind(&grant.user_id)
        .bind(grant.access_level)
        .bind(grant.created_at)
        .bind(grant.accessed_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to grant model access"))?;
        Ok(result.rows_affected() == 1)
    }

    async fn create_model(&self, model: &NewModel) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let identity = &model.identity;
        sqlx::query(
            "INSERT INTO raw_models (id, checksum, source_file_name, created_at) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(identity.id)
        .bind(&identity.checksum)
        .bind(&identity.source_file_name)
        .bind(identity.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "Failed to insert model"))?;

        let grant = &model.grant;
        sqlx::query(
            "INSERT INTO model_access (model_id, user_id, access_level, created_at, accessed_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(grant.model_id)
        .bind(&grant.user_id)
        .bind(grant.access_level)
        .bind(grant.created_at)
        .bind(grant.accessed_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "Failed to insert model access"))?;

        let record = &model.annotation;
        sqlx::query(
            "INSERT INTO model_annotations (model_id, category, shape_annotated, part_annotated, \
             mobility_annotated, part_tree, motion_tree, annotator_id, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(record.model_id)
        .bind(&record.category)
        .bind(record.flags.shape_annotated)
        .bind(record.flags.part_annotated)
        .bind(record.flags.mobility_annotated)
        .bind(Json(&record.part_tree))
        .bind(Json(&record.motion_tree))
        .bind(&record.annotator_id)
        .bind(record.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "Failed to insert annotation record"))?;

        tx.commit()
            .await
            .map_err(|e| map_write_error(e, "Failed to commit model"))
    }

    async fn find_annotation(&self, model_id: Uuid) -> AppResult<Option<AnnotationRecord>> {
        let row = sqlx::query_as::<_, AnnotationRow>(
            "SELECT * FROM model_annotations WHERE model_id = $1",
        )
        .bind(model_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to find annotation"))?;
        Ok(row.map(AnnotationRecord::from))
    }

    async fn update_annotation(&self, record: &AnnotationRecord) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE model_annotations SET category = $2, shape_annotated = $3, \
             part_annotated = $4, mobility_annotated = $5, part_tree = $6, motion_tree = $7, \
             annotator_id = $8, updated_at = $9 WHERE model_id = $1",
        )
        .bind(record.model_id)
        .bind(&record.category)
        .bind(record.flags.shape_annotated)
        .bind(record.flags.part_annotated)
        .bind(record.flags.mobility_annotated)
        .bind(Json(&record.part_tree))
        .bind(Json(&record.motion_tree))
        .bind(&record.annotator_id)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to update annotation"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!(
                "Model {} not found",
                record.model_id
            )));
        }
        Ok(())
    }

    async fn touch_access(&self, model_id: Uuid, user_id: &str) -> AppResult<()> {
        sqlx::query(
            "UPDATE model_access SET accessed_at = NOW() WHERE model_id = $1 AND user_id = $2",
        )
        .bind(model_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to update access time"))?;
        Ok(())
    }

    async fn list_categories(&self) -> AppResult<Vec<ShapeCategory>> {
        sqlx::query_as::<_, ShapeCategory>("SELECT * FROM shape_categories ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list categories"))
    }

    async fn create_category(&self, name: &str) -> AppResult<ShapeCategory> {
        sqlx::query_as::<_, ShapeCategory>(
            "INSERT INTO shape_categories (name) VALUES ($1) RETURNING *",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Failed to create category"))
    }

    async fn category_exists(&self, name: &str) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM shape_categories WHERE name = $1)")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to check category"))
    }

    async fn list_models(&self, page: &PageRequest) -> AppResult<PageResponse<ModelIdentity>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM raw_models")
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to count models"))?;

        let models = sqlx::query_as::<_, ModelIdentity>(
            "SELECT * FROM raw_models ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(page.sql_limit())
        .bind(page.sql_offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list models"))?;

        Ok(PageResponse::new(models, page, total as u64))
    }

    async fn list_annotations(
        &self,
        filter: &AnnotationFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<AnnotationRecord>> {
        let (shape, part, mobility, named, uncategorized) = filter_binds(filter);

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM model_annotations {ANNOTATION_WHERE}"))
                .bind(shape)
                .bind(part)
                .bind(mobility)
                .bind(&named)
                .bind(uncategorized)
                .fetch_one(&self.pool)
                .await
                .map_err(db_error("Failed to count annotations"))?;

        let rows = sqlx::query_as::<_, AnnotationRow>(&format!(
            "SELECT * FROM model_annotations {ANNOTATION_WHERE} \
             ORDER BY updated_at DESC LIMIT $6 OFFSET $7"
        ))
        .bind(shape)
        .bind(part)
        .bind(mobility)
        .bind(&named)
        .bind(uncategorized)
        .bind(page.sql_limit())
        .bind(page.sql_offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list annotations"))?;

        let records = rows.into_iter().map(AnnotationRecord::from).collect();
        Ok(PageResponse::new(records, page, total as u64))
    }
}
