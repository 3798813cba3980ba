//! Publish overrides repository.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::database::models::PublishOverridesDbModel;
use crate::{Error, Result};

/// Publish overrides repository trait.
///
/// A lookup miss surfaces as [`Error::NotFound`]; the pipeline treats that as
/// "no overrides" rather than a failure.
#[async_trait]
pub trait PublishOverridesRepository: Send + Sync {
    async fn get_for_resource(&self, resource_id: &str) -> Result<PublishOverridesDbModel>;
    async fn upsert(&self, overrides: &PublishOverridesDbModel) -> Result<()>;
}

/// SQLx implementation of PublishOverridesRepository.
pub struct SqlxPublishOverridesRepository {
    pool: SqlitePool,
}

impl SqlxPublishOverridesRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PublishOverridesRepository for SqlxPublishOverridesRepository {
    async fn get_for_resource(&self, resource_id: &str) -> Result<PublishOverridesDbModel> {
        sqlx::query_as::<_, PublishOverridesDbModel>(
            "SELECT * FROM publish_overrides WHERE resource_id = ?",
        )
        .bind(resource_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::not_found("PublishOverrides", resource_id))
    }

    async fn upsert(&self, overrides: &PublishOverridesDbModel) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO publish_overrides (
                resource_id, title, description, tags, visibility,
                audience_restricted, category_code, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(resource_id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                tags = excluded.tags,
                visibility = excluded.visibility,
                audience_restricted = excluded.audience_restricted,
                category_code = excluded.category_code,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&overrides.resource_id)
        .bind(&overrides.title)
        .bind(&overrides.description)
        .bind(&overrides.tags)
        .bind(&overrides.visibility)
        .bind(overrides.audience_restricted)
        .bind(overrides.category_code)
        .bind(&overrides.created_at)
        .bind(&overrides.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
