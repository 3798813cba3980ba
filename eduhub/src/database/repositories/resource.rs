//! Resource repository.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::database::models::ResourceDbModel;
use crate::{Error, Result};

/// Resource repository trait.
#[async_trait]
pub trait ResourceRepository: Send + Sync {
    async fn get_resource(&self, id: &str) -> Result<ResourceDbModel>;
    async fn list_resources(&self) -> Result<Vec<ResourceDbModel>>;
    async fn list_resources_by_status(&self, status: &str) -> Result<Vec<ResourceDbModel>>;
    async fn create_resource(&self, resource: &ResourceDbModel) -> Result<()>;
    /// Full-row update of the mutable columns; bumps `updated_at`.
    async fn update_resource(&self, resource: &ResourceDbModel) -> Result<()>;
    async fn delete_resource(&self, id: &str) -> Result<()>;

    async fn get_subjects(&self, resource_id: &str) -> Result<Vec<String>>;
    async fn set_subjects(&self, resource_id: &str, subjects: &[String]) -> Result<()>;
    async fn get_grade_levels(&self, resource_id: &str) -> Result<Vec<String>>;
    async fn set_grade_levels(&self, resource_id: &str, grade_levels: &[String]) -> Result<()>;
}

/// SQLx implementation of ResourceRepository.
pub struct SqlxResourceRepository {
    pool: SqlitePool,
}

impl SqlxResourceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResourceRepository for SqlxResourceRepository {
    async fn get_resource(&self, id: &str) -> Result<ResourceDbModel> {
        sqlx::query_as::<_, ResourceDbModel>("SELECT * FROM resources WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::not_found("Resource", id))
    }

    async fn list_resources(&self) -> Result<Vec<ResourceDbModel>> {
        let resources = sqlx::query_as::<_, ResourceDbModel>(
            "SELECT * FROM resources ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(resources)
    }

    async fn list_resources_by_status(&self, status: &str) -> Result<Vec<ResourceDbModel>> {
        let resources = sqlx::query_as::<_, ResourceDbModel>(
            "SELECT * FROM resources WHERE status = ? ORDER BY created_at DESC",
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(resources)
    }

    async fn create_resource(&self, resource: &ResourceDbModel) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO resources (
                id, title, category, summary, source_link, status,
                published_url, contributor_id, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&resource.id)
        .bind(&resource.title)
        .bind(&resource.category)
        .bind(&resource.summary)
        .bind(&resource.source_link)
        .bind(&resource.status)
        .bind(&resource.published_url)
        .bind(&resource.contributor_id)
        .bind(&resource.created_at)
        .bind(&resource.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_resource(&self, resource: &ResourceDbModel) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE resources
            SET title = ?, category = ?, summary = ?, source_link = ?,
                status = ?, published_url = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&resource.title)
        .bind(&resource.category)
        .bind(&resource.summary)
        .bind(&resource.source_link)
        .bind(&resource.status)
        .bind(&resource.published_url)
        .bind(chrono::Utc::now().to_rfc3339())
        .bind(&resource.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("Resource", &resource.id));
        }
        Ok(())
    }

    async fn delete_resource(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM resources WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("Resource", id));
        }
        Ok(())
    }

    async fn get_subjects(&self, resource_id: &str) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT subject FROM resource_subjects WHERE resource_id = ? ORDER BY subject",
        )
        .bind(resource_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(s,)| s).collect())
    }

    async fn set_subjects(&self, resource_id: &str, subjects: &[String]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM resource_subjects WHERE resource_id = ?")
            .bind(resource_id)
            .execute(&mut *tx)
            .await?;

        for subject in subjects {
            sqlx::query("INSERT INTO resource_subjects (resource_id, subject) VALUES (?, ?)")
                .bind(resource_id)
                .bind(subject)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_grade_levels(&self, resource_id: &str) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT grade_level FROM resource_grade_levels WHERE resource_id = ? ORDER BY grade_level",
        )
        .bind(resource_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(g,)| g).collect())
    }

    async fn set_grade_levels(&self, resource_id: &str, grade_levels: &[String]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM resource_grade_levels WHERE resource_id = ?")
            .bind(resource_id)
            .execute(&mut *tx)
            .await?;

        for grade_level in grade_levels {
            sqlx::query(
                "INSERT INTO resource_grade_levels (resource_id, grade_level) VALUES (?, ?)",
            )
            .bind(resource_id)
            .bind(grade_level)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
