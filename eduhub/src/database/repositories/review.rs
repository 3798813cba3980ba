//! Resource review repository.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::database::models::ReviewDbModel;
use crate::{Error, Result};

/// Review repository trait. Reviews are insert-only.
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn insert_review(&self, review: &ReviewDbModel) -> Result<()>;
    async fn get_review(&self, id: &str) -> Result<ReviewDbModel>;
    /// All reviews for a resource, newest first.
    async fn list_reviews_for_resource(&self, resource_id: &str) -> Result<Vec<ReviewDbModel>>;
}

/// SQLx implementation of ReviewRepository.
pub struct SqlxReviewRepository {
    pool: SqlitePool,
}

impl SqlxReviewRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReviewRepository for SqlxReviewRepository {
    async fn insert_review(&self, review: &ReviewDbModel) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO resource_reviews (
                id, resource_id, reviewer_id, reviewer_role, decision, summary, reviewed_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&review.id)
        .bind(&review.resource_id)
        .bind(&review.reviewer_id)
        .bind(&review.reviewer_role)
        .bind(&review.decision)
        .bind(&review.summary)
        .bind(&review.reviewed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_review(&self, id: &str) -> Result<ReviewDbModel> {
        sqlx::query_as::<_, ReviewDbModel>("SELECT * FROM resource_reviews WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::not_found("ResourceReview", id))
    }

    async fn list_reviews_for_resource(&self, resource_id: &str) -> Result<Vec<ReviewDbModel>> {
        let reviews = sqlx::query_as::<_, ReviewDbModel>(
            "SELECT * FROM resource_reviews WHERE resource_id = ? ORDER BY reviewed_at DESC, id",
        )
        .bind(resource_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(reviews)
    }
}
