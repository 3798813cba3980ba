//! Status history repository.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::Result;
use crate::database::models::StatusHistoryDbModel;

/// Status history repository trait. Append-only audit log.
#[async_trait]
pub trait StatusHistoryRepository: Send + Sync {
    async fn append_entry(&self, entry: &StatusHistoryDbModel) -> Result<()>;
    /// Entries for a resource in transition order.
    async fn list_for_resource(&self, resource_id: &str) -> Result<Vec<StatusHistoryDbModel>>;
}

/// SQLx implementation of StatusHistoryRepository.
pub struct SqlxStatusHistoryRepository {
    pool: SqlitePool,
}

impl SqlxStatusHistoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatusHistoryRepository for SqlxStatusHistoryRepository {
    async fn append_entry(&self, entry: &StatusHistoryDbModel) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO resource_status_history (
                id, resource_id, old_status, new_status, actor_id, changed_at
            ) VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.resource_id)
        .bind(&entry.old_status)
        .bind(&entry.new_status)
        .bind(&entry.actor_id)
        .bind(&entry.changed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_for_resource(&self, resource_id: &str) -> Result<Vec<StatusHistoryDbModel>> {
        let entries = sqlx::query_as::<_, StatusHistoryDbModel>(
            "SELECT * FROM resource_status_history WHERE resource_id = ? ORDER BY changed_at, id",
        )
        .bind(resource_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }
}
