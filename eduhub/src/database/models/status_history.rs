//! Status history database model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One observed status transition. Append-only; never updated or deleted.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct StatusHistoryDbModel {
    pub id: String,
    pub resource_id: String,
    pub old_status: String,
    pub new_status: String,
    /// User who caused the transition.
    pub actor_id: String,
    /// ISO 8601 timestamp of the transition
    pub changed_at: String,
}

impl StatusHistoryDbModel {
    pub fn new(
        resource_id: impl Into<String>,
        old_status: impl Into<String>,
        new_status: impl Into<String>,
        actor_id: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            resource_id: resource_id.into(),
            old_status: old_status.into(),
            new_status: new_status.into(),
            actor_id: actor_id.into(),
            changed_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
