//! Status history recording.

use std::sync::Arc;

use tracing::warn;

use crate::database::models::StatusHistoryDbModel;
use crate::database::repositories::StatusHistoryRepository;

/// Appends audit entries for persisted status transitions.
///
/// Recording is best-effort: an append failure is logged and swallowed so it
/// never aborts the status update that triggered it.
#[derive(Clone)]
pub struct StatusHistoryRecorder {
    repository: Arc<dyn StatusHistoryRepository>,
}

impl StatusHistoryRecorder {
    pub fn new(repository: Arc<dyn StatusHistoryRepository>) -> Self {
        Self { repository }
    }

    /// Append one entry for an observed transition.
    ///
    /// Does nothing when the status did not actually change.
    pub async fn record(
        &self,
        resource_id: &str,
        old_status: &str,
        new_status: &str,
        actor_id: &str,
    ) {
        if old_status == new_status {
            return;
        }

        let entry = StatusHistoryDbModel::new(resource_id, old_status, new_status, actor_id);
        if let Err(error) = self.repository.append_entry(&entry).await {
            warn!(
                resource_id,
                old_status,
                new_status,
                error = %error,
                "failed to record status transition"
            );
        }
    }
}
