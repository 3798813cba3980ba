//! Review workflow orchestration.
//!
//! Drives the status state machine from reviewer decisions and contributor
//! edits. The synchronous path ends at status persistence and history
//! recording; publication runs on a detached task and is never awaited here.

use std::sync::Arc;

use tracing::{error, warn};

use crate::database::models::{
    ResourceCategory, ResourceDbModel, ResourceStatus, ReviewDbModel, ReviewDecision,
};
use crate::database::repositories::{ResourceRepository, ReviewRepository};
use crate::publisher::{ResourceSnapshot, VideoPublisher};
use crate::workflow::history::StatusHistoryRecorder;
use crate::workflow::transition::{StatusEvent, next_status};
use crate::{Error, Result};

/// Input for recording a review decision.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub resource_id: String,
    pub reviewer_id: String,
    pub reviewer_role: String,
    pub decision: ReviewDecision,
    pub summary: Option<String>,
}

/// A contributor or administrative edit to a resource.
///
/// `None` fields are left untouched. A `status` value is an explicit
/// administrative override of the inferred transition rules.
#[derive(Debug, Clone, Default)]
pub struct ResourceEdit {
    pub title: Option<String>,
    pub category: Option<ResourceCategory>,
    pub summary: Option<String>,
    pub source_link: Option<String>,
    pub status: Option<ResourceStatus>,
    pub published_url: Option<String>,
    pub subjects: Option<Vec<String>>,
    pub grade_levels: Option<Vec<String>>,
}

/// Workflow orchestrator.
pub struct ReviewService {
    resources: Arc<dyn ResourceRepository>,
    reviews: Arc<dyn ReviewRepository>,
    history: StatusHistoryRecorder,
    publisher: Option<Arc<VideoPublisher>>,
}

impl ReviewService {
    pub fn new(
        resources: Arc<dyn ResourceRepository>,
        reviews: Arc<dyn ReviewRepository>,
        history: StatusHistoryRecorder,
        publisher: Option<Arc<VideoPublisher>>,
    ) -> Self {
        Self {
            resources,
            reviews,
            history,
            publisher,
        }
    }

    /// Record a reviewer decision and apply the resulting status transition.
    ///
    /// The review row is the durable outcome: once it is inserted the call
    /// succeeds, and a failure to update the resource status afterwards is
    /// logged rather than surfaced. Approval of a video resource additionally
    /// launches the publication pipeline on a detached task.
    pub async fn submit_review(&self, input: NewReview) -> Result<ReviewDbModel> {
        if input.resource_id.is_empty() {
            return Err(Error::validation("resource_id must be provided"));
        }
        if input.reviewer_id.is_empty() {
            return Err(Error::validation("reviewer_id must be provided"));
        }

        let review = ReviewDbModel::new(
            &input.resource_id,
            &input.reviewer_id,
            &input.reviewer_role,
            input.decision,
            input.summary,
        );
        self.reviews.insert_review(&review).await?;

        self.apply_review_decision(&review, input.decision).await;

        Ok(review)
    }

    async fn apply_review_decision(&self, review: &ReviewDbModel, decision: ReviewDecision) {
        let mut resource = match self.resources.get_resource(&review.resource_id).await {
            Ok(resource) => resource,
            Err(error) => {
                warn!(
                    resource_id = %review.resource_id,
                    error = %error,
                    "could not load resource for status transition"
                );
                return;
            }
        };

        let Some(current) = resource.parsed_status() else {
            warn!(
                resource_id = %resource.id,
                status = %resource.status,
                "resource has an unknown status, skipping transition"
            );
            return;
        };

        let new_status = next_status(current, StatusEvent::ReviewDecided(decision));
        if new_status == current {
            return;
        }

        let old_status = resource.status.clone();
        resource.status = new_status.as_str().to_string();

        if let Err(error) = self.resources.update_resource(&resource).await {
            error!(
                resource_id = %resource.id,
                decision = %decision,
                error = %error,
                "failed to update resource status after review decision"
            );
            return;
        }

        self.history
            .record(
                &resource.id,
                &old_status,
                &resource.status,
                &review.reviewer_id,
            )
            .await;

        if decision == ReviewDecision::Approved
            && resource.parsed_category() == Some(ResourceCategory::Video)
        {
            self.launch_publish(&resource).await;
        }
    }

    async fn launch_publish(&self, resource: &ResourceDbModel) {
        let Some(publisher) = &self.publisher else {
            warn!(
                resource_id = %resource.id,
                "video approved but publisher is not configured, skipping upload"
            );
            return;
        };

        // Snapshot the fields the pipeline needs before handing off; the
        // live row is not read again until reconciliation.
        let subjects = match self.resources.get_subjects(&resource.id).await {
            Ok(subjects) => subjects,
            Err(error) => {
                warn!(
                    resource_id = %resource.id,
                    error = %error,
                    "could not load subjects for publish snapshot"
                );
                Vec::new()
            }
        };

        publisher.spawn_publish(ResourceSnapshot::capture(resource, subjects));
    }

    /// Apply an edit to a resource and run the status transition rules.
    ///
    /// When the edit does not set a status explicitly, a save on a
    /// NeedsRevision resource auto-advances it to UnderReview so reviewers
    /// see the updated content.
    pub async fn apply_edit(
        &self,
        resource_id: &str,
        edit: ResourceEdit,
        actor_id: &str,
    ) -> Result<ResourceDbModel> {
        let mut resource = self.resources.get_resource(resource_id).await?;
        let old_status = resource.status.clone();
        let current = resource.parsed_status().ok_or_else(|| {
            Error::validation(format!(
                "resource {resource_id} has an unknown status {}",
                resource.status
            ))
        })?;

        if let Some(title) = edit.title {
            resource.title = title;
        }
        if let Some(category) = edit.category {
            resource.category = category.as_str().to_string();
        }
        if let Some(summary) = edit.summary {
            resource.summary = Some(summary);
        }
        if let Some(source_link) = edit.source_link {
            resource.source_link = Some(source_link);
        }
        if let Some(published_url) = edit.published_url {
            resource.published_url = Some(published_url);
        }

        let event = match edit.status {
            Some(status) => StatusEvent::ExplicitStatus(status),
            None => StatusEvent::ContributorEdited,
        };
        resource.status = next_status(current, event).as_str().to_string();

        if resource.title.is_empty() {
            return Err(Error::validation("title must be provided"));
        }

        self.resources.update_resource(&resource).await?;

        if old_status != resource.status {
            self.history
                .record(&resource.id, &old_status, &resource.status, actor_id)
                .await;
        }

        if let Some(subjects) = &edit.subjects {
            self.resources.set_subjects(&resource.id, subjects).await?;
        }
        if let Some(grade_levels) = &edit.grade_levels {
            self.resources
                .set_grade_levels(&resource.id, grade_levels)
                .await?;
        }

        Ok(resource)
    }
}
