//! Integration tests for the review workflow engine.
//!
//! A real in-memory SQLite database backs the repositories; no publisher is
//! configured here, so approvals stop at the Approved status exactly as they
//! do when the upload capability is absent.

use std::sync::Arc;

use async_trait::async_trait;

use eduhub::database::models::{
    ResourceCategory, ResourceDbModel, ResourceStatus, ReviewDecision, StatusHistoryDbModel,
};
use eduhub::database::repositories::{
    ResourceRepository, SqlxResourceRepository, SqlxReviewRepository, SqlxStatusHistoryRepository,
    StatusHistoryRepository,
};
use eduhub::database::{DbPool, init_pool_with_size, run_migrations};
use eduhub::workflow::{NewReview, ResourceEdit, ReviewService, StatusHistoryRecorder};
use eduhub::{Error, Result};

async fn setup_test_db() -> DbPool {
    let pool = init_pool_with_size("sqlite::memory:", 1)
        .await
        .expect("Failed to create test pool");

    run_migrations(&pool).await.expect("Failed to run migrations");

    pool
}

struct TestHarness {
    resources: Arc<dyn ResourceRepository>,
    history: Arc<dyn StatusHistoryRepository>,
    service: ReviewService,
}

fn harness(pool: DbPool) -> TestHarness {
    let resources: Arc<dyn ResourceRepository> = Arc::new(SqlxResourceRepository::new(pool.clone()));
    let history: Arc<dyn StatusHistoryRepository> =
        Arc::new(SqlxStatusHistoryRepository::new(pool.clone()));
    let service = ReviewService::new(
        resources.clone(),
        Arc::new(SqlxReviewRepository::new(pool)),
        StatusHistoryRecorder::new(history.clone()),
        None,
    );
    TestHarness {
        resources,
        history,
        service,
    }
}

async fn create_resource(
    resources: &Arc<dyn ResourceRepository>,
    category: ResourceCategory,
    status: ResourceStatus,
) -> ResourceDbModel {
    let mut resource = ResourceDbModel::new(
        "Photosynthesis Explained",
        category,
        Some("How plants turn light into sugar.".to_string()),
        Some("https://files.example.com/file/d/abc123/view".to_string()),
        "contrib-1",
    );
    resource.status = status.as_str().to_string();
    resources.create_resource(&resource).await.expect("create resource");
    resource
}

fn review(resource_id: &str, decision: ReviewDecision) -> NewReview {
    NewReview {
        resource_id: resource_id.to_string(),
        reviewer_id: "rev-1".to_string(),
        reviewer_role: "Reviewer".to_string(),
        decision,
        summary: None,
    }
}

#[tokio::test]
async fn approval_moves_resource_to_approved_and_records_history() {
    let h = harness(setup_test_db().await);
    let resource =
        create_resource(&h.resources, ResourceCategory::LessonPlan, ResourceStatus::UnderReview)
            .await;

    let inserted = h
        .service
        .submit_review(review(&resource.id, ReviewDecision::Approved))
        .await
        .expect("submit review");
    assert_eq!(inserted.decision, "Approved");

    let updated = h.resources.get_resource(&resource.id).await.expect("get");
    assert_eq!(updated.status, "Approved");

    let entries = h.history.list_for_resource(&resource.id).await.expect("history");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].old_status, "UnderReview");
    assert_eq!(entries[0].new_status, "Approved");
    assert_eq!(entries[0].actor_id, "rev-1");
}

#[tokio::test]
async fn rejection_then_edit_resurfaces_for_review() {
    let h = harness(setup_test_db().await);
    let resource =
        create_resource(&h.resources, ResourceCategory::Video, ResourceStatus::UnderReview).await;

    h.service
        .submit_review(review(&resource.id, ReviewDecision::Rejected))
        .await
        .expect("submit review");

    let rejected = h.resources.get_resource(&resource.id).await.expect("get");
    assert_eq!(rejected.status, "NeedsRevision");

    // A contributor save with no explicit status moves it back under review.
    let edited = h
        .service
        .apply_edit(
            &resource.id,
            ResourceEdit {
                summary: Some("How plants turn light into sugar, with narration.".to_string()),
                ..Default::default()
            },
            "contrib-1",
        )
        .await
        .expect("apply edit");
    assert_eq!(edited.status, "UnderReview");

    let entries = h.history.list_for_resource(&resource.id).await.expect("history");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].old_status, "NeedsRevision");
    assert_eq!(entries[1].new_status, "UnderReview");
    assert_eq!(entries[1].actor_id, "contrib-1");
}

#[tokio::test]
async fn explicit_status_in_edit_overrides_inference() {
    let h = harness(setup_test_db().await);
    let resource =
        create_resource(&h.resources, ResourceCategory::Worksheet, ResourceStatus::NeedsRevision)
            .await;

    let edited = h
        .service
        .apply_edit(
            &resource.id,
            ResourceEdit {
                status: Some(ResourceStatus::Submitted),
                ..Default::default()
            },
            "admin-1",
        )
        .await
        .expect("apply edit");

    // Without the explicit status this edit would have gone to UnderReview.
    assert_eq!(edited.status, "Submitted");
}

#[tokio::test]
async fn repeat_decision_does_not_duplicate_history() {
    let h = harness(setup_test_db().await);
    let resource =
        create_resource(&h.resources, ResourceCategory::LessonPlan, ResourceStatus::UnderReview)
            .await;

    h.service
        .submit_review(review(&resource.id, ReviewDecision::Approved))
        .await
        .expect("first review");
    h.service
        .submit_review(review(&resource.id, ReviewDecision::Approved))
        .await
        .expect("second review");

    // Status was already Approved on the second decision; no new entry.
    let entries = h.history.list_for_resource(&resource.id).await.expect("history");
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn edit_preserves_unrelated_fields_and_replaces_subjects() {
    let h = harness(setup_test_db().await);
    let resource =
        create_resource(&h.resources, ResourceCategory::Video, ResourceStatus::Submitted).await;
    h.resources
        .set_subjects(&resource.id, &["Biology".to_string()])
        .await
        .expect("seed subjects");

    let edited = h
        .service
        .apply_edit(
            &resource.id,
            ResourceEdit {
                title: Some("Photosynthesis, Revised".to_string()),
                subjects: Some(vec!["Biology".to_string(), "Chemistry".to_string()]),
                ..Default::default()
            },
            "contrib-1",
        )
        .await
        .expect("apply edit");

    assert_eq!(edited.title, "Photosynthesis, Revised");
    // Untouched fields survive.
    assert_eq!(edited.summary.as_deref(), Some("How plants turn light into sugar."));
    assert_eq!(edited.status, "Submitted");

    let subjects = h.resources.get_subjects(&resource.id).await.expect("subjects");
    assert_eq!(subjects, vec!["Biology", "Chemistry"]);
}

#[tokio::test]
async fn review_of_missing_resource_fails() {
    let h = harness(setup_test_db().await);

    let err = h
        .service
        .submit_review(review("ghost", ReviewDecision::Approved))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DatabaseSqlx(_)));
}

#[tokio::test]
async fn empty_identifiers_fail_validation() {
    let h = harness(setup_test_db().await);

    let err = h
        .service
        .submit_review(review("", ReviewDecision::Approved))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let mut input = review("res-1", ReviewDecision::Approved);
    input.reviewer_id = String::new();
    let err = h.service.submit_review(input).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn video_approval_without_publisher_still_completes() {
    let h = harness(setup_test_db().await);
    let resource =
        create_resource(&h.resources, ResourceCategory::Video, ResourceStatus::UnderReview).await;

    // No publisher is configured; the approval path must still succeed and
    // simply stop at Approved.
    h.service
        .submit_review(review(&resource.id, ReviewDecision::Approved))
        .await
        .expect("submit review");

    let updated = h.resources.get_resource(&resource.id).await.expect("get");
    assert_eq!(updated.status, "Approved");
    assert!(updated.published_url.is_none());
}

/// History repository that always fails, to prove recording is best-effort.
struct FailingHistoryRepository;

#[async_trait]
impl StatusHistoryRepository for FailingHistoryRepository {
    async fn append_entry(&self, _entry: &StatusHistoryDbModel) -> Result<()> {
        Err(Error::Other("history table unavailable".to_string()))
    }

    async fn list_for_resource(&self, _resource_id: &str) -> Result<Vec<StatusHistoryDbModel>> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn history_failure_does_not_abort_the_transition() {
    let pool = setup_test_db().await;
    let resources: Arc<dyn ResourceRepository> = Arc::new(SqlxResourceRepository::new(pool.clone()));
    let service = ReviewService::new(
        resources.clone(),
        Arc::new(SqlxReviewRepository::new(pool)),
        StatusHistoryRecorder::new(Arc::new(FailingHistoryRepository)),
        None,
    );

    let resource =
        create_resource(&resources, ResourceCategory::LessonPlan, ResourceStatus::UnderReview)
            .await;

    service
        .submit_review(review(&resource.id, ReviewDecision::Approved))
        .await
        .expect("review succeeds despite history failure");

    let updated = resources.get_resource(&resource.id).await.expect("get");
    assert_eq!(updated.status, "Approved");
}
