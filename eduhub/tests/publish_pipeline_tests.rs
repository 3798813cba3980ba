//! Integration tests for the streaming publication pipeline.
//!
//! The source store and video destination are in-memory doubles that count
//! calls and record every byte they receive; storage is a real in-memory
//! SQLite database, so reconciliation runs against actual rows.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use tokio::io::AsyncReadExt;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use eduhub::database::models::{
    PublishOverridesDbModel, ResourceCategory, ResourceDbModel, ResourceStatus, ReviewDecision,
};
use eduhub::database::repositories::{
    PublishOverridesRepository, ResourceRepository, SqlxPublishOverridesRepository,
    SqlxResourceRepository, SqlxReviewRepository, SqlxStatusHistoryRepository,
};
use eduhub::database::{DbPool, init_pool_with_size, run_migrations};
use eduhub::publisher::{
    ByteStream, PublishMetadata, PublisherConfig, ResourceSnapshot, SourceFileMetadata,
    SourceStore, VideoDestination, VideoPublisher,
};
use eduhub::workflow::{NewReview, ReviewService, StatusHistoryRecorder};
use eduhub::{Error, Result};
use stream_bridge::BridgeReader;

async fn setup_test_db() -> DbPool {
    let pool = init_pool_with_size("sqlite::memory:", 1)
        .await
        .expect("Failed to create test pool");

    run_migrations(&pool).await.expect("Failed to run migrations");

    pool
}

/// Source store double streaming a fixed byte payload in small chunks.
struct StubSource {
    data: Bytes,
    mime_type: String,
    chunk_size: usize,
    fail_mid_stream: bool,
    calls: AtomicUsize,
}

impl StubSource {
    fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            mime_type: "video/webm".to_string(),
            chunk_size: 64_000,
            fail_mid_stream: false,
            calls: AtomicUsize::new(0),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceStore for StubSource {
    async fn file_metadata(&self, _file_id: &str) -> Result<SourceFileMetadata> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(SourceFileMetadata {
            name: "lesson.webm".to_string(),
            mime_type: self.mime_type.clone(),
        })
    }

    async fn open_stream(&self, _file_id: &str) -> Result<ByteStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let mut items: Vec<Result<Bytes>> = self
            .data
            .chunks(self.chunk_size)
            .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
            .collect();
        if self.fail_mid_stream {
            items.truncate(1);
            items.push(Err(Error::Other("source connection reset".to_string())));
        }

        Ok(futures::stream::iter(items).boxed())
    }
}

/// Destination double that drains the bridge and records what it saw.
struct RecordingDestination {
    uploads: AtomicUsize,
    received: Mutex<Vec<u8>>,
    last_metadata: Mutex<Option<PublishMetadata>>,
    last_content_type: Mutex<Option<String>>,
    gate: Option<Arc<Notify>>,
}

impl RecordingDestination {
    fn new() -> Self {
        Self {
            uploads: AtomicUsize::new(0),
            received: Mutex::new(Vec::new()),
            last_metadata: Mutex::new(None),
            last_content_type: Mutex::new(None),
            gate: None,
        }
    }

    fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new()
        }
    }

    fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    fn received_bytes(&self) -> Vec<u8> {
        self.received.lock().unwrap().clone()
    }

    fn metadata(&self) -> Option<PublishMetadata> {
        self.last_metadata.lock().unwrap().clone()
    }
}

#[async_trait]
impl VideoDestination for RecordingDestination {
    async fn upload(
        &self,
        metadata: &PublishMetadata,
        content_type: &str,
        mut body: BridgeReader,
    ) -> Result<String> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        *self.last_metadata.lock().unwrap() = Some(metadata.clone());
        *self.last_content_type.lock().unwrap() = Some(content_type.to_string());

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let mut received = Vec::new();
        body.read_to_end(&mut received).await?;
        *self.received.lock().unwrap() = received;

        Ok("vid-123".to_string())
    }

    fn watch_url(&self, video_id: &str) -> String {
        format!("https://videos.test/watch/{video_id}")
    }
}

struct PipelineHarness {
    resources: Arc<dyn ResourceRepository>,
    overrides: Arc<dyn PublishOverridesRepository>,
    source: Arc<StubSource>,
    destination: Arc<RecordingDestination>,
    publisher: Arc<VideoPublisher>,
}

fn pipeline_harness(
    pool: DbPool,
    source: StubSource,
    destination: RecordingDestination,
) -> PipelineHarness {
    let resources: Arc<dyn ResourceRepository> = Arc::new(SqlxResourceRepository::new(pool.clone()));
    let overrides: Arc<dyn PublishOverridesRepository> =
        Arc::new(SqlxPublishOverridesRepository::new(pool));
    let source = Arc::new(source);
    let destination = Arc::new(destination);

    let publisher = Arc::new(VideoPublisher::new(
        source.clone(),
        destination.clone(),
        resources.clone(),
        overrides.clone(),
        PublisherConfig {
            channel_capacity: 4,
        },
        CancellationToken::new(),
    ));

    PipelineHarness {
        resources,
        overrides,
        source,
        destination,
        publisher,
    }
}

fn video_resource(status: ResourceStatus) -> ResourceDbModel {
    let mut resource = ResourceDbModel::new(
        "Cell Division Timelapse",
        ResourceCategory::Video,
        Some("Mitosis under the microscope.".to_string()),
        Some("https://files.example.com/file/d/vid-file-1/view".to_string()),
        "contrib-1",
    );
    resource.status = status.as_str().to_string();
    resource
}

fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

async fn wait_for_status(
    resources: &Arc<dyn ResourceRepository>,
    id: &str,
    status: &str,
) -> ResourceDbModel {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let resource = resources.get_resource(id).await.expect("resource");
        if resource.status == status {
            return resource;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for status {status}, still {}",
            resource.status
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn approved_video_streams_to_destination_end_to_end() {
    let pool = setup_test_db().await;
    let data = payload(1_000_003);
    let h = pipeline_harness(pool.clone(), StubSource::new(data.clone()), RecordingDestination::new());

    let resource = video_resource(ResourceStatus::UnderReview);
    h.resources.create_resource(&resource).await.expect("create");
    h.resources
        .set_subjects(&resource.id, &["Biology".to_string()])
        .await
        .expect("subjects");

    let service = ReviewService::new(
        h.resources.clone(),
        Arc::new(SqlxReviewRepository::new(pool.clone())),
        StatusHistoryRecorder::new(Arc::new(SqlxStatusHistoryRepository::new(pool))),
        Some(h.publisher.clone()),
    );

    service
        .submit_review(NewReview {
            resource_id: resource.id.clone(),
            reviewer_id: "rev-1".to_string(),
            reviewer_role: "Reviewer".to_string(),
            decision: ReviewDecision::Approved,
            summary: None,
        })
        .await
        .expect("submit review");

    // The synchronous path stops at Approved; publication happens behind it.
    let approved = h.resources.get_resource(&resource.id).await.expect("get");
    assert!(approved.status == "Approved" || approved.status == "Published");

    let published = wait_for_status(&h.resources, &resource.id, "Published").await;
    assert_eq!(
        published.published_url.as_deref(),
        Some("https://videos.test/watch/vid-123")
    );

    // Every byte read from the source reached the destination.
    assert_eq!(h.destination.received_bytes(), data);

    let metadata = h.destination.metadata().expect("metadata");
    assert_eq!(metadata.title, "Cell Division Timelapse");
    assert!(metadata.description.contains("Subjects: Biology"));
    assert_eq!(
        h.destination.last_content_type.lock().unwrap().as_deref(),
        Some("video/webm")
    );
}

#[tokio::test]
async fn empty_source_link_makes_no_network_calls() {
    let pool = setup_test_db().await;
    let h = pipeline_harness(pool, StubSource::new(payload(64)), RecordingDestination::new());

    let mut resource = video_resource(ResourceStatus::Approved);
    resource.source_link = None;
    h.resources.create_resource(&resource).await.expect("create");

    let snapshot = ResourceSnapshot::capture(&resource, Vec::new());
    h.publisher.publish(snapshot).await;

    assert_eq!(h.source.call_count(), 0);
    assert_eq!(h.destination.upload_count(), 0);

    let unchanged = h.resources.get_resource(&resource.id).await.expect("get");
    assert_eq!(unchanged.status, "Approved");
    assert!(unchanged.published_url.is_none());
}

#[tokio::test]
async fn non_video_category_makes_no_network_calls() {
    let pool = setup_test_db().await;
    let h = pipeline_harness(pool, StubSource::new(payload(64)), RecordingDestination::new());

    let mut resource = video_resource(ResourceStatus::Approved);
    resource.category = ResourceCategory::Worksheet.as_str().to_string();
    h.resources.create_resource(&resource).await.expect("create");

    let snapshot = ResourceSnapshot::capture(&resource, Vec::new());
    h.publisher.publish(snapshot).await;

    assert_eq!(h.source.call_count(), 0);
    assert_eq!(h.destination.upload_count(), 0);
}

#[tokio::test]
async fn unrecognized_source_link_makes_no_network_calls() {
    let pool = setup_test_db().await;
    let h = pipeline_harness(pool, StubSource::new(payload(64)), RecordingDestination::new());

    let mut resource = video_resource(ResourceStatus::Approved);
    resource.source_link = Some("https://example.com/not/a/share/link".to_string());
    h.resources.create_resource(&resource).await.expect("create");

    let snapshot = ResourceSnapshot::capture(&resource, Vec::new());
    h.publisher.publish(snapshot).await;

    assert_eq!(h.source.call_count(), 0);
    assert_eq!(h.destination.upload_count(), 0);
}

#[tokio::test]
async fn stored_overrides_shape_the_upload_metadata() {
    let pool = setup_test_db().await;
    let h = pipeline_harness(pool, StubSource::new(payload(1024)), RecordingDestination::new());

    let resource = video_resource(ResourceStatus::Approved);
    h.resources.create_resource(&resource).await.expect("create");

    let mut overrides = PublishOverridesDbModel::new(&resource.id);
    overrides.title = Some("Mitosis, Up Close".to_string());
    overrides.set_tag_list(&["biology".to_string(), "microscopy".to_string()]);
    overrides.visibility = Some("public".to_string());
    h.overrides.upsert(&overrides).await.expect("upsert overrides");

    let snapshot = ResourceSnapshot::capture(&resource, Vec::new());
    h.publisher.publish(snapshot).await;

    let metadata = h.destination.metadata().expect("metadata");
    assert_eq!(metadata.title, "Mitosis, Up Close");
    assert_eq!(metadata.tags, vec!["biology", "microscopy"]);
    // Description was not overridden; the resource summary stands.
    assert_eq!(metadata.description, "Mitosis under the microscope.");
}

#[tokio::test]
async fn source_error_aborts_without_persisting() {
    let pool = setup_test_db().await;
    let mut source = StubSource::new(payload(500_000));
    source.fail_mid_stream = true;
    let h = pipeline_harness(pool, source, RecordingDestination::new());

    let resource = video_resource(ResourceStatus::Approved);
    h.resources.create_resource(&resource).await.expect("create");

    let snapshot = ResourceSnapshot::capture(&resource, Vec::new());
    h.publisher.publish(snapshot).await;

    // The upload was attempted but failed when the producer aborted.
    assert_eq!(h.destination.upload_count(), 1);

    let unchanged = h.resources.get_resource(&resource.id).await.expect("get");
    assert_eq!(unchanged.status, "Approved");
    assert!(unchanged.published_url.is_none());
}

#[tokio::test]
async fn concurrent_edit_survives_reconciliation() {
    let pool = setup_test_db().await;
    let gate = Arc::new(Notify::new());
    let h = pipeline_harness(
        pool,
        StubSource::new(payload(100_000)),
        RecordingDestination::gated(gate.clone()),
    );

    let resource = video_resource(ResourceStatus::Approved);
    h.resources.create_resource(&resource).await.expect("create");

    let snapshot = ResourceSnapshot::capture(&resource, Vec::new());
    h.publisher.spawn_publish(snapshot);

    // Wait for the upload to be in flight, held open by the gate.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while h.destination.upload_count() == 0 {
        assert!(tokio::time::Instant::now() < deadline, "upload never started");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    // A contributor edits the title while the upload is running.
    let mut edited = h.resources.get_resource(&resource.id).await.expect("get");
    edited.title = "Cell Division, Narrated".to_string();
    h.resources.update_resource(&edited).await.expect("edit");

    gate.notify_one();

    let published = wait_for_status(&h.resources, &resource.id, "Published").await;
    // The mid-flight edit survives; only status and published_url were overwritten.
    assert_eq!(published.title, "Cell Division, Narrated");
    assert!(published.published_url.is_some());
}

#[tokio::test]
async fn refetch_failure_after_upload_is_swallowed() {
    let pool = setup_test_db().await;
    let h = pipeline_harness(pool, StubSource::new(payload(2048)), RecordingDestination::new());

    // Snapshot of a resource that was deleted before the upload finished;
    // reconciliation has nothing to update and must only log.
    let resource = video_resource(ResourceStatus::Approved);
    let snapshot = ResourceSnapshot::capture(&resource, Vec::new());
    h.publisher.publish(snapshot).await;

    assert_eq!(h.destination.upload_count(), 1);
    assert_eq!(h.destination.received_bytes(), payload(2048));
}
