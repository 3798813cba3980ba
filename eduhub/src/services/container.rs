//! Service container for dependency injection.
//!
//! The ServiceContainer wires repositories and services together and owns
//! the root cancellation token for graceful shutdown.

use std::sync::Arc;

use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::Result;
use crate::config::PublisherSettings;
use crate::database::repositories::{
    PublishOverridesRepository, ResourceRepository, ReviewRepository, SqlxPublishOverridesRepository,
    SqlxResourceRepository, SqlxReviewRepository, SqlxStatusHistoryRepository,
    StatusHistoryRepository,
};
use crate::publisher::{
    HttpFileStore, HttpVideoHost, PublisherConfig, VideoHostConfig, VideoPublisher,
};
use crate::workflow::{ReviewService, StatusHistoryRecorder};

/// Service container holding all application services.
pub struct ServiceContainer {
    /// Database connection pool.
    pub pool: SqlitePool,
    /// Resource repository.
    pub resources: Arc<dyn ResourceRepository>,
    /// Review repository.
    pub reviews: Arc<dyn ReviewRepository>,
    /// Status history repository.
    pub status_history: Arc<dyn StatusHistoryRepository>,
    /// Publish overrides repository.
    pub publish_overrides: Arc<dyn PublishOverridesRepository>,
    /// Review workflow service.
    pub review_service: Arc<ReviewService>,
    /// Video publisher; absent when the upload capability is unconfigured.
    pub publisher: Option<Arc<VideoPublisher>>,
    /// Cancellation token for graceful shutdown.
    cancellation_token: CancellationToken,
}

impl ServiceContainer {
    /// Create a new service container with the given database pool.
    ///
    /// `publisher_settings` is the optional upload capability: when `None`,
    /// approvals still complete and the publication step is skipped with a
    /// warning at the trigger site.
    pub async fn new(
        pool: SqlitePool,
        publisher_settings: Option<PublisherSettings>,
    ) -> Result<Self> {
        info!("Initializing service container");

        let resources: Arc<dyn ResourceRepository> =
            Arc::new(SqlxResourceRepository::new(pool.clone()));
        let reviews: Arc<dyn ReviewRepository> = Arc::new(SqlxReviewRepository::new(pool.clone()));
        let status_history: Arc<dyn StatusHistoryRepository> =
            Arc::new(SqlxStatusHistoryRepository::new(pool.clone()));
        let publish_overrides: Arc<dyn PublishOverridesRepository> =
            Arc::new(SqlxPublishOverridesRepository::new(pool.clone()));

        let cancellation_token = CancellationToken::new();

        let publisher = match publisher_settings {
            Some(settings) => Some(Arc::new(build_publisher(
                settings,
                resources.clone(),
                publish_overrides.clone(),
                cancellation_token.child_token(),
            )?)),
            None => {
                warn!(
                    "video publisher not configured, set FILESTORE_BASE_URL, FILESTORE_TOKEN, \
                     VIDEOHOST_BASE_URL, VIDEOHOST_UPLOAD_TOKEN to enable auto-publishing"
                );
                None
            }
        };

        let review_service = Arc::new(ReviewService::new(
            resources.clone(),
            reviews.clone(),
            StatusHistoryRecorder::new(status_history.clone()),
            publisher.clone(),
        ));

        info!("Service container initialized");

        Ok(Self {
            pool,
            resources,
            reviews,
            status_history,
            publish_overrides,
            review_service,
            publisher,
            cancellation_token,
        })
    }

    /// Cancel all background work.
    pub fn shutdown(&self) {
        info!("Shutting down service container");
        self.cancellation_token.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }
}

fn build_publisher(
    settings: PublisherSettings,
    resources: Arc<dyn ResourceRepository>,
    publish_overrides: Arc<dyn PublishOverridesRepository>,
    cancellation_token: CancellationToken,
) -> Result<VideoPublisher> {
    let source = HttpFileStore::new(
        &settings.filestore_base_url,
        &settings.filestore_token,
        settings.request_timeout,
    )?;

    let destination = HttpVideoHost::new(
        &settings.videohost_base_url,
        &settings.watch_base_url,
        &settings.videohost_token,
        VideoHostConfig {
            chunk_size: settings.chunk_size,
            request_timeout: settings.request_timeout,
            chunk_timeout: settings.chunk_timeout,
        },
    )?;

    info!("video publisher configured");

    Ok(VideoPublisher::new(
        Arc::new(source),
        Arc::new(destination),
        resources,
        publish_overrides,
        PublisherConfig {
            channel_capacity: settings.channel_capacity,
        },
        cancellation_token,
    ))
}
