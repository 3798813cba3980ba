//! Streaming publication pipeline and reconciliation.
//!
//! `publish` runs entirely outside the request path: the orchestrator hands
//! it a resource snapshot on a detached task and never awaits the outcome.
//! Every failure terminates in a log record keyed by the resource id.

use std::sync::Arc;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use stream_bridge::{BridgeError, BridgeWriter};

use super::ResourceSnapshot;
use super::destination::VideoDestination;
use super::metadata::resolve;
use super::source::{ByteStream, SourceStore, extract_file_id};
use crate::Result;
use crate::database::models::{ResourceCategory, ResourceStatus};
use crate::database::repositories::{PublishOverridesRepository, ResourceRepository};

/// Fallback content type when the source store reports none.
const DEFAULT_CONTENT_TYPE: &str = "video/mp4";

/// Publication pipeline configuration.
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Capacity of the byte hand-off channel, in chunks.
    pub channel_capacity: usize,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            channel_capacity: stream_bridge::DEFAULT_CAPACITY,
        }
    }
}

/// Streams approved video resources from the file store to the video host
/// and reconciles the outcome into storage.
pub struct VideoPublisher {
    source: Arc<dyn SourceStore>,
    destination: Arc<dyn VideoDestination>,
    resources: Arc<dyn ResourceRepository>,
    overrides: Arc<dyn PublishOverridesRepository>,
    config: PublisherConfig,
    cancellation_token: CancellationToken,
}

impl VideoPublisher {
    pub fn new(
        source: Arc<dyn SourceStore>,
        destination: Arc<dyn VideoDestination>,
        resources: Arc<dyn ResourceRepository>,
        overrides: Arc<dyn PublishOverridesRepository>,
        config: PublisherConfig,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            source,
            destination,
            resources,
            overrides,
            config,
            cancellation_token,
        }
    }

    /// Launch `publish` on a detached task.
    ///
    /// Fire-and-forget: no handle is exposed to the trigger site, and the
    /// triggering request never blocks on the upload.
    pub fn spawn_publish(self: &Arc<Self>, snapshot: ResourceSnapshot) {
        let publisher = Arc::clone(self);
        tokio::spawn(async move {
            publisher.publish(snapshot).await;
        });
    }

    /// Run the full publication pipeline for one resource snapshot.
    ///
    /// Precondition failures (no source link, wrong category, unrecognized
    /// link) are logged and skipped, not surfaced: the trigger site has
    /// already returned to its caller.
    pub async fn publish(&self, snapshot: ResourceSnapshot) {
        let resource_id = snapshot.id.clone();

        let Some(source_link) = snapshot.source_link.clone().filter(|link| !link.is_empty())
        else {
            error!(resource_id = %resource_id, "video publish: source link is empty, skipping");
            return;
        };

        if snapshot.category != Some(ResourceCategory::Video) {
            warn!(
                resource_id = %resource_id,
                category = ?snapshot.category,
                "video publish: category is not Video, skipping"
            );
            return;
        }

        let file_id = match extract_file_id(&source_link) {
            Ok(file_id) => file_id,
            Err(error) => {
                error!(
                    resource_id = %resource_id,
                    error = %error,
                    "video publish: failed to extract source file id"
                );
                return;
            }
        };

        match self.run_pipeline(&snapshot, &file_id).await {
            Ok(published_url) => self.reconcile(&resource_id, &published_url).await,
            Err(error) => {
                error!(resource_id = %resource_id, error = %error, "video publish: upload failed");
            }
        }
    }

    async fn run_pipeline(&self, snapshot: &ResourceSnapshot, file_id: &str) -> Result<String> {
        let file_meta = self.source.file_metadata(file_id).await?;
        let content_type = if file_meta.mime_type.is_empty() {
            DEFAULT_CONTENT_TYPE.to_string()
        } else {
            file_meta.mime_type.clone()
        };

        let stream = self.source.open_stream(file_id).await?;

        // Producer feeds the bridge; the upload consumes the other end. The
        // bounded channel paces the download to the upload rate.
        let (writer, reader) = stream_bridge::bounded(self.config.channel_capacity);
        let producer = tokio::spawn(pump(stream, writer, self.cancellation_token.child_token()));

        let overrides = match self.overrides.get_for_resource(&snapshot.id).await {
            Ok(overrides) => Some(overrides),
            Err(error) if error.is_not_found() => None,
            Err(error) => {
                warn!(
                    resource_id = %snapshot.id,
                    error = %error,
                    "could not load publish overrides, using resource defaults"
                );
                None
            }
        };
        let metadata = resolve(snapshot, overrides.as_ref());

        info!(
            resource_id = %snapshot.id,
            file_id,
            content_type = %content_type,
            "starting video upload"
        );
        let video_id = self
            .destination
            .upload(&metadata, &content_type, reader)
            .await?;

        // By now the producer has drained (or failed and aborted the upload).
        let _ = producer.await;

        info!(resource_id = %snapshot.id, video_id = %video_id, "video upload complete");
        Ok(self.destination.watch_url(&video_id))
    }

    /// Apply the publication outcome to the live resource row.
    ///
    /// Re-fetches the row rather than reusing the snapshot, so edits made
    /// during the upload survive; only `status` and `published_url` are
    /// overwritten. The terminal status is applied even if an intervening
    /// edit moved the resource elsewhere — a known, accepted race.
    pub async fn reconcile(&self, resource_id: &str, published_url: &str) {
        let mut resource = match self.resources.get_resource(resource_id).await {
            Ok(resource) => resource,
            Err(error) => {
                error!(
                    resource_id,
                    published_url,
                    error = %error,
                    "failed to re-fetch resource after upload"
                );
                return;
            }
        };

        resource.published_url = Some(published_url.to_string());
        resource.status = ResourceStatus::Published.as_str().to_string();

        if let Err(error) = self.resources.update_resource(&resource).await {
            // The content is live at the destination but the row does not
            // reflect it; recovery is manual.
            error!(
                resource_id,
                published_url,
                error = %error,
                "failed to persist publication result, destination and storage have diverged"
            );
            return;
        }

        info!(resource_id, published_url, "video published");
    }
}

/// Forward the source byte stream into the bridge.
///
/// A read error or cancellation is pushed through the bridge with `abort`,
/// so the consumer fails its upload instead of seeing a truncated stream.
async fn pump(mut stream: ByteStream, writer: BridgeWriter, cancel: CancellationToken) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                writer.abort(BridgeError::source("publication cancelled")).await;
                return;
            }
            chunk = stream.next() => match chunk {
                Some(Ok(chunk)) => {
                    if writer.write(chunk).await.is_err() {
                        // Consumer went away; nothing left to feed.
                        return;
                    }
                }
                Some(Err(error)) => {
                    writer.abort(BridgeError::source(error.to_string())).await;
                    return;
                }
                // Dropping the writer signals a clean end of stream.
                None => return,
            }
        }
    }
}
