//! Video publication pipeline.
//!
//! Streams an approved video resource's source file from the file store into
//! the video host's resumable upload API without materializing the file on
//! local disk, then reconciles the published URL back into storage.

pub mod destination;
pub mod metadata;
pub mod pipeline;
pub mod source;

pub use destination::{HttpVideoHost, VideoDestination, VideoHostConfig};
pub use metadata::{PublishMetadata, resolve};
pub use pipeline::{PublisherConfig, VideoPublisher};
pub use source::{ByteStream, HttpFileStore, SourceFileMetadata, SourceStore, extract_file_id};

use crate::database::models::{ResourceCategory, ResourceDbModel};

/// Immutable copy of the resource fields the pipeline needs, captured at the
/// moment approval was recorded.
///
/// The live row is not read again until reconciliation, so edits made while
/// the upload is in flight do not change what gets uploaded.
#[derive(Debug, Clone)]
pub struct ResourceSnapshot {
    pub id: String,
    pub title: String,
    pub category: Option<ResourceCategory>,
    pub summary: Option<String>,
    pub subjects: Vec<String>,
    pub source_link: Option<String>,
}

impl ResourceSnapshot {
    pub fn capture(resource: &ResourceDbModel, subjects: Vec<String>) -> Self {
        Self {
            id: resource.id.clone(),
            title: resource.title.clone(),
            category: resource.parsed_category(),
            summary: resource.summary.clone(),
            subjects,
            source_link: resource.source_link.clone(),
        }
    }
}
