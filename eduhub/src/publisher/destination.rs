//! Destination video host client.
//!
//! Speaks a resumable, chunked upload protocol: an initial POST creates an
//! upload session and returns its URI in the `Location` header; the content
//! is then PUT in sequential chunks with `Content-Range` headers, the final
//! chunk carrying the real total. HTTP 308 acknowledges an intermediate
//! chunk; a success status on the final chunk returns the created video id.

use std::time::Duration;

use async_trait::async_trait;
use bytes::{BufMut, BytesMut};
use reqwest::header::{CONTENT_RANGE, CONTENT_TYPE, HeaderMap, HeaderValue, LOCATION};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use stream_bridge::BridgeReader;
use tokio::io::AsyncReadExt;
use tracing::debug;

use super::metadata::PublishMetadata;
use crate::{Error, Result};

/// Minimum chunk size accepted by resumable upload endpoints (256 KiB).
const MIN_CHUNK_SIZE: usize = 256 * 1024;

/// Destination video host trait.
#[async_trait]
pub trait VideoDestination: Send + Sync {
    /// Create a video with the given metadata and stream its content from
    /// `body`. Returns the destination-assigned video id.
    async fn upload(
        &self,
        metadata: &PublishMetadata,
        content_type: &str,
        body: BridgeReader,
    ) -> Result<String>;

    /// Externally visible URL for a published video id.
    fn watch_url(&self, video_id: &str) -> String;
}

/// Configuration for [`HttpVideoHost`].
#[derive(Debug, Clone)]
pub struct VideoHostConfig {
    /// Upload chunk size in bytes.
    pub chunk_size: usize,
    /// Timeout for metadata/session-init requests.
    pub request_timeout: Duration,
    /// Timeout for a single chunk PUT.
    pub chunk_timeout: Duration,
}

impl Default for VideoHostConfig {
    fn default() -> Self {
        Self {
            chunk_size: 8 * 1024 * 1024,
            request_timeout: Duration::from_secs(30),
            chunk_timeout: Duration::from_secs(120),
        }
    }
}

/// HTTP implementation of [`VideoDestination`].
pub struct HttpVideoHost {
    client: Client,
    base_url: String,
    watch_base_url: String,
    config: VideoHostConfig,
}

impl HttpVideoHost {
    pub fn new(
        base_url: impl Into<String>,
        watch_base_url: impl Into<String>,
        token: &str,
        config: VideoHostConfig,
    ) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| Error::config("video host token contains invalid header characters"))?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(reqwest::header::AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let base_url: String = base_url.into();
        let watch_base_url: String = watch_base_url.into();
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            watch_base_url: watch_base_url.trim_end_matches('/').to_string(),
            config,
        })
    }

    /// Open a resumable upload session; returns the session URI.
    async fn start_session(
        &self,
        metadata: &PublishMetadata,
        content_type: &str,
    ) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/upload/videos", self.base_url))
            .query(&[("uploadType", "resumable")])
            .header("X-Upload-Content-Type", content_type)
            .timeout(self.config.request_timeout)
            .json(metadata)
            .send()
            .await?
            .error_for_status()?;

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| Error::upload("resumable session response is missing a Location header"))?;

        // Session URIs may be absolute or relative to the upload base.
        let session = url::Url::parse(location).or_else(|_| {
            url::Url::parse(&self.base_url)
                .and_then(|base| base.join(location))
        });
        session
            .map(String::from)
            .map_err(|_| Error::upload(format!("invalid session URI: {location}")))
    }
}

#[async_trait]
impl VideoDestination for HttpVideoHost {
    async fn upload(
        &self,
        metadata: &PublishMetadata,
        content_type: &str,
        mut body: BridgeReader,
    ) -> Result<String> {
        let session_url = self.start_session(metadata, content_type).await?;
        let chunk_size = self.config.chunk_size.max(MIN_CHUNK_SIZE);

        let mut offset: u64 = 0;
        let mut buf = BytesMut::with_capacity(chunk_size);

        loop {
            let last = fill_chunk(&mut body, &mut buf, chunk_size).await?;

            if buf.is_empty() {
                // Zero-length finalize: empty source, or the total was an
                // exact multiple of the chunk size.
                let response = self
                    .client
                    .put(session_url.as_str())
                    .header(CONTENT_RANGE, final_empty_range(offset))
                    .timeout(self.config.chunk_timeout)
                    .send()
                    .await?;
                return completion_id(response).await;
            }

            let chunk = buf.split().freeze();
            let len = chunk.len() as u64;
            debug!(offset, len, last, "uploading chunk");

            let response = self
                .client
                .put(session_url.as_str())
                .header(CONTENT_RANGE, content_range(offset, len, last))
                .header(CONTENT_TYPE, content_type)
                .timeout(self.config.chunk_timeout)
                .body(chunk)
                .send()
                .await?;
            offset += len;

            if last {
                return completion_id(response).await;
            }

            match response.status() {
                // 308: the session acknowledged the chunk and expects more.
                StatusCode::PERMANENT_REDIRECT => {}
                status if status.is_success() => {
                    return Err(Error::upload(format!(
                        "destination completed the session early at byte {offset}"
                    )));
                }
                status => {
                    return Err(Error::upload(format!(
                        "chunk upload failed with status {status}"
                    )));
                }
            }
        }
    }

    fn watch_url(&self, video_id: &str) -> String {
        format!("{}/{}", self.watch_base_url, video_id)
    }
}

/// Fill `buf` up to `chunk_size` bytes from the bridge.
///
/// Returns true once the bridge reached end of stream. A producer-side abort
/// surfaces here as an `Io` error, failing the upload instead of truncating.
async fn fill_chunk(
    body: &mut BridgeReader,
    buf: &mut BytesMut,
    chunk_size: usize,
) -> Result<bool> {
    while buf.len() < chunk_size {
        let remaining = chunk_size - buf.len();
        let mut limited = (&mut *buf).limit(remaining);
        let n = body.read_buf(&mut limited).await?;
        if n == 0 {
            return Ok(true);
        }
    }
    Ok(false)
}

fn content_range(offset: u64, len: u64, last: bool) -> String {
    let end = offset + len - 1;
    if last {
        format!("bytes {}-{}/{}", offset, end, offset + len)
    } else {
        format!("bytes {}-{}/*", offset, end)
    }
}

fn final_empty_range(total: u64) -> String {
    format!("bytes */{total}")
}

#[derive(Deserialize)]
struct UploadCompletion {
    id: String,
}

async fn completion_id(response: reqwest::Response) -> Result<String> {
    let response = response.error_for_status()?;
    let completion: UploadCompletion = response.json().await?;
    Ok(completion.id)
}
