//! Source file store client.
//!
//! The file store is an opaque network service reachable through a
//! pre-authorized client handle. It serves file metadata as JSON and file
//! content as a streaming body.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use regex::Regex;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;

use crate::{Error, Result};

/// Byte stream handed from the source store to the bridge producer.
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// Share/download URL shapes a file id can be recovered from.
fn file_id_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            // https://files.example.com/file/d/<ID>/view
            Regex::new(r"/file/d/([a-zA-Z0-9_-]+)").unwrap(),
            // ...?id=<ID> and ...&id=<ID> (open / direct-download links)
            Regex::new(r"[?&]id=([a-zA-Z0-9_-]+)").unwrap(),
        ]
    })
}

/// Parse a file store share/download URL and return the file id portion.
pub fn extract_file_id(source_link: &str) -> Result<String> {
    for pattern in file_id_patterns() {
        if let Some(found) = pattern.captures(source_link).and_then(|c| c.get(1)) {
            return Ok(found.as_str().to_string());
        }
    }
    Err(Error::SourceLink(source_link.to_string()))
}

/// Metadata reported by the source store for a single file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFileMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
}

/// Source file store trait.
#[async_trait]
pub trait SourceStore: Send + Sync {
    async fn file_metadata(&self, file_id: &str) -> Result<SourceFileMetadata>;
    /// Open the file content as a byte stream. The response body is consumed
    /// incrementally; nothing is buffered beyond the transport's own chunks.
    async fn open_stream(&self, file_id: &str) -> Result<ByteStream>;
}

/// HTTP implementation of [`SourceStore`].
pub struct HttpFileStore {
    client: Client,
    base_url: String,
    request_timeout: Duration,
}

impl HttpFileStore {
    pub fn new(
        base_url: impl Into<String>,
        token: &str,
        request_timeout: Duration,
    ) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| Error::config("file store token contains invalid header characters"))?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(10))
            // Bounds stalls between body chunks without capping total
            // transfer time, which is unbounded for large files.
            .read_timeout(request_timeout)
            .build()?;

        let base_url: String = base_url.into();
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout,
        })
    }

    fn file_url(&self, file_id: &str) -> String {
        format!("{}/files/{}", self.base_url, file_id)
    }
}

#[async_trait]
impl SourceStore for HttpFileStore {
    async fn file_metadata(&self, file_id: &str) -> Result<SourceFileMetadata> {
        let response = self
            .client
            .get(self.file_url(file_id))
            .query(&[("fields", "name,mimeType")])
            .timeout(self.request_timeout)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    async fn open_stream(&self, file_id: &str) -> Result<ByteStream> {
        let response = self
            .client
            .get(self.file_url(file_id))
            .query(&[("alt", "media")])
            .send()
            .await?
            .error_for_status()?;
        Ok(response.bytes_stream().map_err(Error::from).boxed())
    }
}
