//! Environment-driven configuration.
//!
//! Settings are plain structs read once at startup. The publisher settings
//! are optional as a whole: when the file-store or video-host credentials are
//! absent the publication capability is simply not built, and approvals
//! proceed without it.

use std::path::PathBuf;
use std::time::Duration;

use crate::logging::DEFAULT_LOG_FILTER;

/// Default SQLite database URL.
const DEFAULT_DATABASE_URL: &str = "sqlite:eduhub.db?mode=rwc";

/// Default upload chunk size (8 MiB), sized for throughput on large files.
const DEFAULT_CHUNK_SIZE: usize = 8 * 1024 * 1024;

/// Default capacity of the byte hand-off channel, in chunks.
const DEFAULT_CHANNEL_CAPACITY: usize = 32;

/// Default timeout for metadata and session-init requests.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default timeout for a single uploaded chunk.
const DEFAULT_CHUNK_TIMEOUT_SECS: u64 = 120;

/// Core application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub log_dir: Option<PathBuf>,
    pub log_filter: String,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            database_url: env_or("DATABASE_URL", DEFAULT_DATABASE_URL),
            log_dir: std::env::var("LOG_DIR").ok().map(PathBuf::from),
            log_filter: env_or("LOG_FILTER", DEFAULT_LOG_FILTER),
        }
    }
}

/// Settings for the video publication pipeline.
///
/// Built only when all required credentials are present; see
/// [`PublisherSettings::from_env`].
#[derive(Debug, Clone)]
pub struct PublisherSettings {
    /// Base URL of the source file store.
    pub filestore_base_url: String,
    /// Pre-authorized bearer token for the file store.
    pub filestore_token: String,
    /// Base URL of the destination video host.
    pub videohost_base_url: String,
    /// Pre-authorized bearer token for the video host upload API.
    pub videohost_token: String,
    /// Base URL that published video ids are appended to.
    pub watch_base_url: String,
    pub chunk_size: usize,
    pub channel_capacity: usize,
    pub request_timeout: Duration,
    pub chunk_timeout: Duration,
}

impl PublisherSettings {
    /// Read publisher settings from the environment.
    ///
    /// Returns `None` when any of `FILESTORE_BASE_URL`, `FILESTORE_TOKEN`,
    /// `VIDEOHOST_BASE_URL`, or `VIDEOHOST_UPLOAD_TOKEN` is missing or empty,
    /// meaning the publication capability is unconfigured.
    pub fn from_env() -> Option<Self> {
        let filestore_base_url = non_empty_env("FILESTORE_BASE_URL")?;
        let filestore_token = non_empty_env("FILESTORE_TOKEN")?;
        let videohost_base_url = non_empty_env("VIDEOHOST_BASE_URL")?;
        let videohost_token = non_empty_env("VIDEOHOST_UPLOAD_TOKEN")?;

        let watch_base_url = non_empty_env("VIDEOHOST_WATCH_BASE_URL")
            .unwrap_or_else(|| format!("{}/watch", videohost_base_url.trim_end_matches('/')));

        Some(Self {
            filestore_base_url,
            filestore_token,
            videohost_base_url,
            videohost_token,
            watch_base_url,
            chunk_size: env_parse("UPLOAD_CHUNK_SIZE_BYTES", DEFAULT_CHUNK_SIZE),
            channel_capacity: env_parse("UPLOAD_CHANNEL_CAPACITY", DEFAULT_CHANNEL_CAPACITY),
            request_timeout: Duration::from_secs(env_parse(
                "UPLOAD_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )),
            chunk_timeout: Duration::from_secs(env_parse(
                "UPLOAD_CHUNK_TIMEOUT_SECS",
                DEFAULT_CHUNK_TIMEOUT_SECS,
            )),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
