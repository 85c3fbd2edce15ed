//! HTTP client for feed media
//!
//! The module is organized into specialized components:
//! - `config`: HTTP client configuration and building
//! - `http`: single GET requests with status mapping
//! - `download`: streamed downloads with throttled progress

use std::time::Duration;

use url::Url;

use crate::app::progress::ProgressSink;
use crate::constants::PROGRESS_INTERVAL;
use crate::errors::{DownloadError, DownloadResult};

pub mod config;
pub mod download;
pub mod http;

pub use config::ClientConfig;
pub use download::collect_body;

use download::DownloadHandler;
use http::HttpHandler;

/// HTTP client for fetching feed assets
///
/// Requests are never retried; errors surface to the caller unchanged.
#[derive(Debug, Clone)]
pub struct FeedClient {
    http_handler: HttpHandler,
    progress_interval: Duration,
}

impl FeedClient {
    /// Creates a client with default settings
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if HTTP client creation fails
    pub fn new() -> DownloadResult<Self> {
        Self::with_config(&ClientConfig::default())
    }

    /// Creates a client with custom configuration
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if HTTP client creation fails
    pub fn with_config(config: &ClientConfig) -> DownloadResult<Self> {
        let client = config.build_http_client()?;
        Ok(Self {
            http_handler: HttpHandler::new(client),
            progress_interval: PROGRESS_INTERVAL,
        })
    }

    /// Minimum spacing between progress callbacks
    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn progress_interval(&self) -> Duration {
        self.progress_interval
    }

    /// Stream `url` into memory with progress reporting
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if the URL is invalid, the request fails or
    /// the stream is interrupted
    pub async fn download<S>(&self, url: &str, sink: &mut S) -> DownloadResult<Vec<u8>>
    where
        S: ProgressSink + ?Sized,
    {
        let url = parse_url(url)?;
        DownloadHandler::new(&self.http_handler, self.progress_interval)
            .download(&url, sink)
            .await
    }

    /// Fetch `url` without progress reporting (images, covers)
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if the URL is invalid or the request fails
    pub async fn fetch_bytes(&self, url: &str) -> DownloadResult<Vec<u8>> {
        let url = parse_url(url)?;
        DownloadHandler::new(&self.http_handler, self.progress_interval)
            .fetch_bytes(&url)
            .await
    }
}

/// Parse a download URL
pub fn parse_url(url: &str) -> DownloadResult<Url> {
    Url::parse(url).map_err(|e| DownloadError::InvalidUrl {
        url: url.to_string(),
        error: e.to_string(),
    })
}
