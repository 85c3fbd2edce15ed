//! Core HTTP operations
//!
//! A single GET per call with status mapping. Nothing here retries: failures
//! go straight back to the caller, who decides whether to try again.

use reqwest::{Client, StatusCode};
use url::Url;

use crate::errors::{DownloadError, DownloadResult};

/// HTTP operations handler
#[derive(Debug, Clone)]
pub struct HttpHandler {
    client: Client,
}

impl HttpHandler {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Fetches the HTTP response for `url`
    ///
    /// The body is not read, so the response can be streamed.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if the request fails or the server answers
    /// with a non-success status
    pub async fn get_response(&self, url: &Url) -> DownloadResult<reqwest::Response> {
        let response = self.client.get(url.as_str()).send().await?;
        check_status(url, response.status())?;
        tracing::debug!("Fetched response headers: {}", url);
        Ok(response)
    }

    /// Get a reference to the underlying HTTP client
    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// Map a non-success status to the matching `DownloadError`
pub fn check_status(url: &Url, status: StatusCode) -> DownloadResult<()> {
    if status.is_success() {
        return Ok(());
    }
    tracing::debug!("Server answered {} for {}", status, url);
    match status {
        StatusCode::NOT_FOUND => Err(DownloadError::NotFound {
            url: url.to_string(),
        }),
        StatusCode::FORBIDDEN => Err(DownloadError::Forbidden {
            url: url.to_string(),
        }),
        status => Err(DownloadError::ServerError {
            status: status.as_u16(),
        }),
    }
}
