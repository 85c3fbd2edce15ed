//! Streamed downloads with throttled progress
//!
//! The body is read chunk by chunk into memory. Progress goes to a
//! [`ProgressSink`]: byte counts always, percentages only when the server
//! declared a content length.

use std::pin::pin;
use std::time::{Duration, Instant};

use futures::{Stream, StreamExt};
use url::Url;

use crate::app::client::http::HttpHandler;
use crate::app::progress::{percent_complete, ProgressSink, ProgressThrottle};
use crate::constants::download::MAX_PREALLOCATION;
use crate::errors::{DownloadError, DownloadResult};

/// Download operations handler
pub struct DownloadHandler<'a> {
    http_handler: &'a HttpHandler,
    progress_interval: Duration,
}

impl<'a> DownloadHandler<'a> {
    /// Creates a new DownloadHandler with the given HTTP handler
    pub fn new(http_handler: &'a HttpHandler, progress_interval: Duration) -> Self {
        Self {
            http_handler,
            progress_interval,
        }
    }

    /// Stream `url` into memory, reporting progress to `sink`
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if the request fails, the server answers with
    /// an error status or the stream breaks off. Nothing is retried.
    pub async fn download<S>(&self, url: &Url, sink: &mut S) -> DownloadResult<Vec<u8>>
    where
        S: ProgressSink + ?Sized,
    {
        let response = self.http_handler.get_response(url).await?;
        let content_length = response.content_length();
        tracing::debug!("Downloading {} ({:?} bytes declared)", url, content_length);

        let bytes = collect_body(
            response.bytes_stream(),
            content_length,
            self.progress_interval,
            sink,
        )
        .await?;

        tracing::debug!("Finished {} with {} bytes", url, bytes.len());
        Ok(bytes)
    }

    /// Download `url` in one piece without progress reporting
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if the HTTP request fails or content cannot be read
    pub async fn fetch_bytes(&self, url: &Url) -> DownloadResult<Vec<u8>> {
        let response = self.http_handler.get_response(url).await?;
        let bytes = response.bytes().await.map_err(DownloadError::Http)?;
        Ok(bytes.to_vec())
    }
}

/// Accumulate a chunk stream into one buffer
///
/// Progress is emitted for the first chunk, then at most once per
/// `interval`. When a non-zero `content_length` is known, the chunk that
/// completes it always reports 100%. A zero length is treated as unknown.
pub async fn collect_body<St, B, E, S>(
    stream: St,
    content_length: Option<u64>,
    interval: Duration,
    sink: &mut S,
) -> DownloadResult<Vec<u8>>
where
    St: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<DownloadError>,
    S: ProgressSink + ?Sized,
{
    let total = content_length.filter(|&len| len > 0);
    sink.on_start(total);

    let capacity = total.map_or(0, |len| len.min(MAX_PREALLOCATION) as usize);
    let mut buffer = Vec::with_capacity(capacity);
    let mut received: u64 = 0;
    let mut reported: u64 = 0;
    let mut completed = false;
    let mut throttle = ProgressThrottle::new(interval);

    let mut stream = pin!(stream);
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(Into::<DownloadError>::into)?;
        let chunk = chunk.as_ref();
        buffer.extend_from_slice(chunk);
        received += chunk.len() as u64;

        let now = Instant::now();
        let reached_total = total.is_some_and(|len| received >= len);
        let emit = if reached_total && !completed {
            completed = true;
            throttle.mark(now);
            true
        } else {
            !completed && throttle.ready(now)
        };

        if emit {
            sink.on_bytes(received);
            reported = received;
            if let Some(percent) = percent_complete(received, total) {
                sink.on_percent(percent);
            }
        }
    }

    if reported != received {
        sink.on_bytes(received);
    }

    if let Some(len) = total {
        if received < len {
            tracing::warn!("Stream ended after {} of {} declared bytes", received, len);
        } else if received > len {
            tracing::debug!("Received {} bytes, {} declared", received, len);
        }
    }

    Ok(buffer)
}
