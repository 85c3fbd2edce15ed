//! Progress reporting primitives for streamed downloads
//!
//! The downloader reports through a [`ProgressSink`]. Percentages are only
//! reported when the server declared a content length; byte counts are always
//! reported. Both are throttled by [`ProgressThrottle`] so a fast stream does
//! not flood the display.

use std::time::{Duration, Instant};

/// Receiver of download progress
///
/// Any `FnMut(f64)` closure is a sink that only cares about percentages.
pub trait ProgressSink {
    /// Called once the response headers are in, with the declared length
    fn on_start(&mut self, _total: Option<u64>) {}

    /// Called with the completion percentage in `[0, 100]`
    fn on_percent(&mut self, percent: f64);

    /// Called with the running byte count
    fn on_bytes(&mut self, _received: u64) {}
}

impl<F> ProgressSink for F
where
    F: FnMut(f64),
{
    fn on_percent(&mut self, percent: f64) {
        self(percent)
    }
}

/// Sink that discards every update
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_percent(&mut self, _percent: f64) {}
}

/// Rate limiter for progress callbacks
///
/// Lets the first update through, then at most one update per `interval`.
#[derive(Debug, Clone)]
pub struct ProgressThrottle {
    interval: Duration,
    last_emit: Option<Instant>,
}

impl ProgressThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_emit: None,
        }
    }

    /// Returns true if an update may be emitted at `now`, and records it
    pub fn ready(&mut self, now: Instant) -> bool {
        let due = match self.last_emit {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        };
        if due {
            self.last_emit = Some(now);
        }
        due
    }

    /// Records an emission that bypassed the throttle (e.g. the final 100%)
    pub fn mark(&mut self, now: Instant) {
        self.last_emit = Some(now);
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// Completion percentage for `received` out of `total`, clamped to `[0, 100]`
///
/// Returns `None` when the total is unknown or zero.
pub fn percent_complete(received: u64, total: Option<u64>) -> Option<f64> {
    match total {
        Some(total) if total > 0 => {
            let percent = (received as f64 / total as f64) * 100.0;
            Some(percent.clamp(0.0, 100.0))
        }
        _ => None,
    }
}
