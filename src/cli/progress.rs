//! Terminal progress display for single downloads
//!
//! [`TransferProgress`] is the CLI's [`ProgressSink`]. On a terminal it
//! draws an indicatif bar: a 0-100 percent bar when the server declared a
//! content length, a byte spinner otherwise. When stderr is not a terminal
//! it falls back to plain text lines at coarse steps.
//!
//! # Examples
//!
//! ```rust,no_run
//! use channels_fetcher::app::ProgressSink;
//! use channels_fetcher::cli::{ProgressConfig, TransferProgress};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut progress = TransferProgress::new("clip", ProgressConfig::default())?;
//! progress.on_start(Some(1024));
//! progress.on_percent(50.0);
//! progress.on_percent(100.0);
//! progress.finish("saved clip.mp4");
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use crate::app::ProgressSink;
use crate::errors::ProgressError;

const PERCENT_TEMPLATE: &str =
    "{spinner:.green} {prefix} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}";
const BYTES_TEMPLATE: &str = "{spinner:.green} {prefix} [{elapsed_precise}] {msg}";

/// Configuration for progress display
#[derive(Debug, Clone)]
pub struct ProgressConfig {
    /// Enable visual progress bars
    pub enable_progress_bars: bool,
    /// Spinner tick rate
    pub tick_interval: Duration,
    /// Percent step between two text-mode lines
    pub text_step: f64,
    /// Maximum width for the label in the display
    pub max_label_width: usize,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            enable_progress_bars: true,
            tick_interval: Duration::from_millis(100),
            text_step: 10.0,
            max_label_width: 40,
        }
    }
}

impl ProgressConfig {
    /// Default configuration with bars switched off
    pub fn disabled() -> Self {
        Self {
            enable_progress_bars: false,
            ..Self::default()
        }
    }
}

enum Display {
    /// Styles are ready, the bar is created once the length is known
    Pending {
        percent_style: ProgressStyle,
        bytes_style: ProgressStyle,
    },
    Bar(ProgressBar),
    Text { last_percent: Option<f64> },
    Hidden,
}

/// Progress display for one transfer
pub struct TransferProgress {
    label: String,
    config: ProgressConfig,
    display: Display,
    total: Option<u64>,
    received: u64,
}

impl TransferProgress {
    /// Create a display labelled `label`
    ///
    /// Bars are drawn only when enabled and stderr is a terminal.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Template` if a bar template is rejected
    pub fn new(label: &str, config: ProgressConfig) -> Result<Self, ProgressError> {
        let is_terminal = atty::is(atty::Stream::Stderr);
        let display = if config.enable_progress_bars && is_terminal {
            Display::Pending {
                percent_style: style(PERCENT_TEMPLATE)?.progress_chars("##-"),
                bytes_style: style(BYTES_TEMPLATE)?,
            }
        } else {
            Display::Text { last_percent: None }
        };

        Ok(Self {
            label: truncate_label(label, config.max_label_width),
            config,
            display,
            total: None,
            received: 0,
        })
    }

    /// A display that prints nothing
    pub fn hidden(label: &str) -> Self {
        Self {
            label: label.to_string(),
            config: ProgressConfig::disabled(),
            display: Display::Hidden,
            total: None,
            received: 0,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Bytes seen so far
    pub fn received(&self) -> u64 {
        self.received
    }

    /// Declared length, if the server sent one
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Close the display with a final message
    pub fn finish(&mut self, message: &str) {
        match &self.display {
            Display::Bar(bar) => bar.finish_with_message(message.to_string()),
            Display::Text { .. } => eprintln!("{}: {}", self.label, message),
            Display::Pending { .. } | Display::Hidden => {}
        }
    }

    /// Close the display after a failure, leaving the bar where it stopped
    pub fn abandon(&mut self, message: &str) {
        match &self.display {
            Display::Bar(bar) => bar.abandon_with_message(message.to_string()),
            Display::Text { .. } => eprintln!("{}: {}", self.label, message),
            Display::Pending { .. } | Display::Hidden => {}
        }
    }
}

impl ProgressSink for TransferProgress {
    fn on_start(&mut self, total: Option<u64>) {
        self.total = total;
        self.received = 0;

        let display = std::mem::replace(&mut self.display, Display::Hidden);
        self.display = match display {
            Display::Pending {
                percent_style,
                bytes_style,
            } => {
                let bar = match total {
                    Some(_) => ProgressBar::new(100).with_style(percent_style),
                    None => ProgressBar::new_spinner().with_style(bytes_style),
                };
                bar.set_prefix(self.label.clone());
                bar.enable_steady_tick(self.config.tick_interval);
                Display::Bar(bar)
            }
            Display::Text { .. } => {
                match total {
                    Some(len) => eprintln!("{}: downloading {}", self.label, format_bytes(len)),
                    None => eprintln!("{}: downloading (size unknown)", self.label),
                }
                Display::Text { last_percent: None }
            }
            other => other,
        };
        debug!("Progress display started for {} ({:?} bytes)", self.label, total);
    }

    fn on_percent(&mut self, percent: f64) {
        let step = self.config.text_step;
        match &mut self.display {
            Display::Bar(bar) => bar.set_position(percent.clamp(0.0, 100.0).round() as u64),
            Display::Text { last_percent } => {
                if should_report(*last_percent, percent, step) {
                    eprintln!("{}: {:.0}%", self.label, percent);
                    *last_percent = Some(percent);
                }
            }
            Display::Pending { .. } | Display::Hidden => {}
        }
    }

    fn on_bytes(&mut self, received: u64) {
        self.received = received;
        if let Display::Bar(bar) = &self.display {
            let message = match self.total {
                Some(len) => format!("{} / {}", format_bytes(received), format_bytes(len)),
                None => format_bytes(received),
            };
            bar.set_message(message);
        }
    }
}

fn style(template: &str) -> Result<ProgressStyle, ProgressError> {
    ProgressStyle::default_bar()
        .template(template)
        .map_err(|e| ProgressError::Template {
            reason: e.to_string(),
        })
}

/// Whether a text-mode line is due for `percent`
///
/// The first update and completion are always reported, anything else only
/// once it moved at least `step` points past the last reported value.
fn should_report(last: Option<f64>, percent: f64, step: f64) -> bool {
    match last {
        None => true,
        Some(last) if percent >= 100.0 => last < 100.0,
        Some(last) => percent - last >= step,
    }
}

fn truncate_label(label: &str, max_width: usize) -> String {
    if label.chars().count() <= max_width {
        return label.to_string();
    }
    let keep = max_width.saturating_sub(3);
    let truncated: String = label.chars().take(keep).collect();
    format!("{}...", truncated)
}

/// Human readable byte count
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
