//! Core application logic for channels_fetcher
//!
//! This module contains the download pipeline and everything it is built
//! from: the HTTP client, progress reporting, keystream decryption, atomic
//! saving, profile models and the session context.
//!
//! # Examples
//!
//! ```rust,no_run
//! use channels_fetcher::app::{Decryptor, FeedClient, Pipeline, Profile, Saver, Session};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = Pipeline::new(FeedClient::new()?, Decryptor::disabled(), Saver::new("downloads"));
//!
//! let mut session = Session::new();
//! let profile = Profile::from_url("14379213584", "https://example.com/video.mp4");
//! let task_id = session.enqueue(&profile, None, "clip")?;
//!
//! let report = pipeline
//!     .run(&mut session, &task_id, &mut |percent: f64| println!("{:.0}%", percent))
//!     .await?;
//! println!("Saved {}", report.path.display());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod decrypt;
pub mod filename;
pub mod models;
pub mod pipeline;
pub mod progress;
pub mod saver;
pub mod session;

// Re-export main public API
pub use client::{collect_body, ClientConfig, FeedClient};
pub use decrypt::{
    xor_decrypt, DecryptOutcome, Decryptor, ExternalKeystream, KeystreamSource, StaticKeystream,
};
pub use filename::{build_filename, sanitize_filename};
pub use models::{
    generate_task_id, load_profiles, parse_profiles, DownloadTask, MediaFile, MediaSpec, Profile,
    ProfileKind, TaskId, TaskStatus,
};
pub use pipeline::{download_command, DownloadReport, Pipeline};
pub use progress::{percent_complete, NoProgress, ProgressSink, ProgressThrottle};
pub use saver::{save_atomic, Saver};
pub use session::{DownloadList, ListSummary, ProfileStore, Session};
