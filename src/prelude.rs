//! Prelude module for the channels_fetcher library
//!
//! Re-exports the items needed for typical usage with a single
//! `use channels_fetcher::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use channels_fetcher::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let source = Arc::new(ExternalKeystream::new(PathBuf::from("keystream-gen")));
//!     let pipeline = Pipeline::new(
//!         FeedClient::new()?,
//!         Decryptor::new(source),
//!         Saver::new("downloads"),
//!     );
//!
//!     let mut session = Session::new();
//!     for profile in load_profiles(Path::new("profiles.json")).await? {
//!         let filename = build_filename(&profile, None, "{{title}}")?;
//!         let id = session.enqueue(&profile, None, filename)?;
//!         pipeline.run(&mut session, &id, &mut NoProgress).await?;
//!     }
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, Result};

pub use crate::app::{
    build_filename,
    load_profiles,
    // Pipeline pieces
    ClientConfig,
    DecryptOutcome,
    Decryptor,
    DownloadReport,
    ExternalKeystream,
    FeedClient,
    KeystreamSource,
    NoProgress,
    Pipeline,
    // Data types
    Profile,
    ProfileKind,
    ProgressSink,
    Saver,
    Session,
    StaticKeystream,
    TaskStatus,
};

pub use crate::config::AppConfig;

// Commonly used constants
pub use crate::constants::{DEFAULT_KEYSTREAM_LEN, PROGRESS_INTERVAL, USER_AGENT};

// Standard library re-exports that are commonly needed
pub use std::path::{Path, PathBuf};
pub use std::sync::Arc;

pub use tokio;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_imports() {
        let _client_config = ClientConfig::default();
        let _app_config = AppConfig::default();
        let decryptor = Decryptor::new(Arc::new(StaticKeystream::new(vec![1, 2, 3])));
        assert!(decryptor.has_source());
        assert_eq!(decryptor.keystream_len(), DEFAULT_KEYSTREAM_LEN);
    }

    #[tokio::test]
    async fn test_prelude_integration_pattern() {
        use tempfile::TempDir;

        let temp_dir = TempDir::new().unwrap();
        let pipeline = Pipeline::new(
            FeedClient::new().unwrap(),
            Decryptor::disabled(),
            Saver::new(temp_dir.path()),
        );
        assert_eq!(pipeline.saver().output_dir(), temp_dir.path());

        let mut session = Session::new();
        let profile = Profile::from_url("1", "https://example.com/v.mp4");
        let filename = build_filename(&profile, None, "{{id}}").unwrap();
        let id = session.enqueue(&profile, None, filename).unwrap();
        assert_eq!(
            session.downloads.get(&id).map(|t| t.status),
            Some(TaskStatus::Pending)
        );
    }
}
