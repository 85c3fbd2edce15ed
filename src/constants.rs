//! Application constants for channels_fetcher
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain for maintainability and clarity.

use std::time::Duration;

/// Environment variable names for configuration overrides
pub mod env {
    /// Overrides the download output directory
    pub const OUTPUT_DIR: &str = "CHANNELS_FETCHER_OUTPUT_DIR";

    /// Overrides the external keystream generator program
    pub const KEYSTREAM_CMD: &str = "CHANNELS_FETCHER_KEYSTREAM_CMD";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = "Mozilla/5.0 (channels_fetcher)";

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Maximum idle connections per host in pool
    pub const POOL_MAX_PER_HOST: usize = 8;
}

/// Download pipeline constants
pub mod download {
    use super::Duration;

    /// Minimum spacing between two progress callbacks
    pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(200);

    /// Query parameter that selects an encoding spec on the media URL
    pub const SPEC_QUERY_PARAM: &str = "X-snsvideoflag";

    /// Spec label used when no spec was selected
    pub const ORIGINAL_SPEC: &str = "original";

    /// Upper bound for buffer preallocation from a declared content length
    pub const MAX_PREALLOCATION: u64 = 256 * 1024 * 1024;
}

/// Keystream and decryption constants
pub mod decrypt {
    /// Keystream length requested from the generator (only the head is encrypted)
    pub const DEFAULT_KEYSTREAM_LEN: usize = 131_072;
}

/// File operation constants
pub mod files {
    /// Temporary file suffix for atomic operations
    pub const TEMP_FILE_SUFFIX: &str = ".tmp";

    /// Extension for video downloads
    pub const VIDEO_EXTENSION: &str = "mp4";

    /// Extension for cover images
    pub const COVER_EXTENSION: &str = "jpg";

    /// Extension for picture bundles
    pub const BUNDLE_EXTENSION: &str = "zip";

    /// Extension used for images inside a picture bundle
    pub const IMAGE_EXTENSION: &str = "png";

    /// Directory holding images inside a picture bundle
    pub const BUNDLE_IMAGE_DIR: &str = "images";

    /// Contact metadata entry inside a picture bundle
    pub const BUNDLE_CONTACT_FILE: &str = "contact.txt";

    /// Default output directory
    pub const DEFAULT_OUTPUT_DIR: &str = "downloads";

    /// Maximum filename length in characters
    pub const MAX_FILENAME_CHARS: usize = 200;
}

/// Filename template placeholders
pub mod template {
    /// Default filename template
    pub const DEFAULT_TEMPLATE: &str = "{{title}}";

    pub const ID: &str = "{{id}}";
    pub const TITLE: &str = "{{title}}";
    pub const NICKNAME: &str = "{{nickname}}";
    pub const SPEC: &str = "{{spec}}";
}

/// Session and download list constants
pub mod session {
    /// Maximum number of entries kept in the download list
    pub const MAX_DOWNLOAD_ITEMS: usize = 10;

    /// Length of generated task identifiers
    pub const TASK_ID_LEN: usize = 12;
}

/// Configuration file locations
pub mod config {
    /// Project-local configuration file
    pub const LOCAL_CONFIG_FILE: &str = "channels-fetcher.toml";

    /// Application directory under the user config dir
    pub const CONFIG_DIR_NAME: &str = "channels-fetcher";

    /// Configuration file name under the application directory
    pub const CONFIG_FILE_NAME: &str = "config.toml";
}

/// Logging and debugging constants
pub mod logging {
    /// Default log level
    pub const DEFAULT_LOG_LEVEL: &str = "warn";
}

// Re-export commonly used constants for convenience
pub use decrypt::DEFAULT_KEYSTREAM_LEN;
pub use download::PROGRESS_INTERVAL;
pub use files::TEMP_FILE_SUFFIX;
pub use http::USER_AGENT;
