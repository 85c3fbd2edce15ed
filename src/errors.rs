//! Error types for channels_fetcher
//!
//! This module defines the error types for every stage of the download
//! pipeline. Errors are designed to be actionable and provide clear context
//! for debugging and user feedback.

use std::path::PathBuf;
use thiserror::Error;

/// Download and HTTP client errors
#[derive(Error, Debug)]
pub enum DownloadError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// File already exists and overwrite not requested
    #[error("File already exists: {path}. Use --force to overwrite")]
    FileExists { path: String },

    /// I/O error during file operations
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid URL provided
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// Server returned error status
    #[error("Server error: HTTP {status}")]
    ServerError { status: u16 },

    /// Resource not found on the server
    #[error("Resource not found: {url}")]
    NotFound { url: String },

    /// Access to the resource was refused
    #[error("Access forbidden: {url}")]
    Forbidden { url: String },

    /// Atomic file operation failed
    #[error("Atomic file operation failed: could not rename {temp_path} to {final_path}")]
    AtomicOperationFailed {
        temp_path: PathBuf,
        final_path: PathBuf,
    },

    /// Building a picture bundle failed
    #[error("Failed to build archive: {reason}")]
    Archive { reason: String },

    /// Task not present in the session's download list
    #[error("Download task not found: {task_id}")]
    TaskNotFound { task_id: String },

    /// Generic error for other issues
    #[error("{0}")]
    Other(String),
}

/// Keystream generation and decryption errors
#[derive(Error, Debug)]
pub enum DecryptError {
    /// No keystream generator is configured
    #[error("No keystream generator configured. Pass --keystream-cmd or --keystream-file")]
    NoKeystreamSource,

    /// The external generator could not be run or failed
    #[error("Keystream generator failed: {0}")]
    ExternalTool(String),

    /// The generator produced no bytes
    #[error("Keystream generator returned no data for seed {seed}")]
    EmptyKeystream { seed: String },

    /// Key material is not usable as a seed
    #[error("Invalid decryption key: {key}")]
    InvalidKey { key: String },

    /// I/O error while reading keystream or ciphertext
    #[error("Decryption I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Profile parsing and selection errors
#[derive(Error, Debug)]
pub enum ProfileError {
    /// Profile file not found
    #[error("Profile file not found: {path}")]
    NotFound { path: PathBuf },

    /// JSON parsing error
    #[error("JSON parsing error in profile: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// I/O error reading a profile
    #[error("I/O error reading profile: {0}")]
    Io(#[from] std::io::Error),

    /// Profile has no download URL
    #[error("Profile {id} has no download URL")]
    MissingUrl { id: String },

    /// Requested format is not offered by the profile
    #[error("Profile {id} has no spec with format {format}")]
    UnknownSpec { id: String, format: String },

    /// Picture profile without images
    #[error("Picture profile {id} contains no images")]
    NoImages { id: String },

    /// Cover URL missing from the profile
    #[error("Profile {id} has no cover URL")]
    MissingCover { id: String },

    /// Filename template produced nothing usable
    #[error("Filename generation failed for profile {id}")]
    FilenameGeneration { id: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format: {0}")]
    InvalidFormat(#[from] toml::de::Error),

    /// Configuration could not be serialized
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// User configuration directory unavailable
    #[error("Could not determine user config directory")]
    NoConfigDir,
}

/// Progress reporting errors
#[derive(Error, Debug)]
pub enum ProgressError {
    /// Progress bar template rejected by indicatif
    #[error("Progress template error: {reason}")]
    Template { reason: String },

    /// Terminal output error
    #[error("Terminal output error: {0}")]
    TerminalError(#[from] std::io::Error),
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Download error
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Decryption error
    #[error(transparent)]
    Decrypt(#[from] DecryptError),

    /// Profile error
    #[error(transparent)]
    Profile(#[from] ProfileError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Progress error
    #[error(transparent)]
    Progress(#[from] ProgressError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if the error is recoverable (transient)
    ///
    /// The pipeline never retries on its own; this only tells the caller
    /// whether re-running the same download could plausibly succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Download(DownloadError::Http(_))
            | AppError::Download(DownloadError::ServerError { .. })
            | AppError::Decrypt(DecryptError::ExternalTool(_)) => true,

            AppError::Download(DownloadError::FileExists { .. })
            | AppError::Download(DownloadError::NotFound { .. })
            | AppError::Download(DownloadError::Forbidden { .. })
            | AppError::Profile(_)
            | AppError::Config(_) => false,

            _ => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Download(_) => "download",
            AppError::Decrypt(_) => "decrypt",
            AppError::Profile(_) => "profile",
            AppError::Config(_) => "config",
            AppError::Progress(_) => "progress",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Download result type alias
pub type DownloadResult<T> = std::result::Result<T, DownloadError>;

/// Decryption result type alias
pub type DecryptResult<T> = std::result::Result<T, DecryptError>;

/// Profile result type alias
pub type ProfileResult<T> = std::result::Result<T, ProfileError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

impl From<zip::result::ZipError> for DownloadError {
    fn from(error: zip::result::ZipError) -> Self {
        DownloadError::Archive {
            reason: error.to_string(),
        }
    }
}
