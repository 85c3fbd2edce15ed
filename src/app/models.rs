//! Data models for channels_fetcher
//!
//! This module defines the core data structures used throughout the application:
//! feed profiles as captured from the page, their encoding specs, and the
//! transient download task records kept by a session.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::{download, session};
use crate::errors::{ProfileError, ProfileResult};

/// Kind of feed asset a profile describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    /// Video (possibly encrypted)
    #[default]
    Media,
    /// Image carousel
    Picture,
}

impl std::fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileKind::Media => write!(f, "media"),
            ProfileKind::Picture => write!(f, "picture"),
        }
    }
}

/// One encoding variant offered for a video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaSpec {
    /// Format identifier, e.g. "xWT111"
    pub file_format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<u32>,
}

impl MediaSpec {
    /// Human readable label, e.g. "xWT111 (1080x1920)"
    pub fn label(&self) -> String {
        match (self.width, self.height) {
            (Some(w), Some(h)) => format!("{} ({}x{})", self.file_format, w, h),
            _ => self.file_format.clone(),
        }
    }
}

/// Image entry of a picture profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaFile {
    pub url: String,
}

/// Metadata describing a feed asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: ProfileKind,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub url: String,
    /// Decryption seed; absent for unencrypted assets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub spec: Vec<MediaSpec>,
    #[serde(default)]
    pub files: Vec<MediaFile>,
    /// Author contact card, stored as-is
    #[serde(default)]
    pub contact: serde_json::Value,
}

impl Profile {
    /// Minimal media profile, mostly useful for direct URL downloads
    pub fn from_url(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ProfileKind::Media,
            title: String::new(),
            nickname: String::new(),
            url: url.into(),
            key: None,
            cover_url: None,
            spec: Vec::new(),
            files: Vec::new(),
            contact: serde_json::Value::Null,
        }
    }

    pub fn with_key(mut self, key: Option<String>) -> Self {
        self.key = key.filter(|k| !k.trim().is_empty());
        self
    }

    pub fn is_encrypted(&self) -> bool {
        self.key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Choose the encoding spec to download
    ///
    /// An explicit `requested_format` must match one of the offered specs.
    /// Otherwise `default_highest` selects no spec (the unmodified URL serves
    /// the highest quality) and the first offered spec is used if not.
    pub fn select_spec(
        &self,
        default_highest: bool,
        requested_format: Option<&str>,
    ) -> ProfileResult<Option<&MediaSpec>> {
        if let Some(format) = requested_format {
            return self
                .spec
                .iter()
                .find(|s| s.file_format == format)
                .map(Some)
                .ok_or_else(|| ProfileError::UnknownSpec {
                    id: self.id.clone(),
                    format: format.to_string(),
                });
        }

        if default_highest {
            Ok(None)
        } else {
            Ok(self.spec.first())
        }
    }

    /// Download URL for the given spec
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::MissingUrl` when the profile has no URL
    pub fn spec_url(&self, spec: Option<&MediaSpec>) -> ProfileResult<String> {
        if self.url.trim().is_empty() {
            return Err(ProfileError::MissingUrl {
                id: self.id.clone(),
            });
        }

        let Some(spec) = spec else {
            return Ok(self.url.clone());
        };

        match Url::parse(&self.url) {
            Ok(mut url) => {
                url.query_pairs_mut()
                    .append_pair(download::SPEC_QUERY_PARAM, &spec.file_format);
                Ok(url.to_string())
            }
            Err(_) => Ok(format!(
                "{}&{}={}",
                self.url,
                download::SPEC_QUERY_PARAM,
                spec.file_format
            )),
        }
    }

    /// Cover image URL, upgraded to https
    pub fn cover_download_url(&self) -> ProfileResult<String> {
        let cover = self
            .cover_url
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ProfileError::MissingCover {
                id: self.id.clone(),
            })?;

        match Url::parse(cover) {
            Ok(mut url) if url.scheme() == "http" => {
                if url.set_scheme("https").is_err() {
                    return Ok(cover.to_string());
                }
                Ok(url.to_string())
            }
            _ => Ok(cover.to_string()),
        }
    }

    /// Image URLs of a picture profile
    pub fn image_urls(&self) -> ProfileResult<Vec<&str>> {
        if self.files.is_empty() {
            return Err(ProfileError::NoImages {
                id: self.id.clone(),
            });
        }
        Ok(self.files.iter().map(|f| f.url.as_str()).collect())
    }
}

/// Spec label used for deduplication and filenames
pub fn spec_format(spec: Option<&MediaSpec>) -> &str {
    spec.map(|s| s.file_format.as_str())
        .unwrap_or(download::ORIGINAL_SPEC)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ProfileDocument {
    Many(Vec<Profile>),
    One(Box<Profile>),
}

/// Parse a JSON document holding one profile or an array of profiles
pub fn parse_profiles(json: &str) -> ProfileResult<Vec<Profile>> {
    let document: ProfileDocument = serde_json::from_str(json)?;
    Ok(match document {
        ProfileDocument::Many(profiles) => profiles,
        ProfileDocument::One(profile) => vec![*profile],
    })
}

/// Load profiles from a JSON file
pub async fn load_profiles(path: &Path) -> ProfileResult<Vec<Profile>> {
    if !path.exists() {
        return Err(ProfileError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let content = tokio::fs::read_to_string(path).await?;
    let profiles = parse_profiles(&content)?;
    tracing::debug!("Loaded {} profile(s) from {}", profiles.len(), path.display());
    Ok(profiles)
}

/// Lifecycle of a download task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Active,
    Done,
    Failed,
}

impl TaskStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Failed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Active => "active",
            TaskStatus::Done => "done",
            TaskStatus::Failed => "failed",
        };
        write!(f, "{}", label)
    }
}

/// Identifier of a download task within a session
pub type TaskId = String;

/// Transient record of one download
#[derive(Debug, Clone, Serialize)]
pub struct DownloadTask {
    pub id: TaskId,
    pub profile_id: String,
    /// Chosen spec format, or "original"
    pub spec_format: String,
    pub url: String,
    pub key: Option<String>,
    /// Base filename without extension
    pub filename: String,
    /// Content length declared by the server, once known
    pub expected_len: Option<u64>,
    pub received: u64,
    /// Completion percentage in [0, 100]
    pub progress: f64,
    pub status: TaskStatus,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl DownloadTask {
    /// Create a pending task
    pub fn new(
        profile_id: impl Into<String>,
        spec_format: impl Into<String>,
        url: impl Into<String>,
        key: Option<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            id: generate_task_id(),
            profile_id: profile_id.into(),
            spec_format: spec_format.into(),
            url: url.into(),
            key,
            filename: filename.into(),
            expected_len: None,
            received: 0,
            progress: 0.0,
            status: TaskStatus::Pending,
            error: None,
            created_at: Utc::now(),
        }
    }

    /// Record progress while active, clamped to `[0, 100]`
    pub fn set_progress(&mut self, percent: f64) -> bool {
        if self.status != TaskStatus::Active || percent.is_nan() {
            return false;
        }
        self.progress = percent.clamp(0.0, 100.0);
        true
    }

    /// Put the task back to a fresh active state
    pub fn restart(&mut self, filename: impl Into<String>) {
        self.filename = filename.into();
        self.status = TaskStatus::Active;
        self.progress = 0.0;
        self.received = 0;
        self.expected_len = None;
        self.error = None;
        self.created_at = Utc::now();
    }
}

/// Generate a short random task identifier
pub fn generate_task_id() -> TaskId {
    std::iter::repeat_with(fastrand::alphanumeric)
        .take(session::TASK_ID_LEN)
        .collect()
}
