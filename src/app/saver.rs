//! Atomic file saving
//!
//! Buffers are written to a sibling `.tmp` file, flushed and then renamed
//! into place, so an interrupted save never leaves a truncated output behind.

use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::constants::files;
use crate::errors::{DownloadError, DownloadResult};

/// Writes finished downloads into an output directory
#[derive(Debug, Clone)]
pub struct Saver {
    output_dir: PathBuf,
    overwrite: bool,
}

impl Saver {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            overwrite: false,
        }
    }

    /// Allow replacing existing files
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Destination for `filename` with `extension`
    pub fn destination(&self, filename: &str, extension: &str) -> PathBuf {
        self.output_dir.join(format!("{}.{}", filename, extension))
    }

    /// Save `bytes` as `<output_dir>/<filename>.<extension>`
    ///
    /// # Errors
    ///
    /// Returns `DownloadError::FileExists` if the destination exists and
    /// overwriting is disabled, or an I/O error if writing fails
    pub async fn save(
        &self,
        filename: &str,
        extension: &str,
        bytes: &[u8],
    ) -> DownloadResult<PathBuf> {
        let destination = self.destination(filename, extension);
        save_atomic(&destination, bytes, self.overwrite).await?;
        Ok(destination)
    }
}

/// Temporary sibling path used while writing `destination`
pub fn temp_path_for(destination: &Path) -> PathBuf {
    destination.with_extension(format!(
        "{}{}",
        destination
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or(""),
        files::TEMP_FILE_SUFFIX
    ))
}

/// Write `bytes` to `destination` via temp file and rename
///
/// # Errors
///
/// Returns `DownloadError` if:
/// - The file already exists and `overwrite` is false
/// - The parent directory cannot be created
/// - Writing or renaming fails (the temp file is removed)
pub async fn save_atomic(destination: &Path, bytes: &[u8], overwrite: bool) -> DownloadResult<()> {
    if destination.exists() && !overwrite {
        return Err(DownloadError::FileExists {
            path: destination.display().to_string(),
        });
    }

    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let temp_path = temp_path_for(destination);

    if let Err(e) = write_temp(&temp_path, bytes).await {
        if temp_path.exists() {
            let _ = tokio::fs::remove_file(&temp_path).await;
        }
        return Err(e);
    }

    if tokio::fs::rename(&temp_path, destination).await.is_err() {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(DownloadError::AtomicOperationFailed {
            temp_path,
            final_path: destination.to_path_buf(),
        });
    }

    tracing::info!("Saved {} ({} bytes)", destination.display(), bytes.len());
    Ok(())
}

async fn write_temp(temp_path: &Path, bytes: &[u8]) -> DownloadResult<()> {
    let mut file = File::create(temp_path).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_all().await?;
    Ok(())
}
