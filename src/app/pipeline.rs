//! Download pipeline: fetch, report progress, decrypt, save
//!
//! [`Pipeline::run`] drives one task of a [`Session`] through the whole
//! chain and mirrors its progress into the task record. Picture bundles,
//! cover images and offline decryption reuse the same client, decryptor and
//! saver.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use futures::future::try_join_all;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::app::client::FeedClient;
use crate::app::decrypt::{DecryptOutcome, Decryptor};
use crate::app::models::{DownloadTask, Profile, TaskStatus};
use crate::app::progress::ProgressSink;
use crate::app::saver::{save_atomic, Saver};
use crate::app::session::Session;
use crate::constants::files;
use crate::errors::{DownloadError, DownloadResult, Result};

/// Outcome of a completed pipeline run
#[derive(Debug, Clone)]
pub struct DownloadReport {
    pub task_id: String,
    pub path: PathBuf,
    pub bytes: usize,
    pub decrypt: DecryptOutcome,
}

/// Fetcher, decryptor and saver wired together
#[derive(Debug, Clone)]
pub struct Pipeline {
    client: FeedClient,
    decryptor: Decryptor,
    saver: Saver,
}

impl Pipeline {
    pub fn new(client: FeedClient, decryptor: Decryptor, saver: Saver) -> Self {
        Self {
            client,
            decryptor,
            saver,
        }
    }

    pub fn client(&self) -> &FeedClient {
        &self.client
    }

    pub fn saver(&self) -> &Saver {
        &self.saver
    }

    /// Download, decrypt and save the task `task_id` of `session`
    ///
    /// The task is marked active, its progress follows the download and it
    /// ends up done or failed. Decryption problems do not fail the task: the
    /// undecrypted data is saved and the report says why.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if the task is unknown, the fetch fails or
    /// the file cannot be saved
    pub async fn run<S>(
        &self,
        session: &mut Session,
        task_id: &str,
        sink: &mut S,
    ) -> DownloadResult<DownloadReport>
    where
        S: ProgressSink + ?Sized,
    {
        let (url, key, filename) = {
            let task = task_mut(session, task_id)?;
            task.status = TaskStatus::Active;
            task.error = None;
            task.received = 0;
            task.progress = 0.0;
            (task.url.clone(), task.key.clone(), task.filename.clone())
        };
        tracing::info!("Downloading {} [{}]", filename, task_id);

        let fetched = {
            let task = task_mut(session, task_id)?;
            let mut progress = TaskProgress { task, inner: sink };
            self.client.download(&url, &mut progress).await
        };
        let mut buffer = match fetched {
            Ok(buffer) => buffer,
            Err(e) => return Err(fail_task(session, task_id, e)),
        };

        let decrypt = self
            .decryptor
            .decrypt_or_passthrough(&mut buffer, key.as_deref())
            .await;

        let path = match self
            .saver
            .save(&filename, files::VIDEO_EXTENSION, &buffer)
            .await
        {
            Ok(path) => path,
            Err(e) => return Err(fail_task(session, task_id, e)),
        };

        if let Some(task) = session.downloads.get_mut(task_id) {
            task.received = buffer.len() as u64;
        }
        session
            .downloads
            .update_status(task_id, TaskStatus::Done, None);
        tracing::info!("Completed {} ({} bytes)", path.display(), buffer.len());

        Ok(DownloadReport {
            task_id: task_id.to_string(),
            path,
            bytes: buffer.len(),
            decrypt,
        })
    }

    /// Fetch every image of a picture profile and save them as a zip bundle
    ///
    /// The archive holds `contact.txt` with the author contact card and the
    /// images as `images/1.png`, `images/2.png`, ...
    ///
    /// # Errors
    ///
    /// Returns an error if the profile has no images, any image fails to
    /// download or the archive cannot be written
    pub async fn download_pictures(&self, profile: &Profile, filename: &str) -> Result<PathBuf> {
        let urls = profile.image_urls()?;
        tracing::info!("Fetching {} images for {}", urls.len(), profile.id);

        let images = try_join_all(urls.iter().map(|url| self.client.fetch_bytes(url))).await?;
        let bundle = build_picture_bundle(&profile.contact, &images)?;

        let path = self
            .saver
            .save(filename, files::BUNDLE_EXTENSION, &bundle)
            .await?;
        Ok(path)
    }

    /// Fetch the cover image of a profile and save it as `<filename>.jpg`
    ///
    /// # Errors
    ///
    /// Returns an error if the profile has no cover or the fetch fails
    pub async fn download_cover(&self, profile: &Profile, filename: &str) -> Result<PathBuf> {
        let url = profile.cover_download_url()?;
        tracing::debug!("Fetching cover {}", url);

        let bytes = self.client.fetch_bytes(&url).await?;
        let path = self
            .saver
            .save(filename, files::COVER_EXTENSION, &bytes)
            .await?;
        Ok(path)
    }

    /// Decrypt an already downloaded file
    ///
    /// Unlike [`Pipeline::run`], a keystream failure is an error here.
    /// Without `output` the result goes next to the input as
    /// `<stem>_decrypted.<ext>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be read, the keystream cannot
    /// be produced or the output cannot be written
    pub async fn decrypt_file(
        &self,
        input: &Path,
        key: &str,
        output: Option<&Path>,
    ) -> Result<PathBuf> {
        let mut buffer = tokio::fs::read(input).await?;
        let bytes = self.decryptor.decrypt(&mut buffer, key).await?;

        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| decrypted_path(input));
        save_atomic(&output, &buffer, self.saver.overwrite()).await?;

        tracing::info!(
            "Decrypted {} bytes of {} into {}",
            bytes,
            input.display(),
            output.display()
        );
        Ok(output)
    }
}

/// Progress sink that mirrors updates into a task record
struct TaskProgress<'a, S: ?Sized> {
    task: &'a mut DownloadTask,
    inner: &'a mut S,
}

impl<S> ProgressSink for TaskProgress<'_, S>
where
    S: ProgressSink + ?Sized,
{
    fn on_start(&mut self, total: Option<u64>) {
        self.task.expected_len = total;
        self.inner.on_start(total);
    }

    fn on_percent(&mut self, percent: f64) {
        self.task.set_progress(percent);
        self.inner.on_percent(percent);
    }

    fn on_bytes(&mut self, received: u64) {
        self.task.received = received;
        self.inner.on_bytes(received);
    }
}

fn task_mut<'a>(session: &'a mut Session, task_id: &str) -> DownloadResult<&'a mut DownloadTask> {
    session
        .downloads
        .get_mut(task_id)
        .ok_or_else(|| DownloadError::TaskNotFound {
            task_id: task_id.to_string(),
        })
}

fn fail_task(session: &mut Session, task_id: &str, error: DownloadError) -> DownloadError {
    tracing::error!("Download {} failed: {}", task_id, error);
    session
        .downloads
        .update_status(task_id, TaskStatus::Failed, Some(error.to_string()));
    error
}

/// Zip a picture profile's contact card and images
pub fn build_picture_bundle(
    contact: &serde_json::Value,
    images: &[Vec<u8>],
) -> DownloadResult<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Stored);

    let contact = serde_json::to_string_pretty(contact).map_err(|e| DownloadError::Archive {
        reason: e.to_string(),
    })?;
    writer.start_file(files::BUNDLE_CONTACT_FILE, options)?;
    writer.write_all(contact.as_bytes())?;

    writer.add_directory(format!("{}/", files::BUNDLE_IMAGE_DIR), options)?;
    for (index, image) in images.iter().enumerate() {
        let name = format!(
            "{}/{}.{}",
            files::BUNDLE_IMAGE_DIR,
            index + 1,
            files::IMAGE_EXTENSION
        );
        writer.start_file(name, options)?;
        writer.write_all(image)?;
    }

    Ok(writer.finish()?.into_inner())
}

/// Default output path for offline decryption
pub fn decrypted_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match input.extension() {
        Some(ext) => format!("{}_decrypted.{}", stem, ext.to_string_lossy()),
        None => format!("{}_decrypted", stem),
    };
    input.with_file_name(name)
}

/// Equivalent command line for downloading `url` outside the session
pub fn download_command(url: &str, key: Option<&str>, filename: &str) -> String {
    let mut command = format!("download --url \"{}\"", url);
    if let Some(key) = key.map(str::trim).filter(|k| !k.is_empty()) {
        command.push_str(&format!(" --key {}", key));
    }
    command.push_str(&format!(
        " --filename \"{}.{}\"",
        filename,
        files::VIDEO_EXTENSION
    ));
    command
}
