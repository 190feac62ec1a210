//! Fetches resolved media to local files.
//!
//! Each descriptor is downloaded to a temporary file in the output directory
//! and then moved into place as `<prefix>_<session>_<base>.<ext>`, replacing
//! any earlier file with the same name.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use reqwest::header::{ACCEPT, CONTENT_TYPE, REFERER, USER_AGENT};
use reqwest::Client;
use tempfile::NamedTempFile;
use tracing::{debug, info};
use url::Url;

use crate::constants::{BROWSER_USER_AGENT, CONNECT_TIMEOUT, DOWNLOAD_TIMEOUT, PLATFORM_REFERER};
use crate::media::{MediaKind, RemoteMedia};

const IMAGE_ACCEPT: &str = "image/avif,image/webp,image/apng,image/*,*/*;q=0.8";
const VIDEO_ACCEPT: &str = "video/*,*/*;q=0.8";

/// Downloads media for one session.
pub struct Downloader {
    client: Client,
    output_dir: PathBuf,
    prefix: String,
    session: String,
}

impl Downloader {
    /// Create a downloader whose session timestamp is the current local time.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(output_dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .context("Failed to build download client")?;

        Ok(Self {
            client,
            output_dir: output_dir.into(),
            prefix: prefix.into(),
            session: chrono::Local::now().format("%Y%m%d_%H%M%S").to_string(),
        })
    }

    /// Override the session timestamp used in file names.
    #[must_use]
    pub fn with_session(mut self, session: impl Into<String>) -> Self {
        self.session = session.into();
        self
    }

    #[must_use]
    pub fn session(&self) -> &str {
        &self.session
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Final file name for a descriptor with the given extension.
    #[must_use]
    pub fn file_name(&self, media: &RemoteMedia, ext: &str) -> String {
        format!(
            "{}_{}_{}.{ext}",
            self.prefix, self.session, media.file_base_name
        )
    }

    /// Download one descriptor and return the path it was written to.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failures, non-success statuses, or if
    /// the file cannot be written.
    pub async fn download(&self, media: &RemoteMedia) -> Result<PathBuf> {
        let accept = match media.kind {
            MediaKind::Image => IMAGE_ACCEPT,
            MediaKind::Video => VIDEO_ACCEPT,
        };

        debug!(url = %media.url, kind = %media.kind, "Downloading media");
        let response = self
            .client
            .get(media.url.clone())
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .header(REFERER, PLATFORM_REFERER)
            .header(ACCEPT, accept)
            .send()
            .await
            .with_context(|| format!("Failed to request {}", media.url))?
            .error_for_status()
            .with_context(|| format!("Download of {} returned error", media.url))?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read body of {}", media.url))?;

        let ext = choose_extension(content_type.as_deref(), &media.url, media.kind);
        let dest = self.output_dir.join(self.file_name(media, &ext));

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| {
                format!(
                    "Failed to create output directory: {}",
                    self.output_dir.display()
                )
            })?;

        let dir = self.output_dir.clone();
        let target = dest.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut tmp = NamedTempFile::new_in(&dir).context("Failed to create temp file")?;
            tmp.write_all(&bytes).context("Failed to write temp file")?;
            tmp.flush()?;
            tmp.persist(&target)
                .map_err(|e| e.error)
                .with_context(|| format!("Failed to move download to {}", target.display()))?;
            Ok(())
        })
        .await
        .context("Download writer task failed")??;

        info!(path = %dest.display(), url = %media.url, "Saved media");
        Ok(dest)
    }
}

/// Pick a file extension: response content type, then URL path, then the
/// default for the media kind.
#[must_use]
pub fn choose_extension(content_type: Option<&str>, url: &Url, kind: MediaKind) -> String {
    content_type
        .and_then(extension_for_content_type)
        .map(str::to_string)
        .or_else(|| extension_from_url(url))
        .unwrap_or_else(|| kind.default_extension().to_string())
}

/// Map an image or video content type to an extension.
#[must_use]
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    let ext = match essence.as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "image/heic" => "heic",
        "image/heif" => "heif",
        "video/mp4" => "mp4",
        "video/quicktime" => "mov",
        "video/webm" => "webm",
        other if other.starts_with("image/") || other.starts_with("video/") => {
            return mime_guess::get_mime_extensions_str(other)
                .and_then(|exts| exts.first())
                .copied();
        }
        _ => return None,
    };
    Some(ext)
}

/// Extension of the URL path, if it names an image or video type.
#[must_use]
pub fn extension_from_url(url: &Url) -> Option<String> {
    let ext = Path::new(url.path()).extension()?.to_str()?.to_ascii_lowercase();
    let mime = mime_guess::from_ext(&ext).first_raw()?;
    (mime.starts_with("image/") || mime.starts_with("video/")).then_some(ext)
}
