use std::collections::HashSet;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use tracing::debug;
use url::Url;

use super::types::{random_token, MediaKind, RemoteMedia};
use crate::constants::{
    CANONICAL_IMAGE_HOST_PREFIX, CANONICAL_IMAGE_QUERY, IMAGE_CDN_MARKER, VIDEO_CDN_MARKER,
    VIDEO_EXTENSIONS,
};

/// Characters escaped before parsing: the URL fragment set plus a few that
/// show up unescaped in scraped markup. `%` is left alone so existing
/// escapes survive.
const UNSAFE_URL_CHARS: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'|')
    .add(b'^');

/// Number of leading `/`-separated parts (scheme, empty, host and two leading
/// directories) that precede the image token on CDN URLs.
const CDN_TOKEN_START: usize = 5;

/// Length of identifiers minted for descriptors.
const MEDIA_ID_LEN: usize = 16;

/// Classify a raw URL as image or video.
///
/// Anything mentioning a video extension, "video", "stream" or the video CDN
/// is a video. This is a heuristic: an image whose path happens to contain
/// "video" or "stream" is misclassified.
#[must_use]
pub fn classify(url: &str) -> MediaKind {
    let lower = url.to_ascii_lowercase();
    let has_video_extension = VIDEO_EXTENSIONS
        .iter()
        .any(|ext| lower.contains(&format!(".{ext}")));

    if has_video_extension
        || lower.contains("video")
        || lower.contains("stream")
        || lower.contains(VIDEO_CDN_MARKER)
    {
        MediaKind::Video
    } else {
        MediaKind::Image
    }
}

/// Rewrite a CDN image URL to the canonical PNG endpoint.
///
/// Returns `None` when no image token can be derived, in which case the
/// original URL should be used unchanged.
#[must_use]
pub fn canonical_image_url(raw: &str) -> Option<String> {
    let unescaped = raw.replace("\\/", "/").replace('\\', "");
    let trimmed = unescaped.trim();
    let from_http = &trimmed[trimmed.find("http")?..];

    let parts: Vec<&str> = from_http.split('/').collect();
    if parts.len() <= CDN_TOKEN_START {
        return None;
    }

    let token = parts[CDN_TOKEN_START..].join("/");
    let token = token.split('!').next().unwrap_or_default();
    let token = token.split('?').next().unwrap_or_default();
    if token.is_empty() {
        return None;
    }

    Some(format!(
        "{CANONICAL_IMAGE_HOST_PREFIX}{token}{CANONICAL_IMAGE_QUERY}"
    ))
}

/// Classify and normalize one raw URL into a fetchable [`Url`].
///
/// CDN images are rewritten to their canonical form; videos and off-CDN
/// URLs pass through. Returns `None` for anything that does not parse as an
/// http(s) URL after escaping.
#[must_use]
pub fn normalize_media_url(raw: &str) -> Option<(Url, MediaKind)> {
    let kind = classify(raw);

    let candidate = if kind == MediaKind::Image && raw.contains(IMAGE_CDN_MARKER) {
        canonical_image_url(raw).unwrap_or_else(|| raw.to_string())
    } else {
        raw.to_string()
    };

    let encoded = utf8_percent_encode(candidate.trim(), UNSAFE_URL_CHARS).to_string();
    match Url::parse(&encoded) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Some((url, kind)),
        Ok(url) => {
            debug!(url = %url, "Dropping media URL with unsupported scheme");
            None
        }
        Err(e) => {
            debug!(raw = %raw, error = %e, "Dropping unparseable media URL");
            None
        }
    }
}

/// Builds the deduplicated descriptor list for one pipeline run.
///
/// Deduplication is keyed on the raw URL as discovered, across every post
/// added to the collector. Ordinals are the 1-based position in the output,
/// so base names stay unique for the whole run.
#[derive(Debug, Default)]
pub struct MediaCollector {
    seen: HashSet<String>,
    media: Vec<RemoteMedia>,
}

impl MediaCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize and append the raw URLs found for one post.
    ///
    /// `name_stem` is the post id (or a random stand-in). Returns the number
    /// of descriptors added.
    pub fn add_post<I, S>(&mut self, raw_urls: I, name_stem: &str) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let before = self.media.len();

        for raw in raw_urls {
            let raw = raw.as_ref();
            if self.seen.contains(raw) {
                continue;
            }
            let Some((url, kind)) = normalize_media_url(raw) else {
                continue;
            };
            self.seen.insert(raw.to_string());

            let ordinal = self.media.len() + 1;
            self.media.push(RemoteMedia {
                id: random_token(MEDIA_ID_LEN),
                url,
                kind,
                file_base_name: format!("{name_stem}_{ordinal}"),
                original_url: raw.to_string(),
            });
        }

        self.media.len() - before
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.media.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.media.is_empty()
    }

    #[must_use]
    pub fn media(&self) -> &[RemoteMedia] {
        &self.media
    }

    #[must_use]
    pub fn into_media(self) -> Vec<RemoteMedia> {
        self.media
    }
}
