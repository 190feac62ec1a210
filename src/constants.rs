//! Shared constants used across the application.

use std::time::Duration;

/// User agent string used for every request made against the platform.
///
/// A realistic desktop browser user agent; the post pages only embed their
/// state blob when served to something that looks like a browser.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Referer sent with media downloads.
pub const PLATFORM_REFERER: &str = "https://www.xiaohongshu.com/";

/// Accept header used when fetching post pages.
pub const HTML_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Host serving redirecting share links.
pub const SHORT_LINK_HOST: &str = "xhslink.com";

/// Short-link path segment that never identifies a post.
pub const SHORT_LINK_SENTINEL_SEGMENT: &str = "a";

/// Marker preceding the embedded state assignment in a post page.
pub const STATE_MARKER: &str = "window.__INITIAL_STATE__";

/// Marker closing the script that holds the embedded state.
pub const SCRIPT_CLOSE_MARKER: &str = "</script>";

/// Host prefix for videos addressed by their origin key.
pub const VIDEO_HOST_PREFIX: &str = "https://sns-video-bd.xhscdn.com/";

/// Host prefix for images addressed by trace id.
pub const TRACE_IMAGE_HOST_PREFIX: &str = "https://sns-img-qc.xhscdn.com/";

/// Host prefix for canonical full-resolution images.
pub const CANONICAL_IMAGE_HOST_PREFIX: &str = "https://ci.xiaohongshu.com/";

/// Query suffix requesting PNG output from the canonical image host.
pub const CANONICAL_IMAGE_QUERY: &str = "?imageView2/format/png";

/// Substring identifying the platform's media CDN.
pub const IMAGE_CDN_MARKER: &str = "xhscdn.com";

/// Substring identifying the platform's video CDN hosts.
pub const VIDEO_CDN_MARKER: &str = "sns-video";

/// Extensions treated as videos.
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "avi", "mov", "webm", "wmv", "flv", "mpg", "mpeg", "3gp", "mkv",
];

/// Extensions treated as images.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "heic", "heif"];

/// Timeout for resolving a short link.
pub const REDIRECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Timeout for fetching a post page.
pub const PAGE_TIMEOUT: Duration = Duration::from_secs(45);

/// Timeout for downloading a single media file.
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(90);

/// Connect timeout shared by all clients.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Returns true if `ext` (without dot, any case) is a known media extension.
#[must_use]
pub fn is_media_extension(ext: &str) -> bool {
    let lower = ext.to_ascii_lowercase();
    VIDEO_EXTENSIONS.contains(&lower.as_str()) || IMAGE_EXTENSIONS.contains(&lower.as_str())
}
