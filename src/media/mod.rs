//! Media discovery and normalization.
//!
//! Raw URLs are collected from a post's embedded state (or, failing that, its
//! HTML), classified as image or video, rewritten into canonical fetchable
//! form and turned into deduplicated [`RemoteMedia`] descriptors.

mod html_scan;
mod normalize;
mod types;
mod walker;

pub use html_scan::scan_html;
pub use normalize::{canonical_image_url, classify, normalize_media_url, MediaCollector};
pub use types::{random_token, MediaKind, RemoteMedia};
pub use walker::{collect_media_urls, collect_state_urls};
