use std::fmt;

use rand::{distributions::Alphanumeric, thread_rng, Rng};
use serde::Serialize;
use url::Url;

/// Best-effort classification of a media URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// File extension used when neither the response nor the URL names one.
    #[must_use]
    pub const fn default_extension(self) -> &'static str {
        match self {
            Self::Image => "jpg",
            Self::Video => "mp4",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved, downloadable media resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteMedia {
    /// Opaque unique token.
    pub id: String,
    /// Canonical URL to fetch.
    pub url: Url,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    /// Output name without prefix or extension.
    pub file_base_name: String,
    /// URL as discovered, before normalization. Deduplication key.
    pub original_url: String,
}

/// Generate a random alphanumeric token.
#[must_use]
pub fn random_token(len: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
