use regex::Regex;
use url::Url;

use crate::constants::{SHORT_LINK_HOST, SHORT_LINK_SENTINEL_SEGMENT};

static POST_PATH: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r"/(?:explore|discovery/item)/([A-Za-z0-9]+)").unwrap()
});

static PROFILE_PATH: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r"/user/profile/(?:[A-Za-z0-9]+/)?([A-Za-z0-9]+)").unwrap()
});

/// Derive a post identifier from a resolved post URL.
///
/// Post-style paths win over profile-style paths. Short links that could not
/// be resolved fall back to their trailing path segment.
#[must_use]
pub fn extract_post_id(url: &str) -> Option<String> {
    for pattern in [&*POST_PATH, &*PROFILE_PATH] {
        if let Some(id) = pattern.captures(url).and_then(|caps| caps.get(1)) {
            return Some(id.as_str().to_string());
        }
    }

    let parsed = Url::parse(url).ok()?;
    if !parsed
        .host_str()
        .is_some_and(|host| host.ends_with(SHORT_LINK_HOST))
    {
        return None;
    }

    let segments: Vec<&str> = parsed.path_segments()?.collect();
    segments
        .iter()
        .rev()
        .take(2)
        .find(|s| !s.is_empty() && **s != SHORT_LINK_SENTINEL_SEGMENT)
        .map(|s| (*s).to_string())
}
