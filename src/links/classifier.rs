use std::fmt;

use regex::Regex;

/// Which link form a token matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    /// Redirecting short link that must be resolved before use.
    Short,
    /// `/discovery/item/<id>` post link.
    DiscoveryItem,
    /// `/explore/<id>` post link.
    Explore,
    /// `/user/profile/<uid>` link, optionally with a post id.
    UserProfile,
}

impl LinkKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::DiscoveryItem => "discovery-item",
            Self::Explore => "explore",
            Self::UserProfile => "user-profile",
        }
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A link substring found in user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedLink {
    pub url: String,
    pub kind: LinkKind,
}

impl ExtractedLink {
    #[must_use]
    pub fn new(url: impl Into<String>, kind: LinkKind) -> Self {
        Self {
            url: url.into(),
            kind,
        }
    }
}

// Matches stop at the first character outside the ASCII URL alphabet so that
// share text like "http://xhslink.com/a/abc，复制本条信息" yields only the URL.
static PATTERNS: std::sync::LazyLock<Vec<(LinkKind, Regex)>> = std::sync::LazyLock::new(|| {
    vec![
        (
            LinkKind::Short,
            Regex::new(r"https?://xhslink\.com/[A-Za-z0-9/_-]+").unwrap(),
        ),
        (
            LinkKind::DiscoveryItem,
            Regex::new(
                r"https?://(?:www\.)?xiaohongshu\.com/discovery/item/[A-Za-z0-9]+(?:\?[A-Za-z0-9_.~%=&+-]*)?",
            )
            .unwrap(),
        ),
        (
            LinkKind::Explore,
            Regex::new(
                r"https?://(?:www\.)?xiaohongshu\.com/explore/[A-Za-z0-9]+(?:\?[A-Za-z0-9_.~%=&+-]*)?",
            )
            .unwrap(),
        ),
        (
            LinkKind::UserProfile,
            Regex::new(
                r"https?://(?:www\.)?xiaohongshu\.com/user/profile/[A-Za-z0-9]+(?:/[A-Za-z0-9]+)?(?:\?[A-Za-z0-9_.~%=&+-]*)?",
            )
            .unwrap(),
        ),
    ]
});

/// Extract supported links from free text.
///
/// Each whitespace-delimited token is tested against the link forms in
/// priority order and contributes at most one link. Order of appearance is
/// preserved and duplicates are kept; an empty result means no links.
#[must_use]
pub fn extract_links(text: &str) -> Vec<ExtractedLink> {
    text.split_whitespace()
        .filter_map(|token| {
            PATTERNS.iter().find_map(|(kind, pattern)| {
                pattern
                    .find(token)
                    .map(|m| ExtractedLink::new(m.as_str(), *kind))
            })
        })
        .collect()
}
