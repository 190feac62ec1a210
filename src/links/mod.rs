//! Share-link discovery and identification.
//!
//! Free-form share text is split into tokens, each token is classified against
//! the platform's link forms, and resolved URLs are reduced to a post id.

mod classifier;
mod post_id;

pub use classifier::{extract_links, ExtractedLink, LinkKind};
pub use post_id::extract_post_id;

/// A link after optional redirect resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkContext {
    /// The link as it appeared in the input text.
    pub source_url: String,
    /// The URL the post page is fetched from.
    pub resolved_url: String,
    /// Stable post identifier, when one could be derived.
    pub post_id: Option<String>,
}
