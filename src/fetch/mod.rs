//! Network access for the resolution pipeline.

mod page;
mod redirect;

pub use page::{decode_html_bytes, fetch_page, PageError};
pub use redirect::resolve_redirect;

use anyhow::{Context, Result};
use reqwest::Client;

use crate::constants::{BROWSER_USER_AGENT, CONNECT_TIMEOUT};

/// Maximum redirects followed when resolving a short link.
const MAX_REDIRECTS: usize = 10;

/// Build the HTTP client shared by redirect resolution and page fetching.
///
/// No cookie store is attached, so every run starts from an empty session.
/// Per-request timeouts are applied by the callers.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialized.
pub fn build_client() -> Result<Client> {
    Client::builder()
        .user_agent(BROWSER_USER_AGENT)
        .connect_timeout(CONNECT_TIMEOUT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()
        .context("Failed to build HTTP client")
}
