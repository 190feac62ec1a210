use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use crate::constants::{BROWSER_USER_AGENT, HTML_ACCEPT, PAGE_TIMEOUT};

/// Why a post page could not be retrieved.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected HTTP status {0}")]
    Status(reqwest::StatusCode),
}

/// Fetch the HTML document of a resolved post URL.
///
/// Only 2xx responses are accepted.
///
/// # Errors
///
/// Returns a [`PageError`] for transport failures and non-success statuses.
pub async fn fetch_page(client: &Client, url: &str) -> Result<String, PageError> {
    let response = client
        .get(url)
        .header(USER_AGENT, BROWSER_USER_AGENT)
        .header(ACCEPT, HTML_ACCEPT)
        .timeout(PAGE_TIMEOUT)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(PageError::Status(status));
    }

    let bytes = response.bytes().await?;
    debug!(url = %url, bytes = bytes.len(), "Fetched post page");

    Ok(decode_html_bytes(&bytes))
}

/// Decode a page body as UTF-8, falling back to Windows-1252.
///
/// Windows-1252 assigns a character to every byte, so decoding never fails;
/// a mislabelled page degrades to mojibake rather than being dropped.
#[must_use]
pub fn decode_html_bytes(bytes: &[u8]) -> String {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return text.to_string();
    }
    let (text, _) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(bytes);
    text.into_owned()
}
