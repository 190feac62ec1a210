use reqwest::Client;
use tracing::debug;

use crate::constants::{BROWSER_USER_AGENT, REDIRECT_TIMEOUT};

/// Follow a short link and return the URL it finally lands on.
///
/// Returns `None` on any transport failure or timeout. There is no retry;
/// callers fall back to the short link itself.
pub async fn resolve_redirect(client: &Client, short_url: &str) -> Option<String> {
    let response = client
        .get(short_url)
        .header(reqwest::header::USER_AGENT, BROWSER_USER_AGENT)
        .timeout(REDIRECT_TIMEOUT)
        .send()
        .await;

    match response {
        Ok(response) => {
            let final_url = response.url().to_string();
            debug!(
                short_url = %short_url,
                final_url = %final_url,
                status = %response.status(),
                "Resolved short link"
            );
            Some(final_url)
        }
        Err(e) => {
            debug!(short_url = %short_url, error = %e, "Short link resolution failed");
            None
        }
    }
}
