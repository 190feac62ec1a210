//! Resolution pipeline coordinator.
//!
//! Links are processed one at a time: redirect resolution, page fetch, state
//! evaluation, media walking and normalization. Every failure except
//! cancellation is local to its link; the coordinator always returns
//! whatever it managed to resolve.

mod progress;

pub use progress::{CollectingProgress, ProgressSink, TracingProgress};

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use reqwest::Client;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::fetch::{build_client, fetch_page, resolve_redirect};
use crate::links::{extract_links, extract_post_id, ExtractedLink, LinkContext, LinkKind};
use crate::media::{collect_media_urls, random_token, MediaCollector, RemoteMedia};
use crate::state::parse_state;

/// Length of the stand-in name used for posts without an id.
const FALLBACK_STEM_LEN: usize = 12;

/// The only error that aborts a pipeline run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("operation cancelled")]
    Cancelled,
}

/// Resolves share text into downloadable media descriptors.
pub struct Resolver {
    client: Client,
    progress: Arc<dyn ProgressSink>,
}

impl Resolver {
    /// Create a resolver with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(progress: Arc<dyn ProgressSink>) -> Result<Self> {
        Ok(Self::with_client(build_client()?, progress))
    }

    /// Create a resolver around an existing client.
    #[must_use]
    pub fn with_client(client: Client, progress: Arc<dyn ProgressSink>) -> Self {
        Self { client, progress }
    }

    /// Resolve every supported link found in `text`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Cancelled`] if `cancel` fires before the run
    /// completes; no partial result is returned in that case.
    pub async fn resolve(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<RemoteMedia>, ResolveError> {
        let links = extract_links(text);
        if links.is_empty() {
            self.report("No supported links found in input".to_string())
                .await;
            return Ok(Vec::new());
        }

        info!(count = links.len(), "Extracted links from input");
        self.resolve_links(&links, cancel).await
    }

    /// Resolve an already classified list of links, in order.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Cancelled`] if `cancel` fires before the run
    /// completes.
    pub async fn resolve_links(
        &self,
        links: &[ExtractedLink],
        cancel: &CancellationToken,
    ) -> Result<Vec<RemoteMedia>, ResolveError> {
        let mut collector = MediaCollector::new();

        for link in links {
            if cancel.is_cancelled() {
                return Err(ResolveError::Cancelled);
            }
            self.process_link(link, &mut collector, cancel).await?;
        }

        info!(count = collector.len(), "Resolution finished");
        Ok(collector.into_media())
    }

    /// Resolve a short link (if needed) and derive the post id.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Cancelled`] if cancelled mid-request.
    pub async fn build_context(
        &self,
        link: &ExtractedLink,
        cancel: &CancellationToken,
    ) -> Result<LinkContext, ResolveError> {
        let resolved_url = if link.kind == LinkKind::Short {
            match cancellable(cancel, resolve_redirect(&self.client, &link.url)).await? {
                Some(url) => url,
                None => {
                    warn!(url = %link.url, "Short link unresolved, using it as-is");
                    self.report(format!(
                        "Could not resolve short link {}, using it as-is",
                        link.url
                    ))
                    .await;
                    link.url.clone()
                }
            }
        } else {
            link.url.clone()
        };

        let post_id = extract_post_id(&resolved_url);
        Ok(LinkContext {
            source_url: link.url.clone(),
            resolved_url,
            post_id,
        })
    }

    async fn process_link(
        &self,
        link: &ExtractedLink,
        collector: &mut MediaCollector,
        cancel: &CancellationToken,
    ) -> Result<(), ResolveError> {
        let context = self.build_context(link, cancel).await?;
        debug!(
            kind = %link.kind,
            source = %context.source_url,
            resolved = %context.resolved_url,
            post_id = ?context.post_id,
            "Link context built"
        );
        self.report(format!("Resolved link: {}", context.resolved_url))
            .await;

        let html = match cancellable(cancel, fetch_page(&self.client, &context.resolved_url))
            .await?
        {
            Ok(html) => html,
            Err(e) => {
                warn!(url = %context.resolved_url, error = %e, "Failed to fetch post page");
                self.report(format!(
                    "Failed to fetch post page {}: {e}",
                    context.resolved_url
                ))
                .await;
                return Ok(());
            }
        };

        let state = parse_state(&html);
        let raw_urls = collect_media_urls(state.as_ref(), &html);
        if raw_urls.is_empty() {
            self.report(format!("No media found in {}", context.resolved_url))
                .await;
            return Ok(());
        }

        let stem = context
            .post_id
            .clone()
            .unwrap_or_else(|| random_token(FALLBACK_STEM_LEN));
        let added = collector.add_post(&raw_urls, &stem);
        self.report(format!(
            "Found {} media item(s) in {} ({added} new)",
            raw_urls.len(),
            context.resolved_url
        ))
        .await;

        Ok(())
    }

    async fn report(&self, message: String) {
        self.progress.report(message).await;
    }
}

/// Run `fut` unless `cancel` fires first.
async fn cancellable<F: Future>(
    cancel: &CancellationToken,
    fut: F,
) -> Result<F::Output, ResolveError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(ResolveError::Cancelled),
        output = fut => Ok(output),
    }
}
