use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

/// Receives human-readable status lines from the pipeline.
///
/// Implementations must not feed anything back into the pipeline.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn report(&self, message: String);
}

/// Forwards progress lines to the tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

#[async_trait]
impl ProgressSink for TracingProgress {
    async fn report(&self, message: String) {
        info!(target: "xhs_media_fetcher::progress", "{message}");
    }
}

/// Keeps every progress line in memory.
#[derive(Debug, Default)]
pub struct CollectingProgress {
    lines: Mutex<Vec<String>>,
}

impl CollectingProgress {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the lines reported so far.
    pub async fn lines(&self) -> Vec<String> {
        self.lines.lock().await.clone()
    }
}

#[async_trait]
impl ProgressSink for CollectingProgress {
    async fn report(&self, message: String) {
        self.lines.lock().await.push(message);
    }
}
