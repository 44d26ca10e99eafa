use async_trait::async_trait;

use super::snapshot::ProgressSnapshot;

/// Trait for anything that wants to observe a model pull.
///
/// Lifecycle:
/// - `on_progress` is called for every decoded progress record.
/// - `on_complete` is called once when the stream ends normally.
/// - `on_error` is called once when the pull fails.
/// - `on_cancelled` is called once when the pull was cancelled.
#[async_trait]
pub trait ProgressObserver: Send + Sync + 'static {
    async fn on_progress(&self, snapshot: &ProgressSnapshot);

    async fn on_complete(&self, snapshot: &ProgressSnapshot);

    async fn on_error(&self, error: &str);

    async fn on_cancelled(&self, _snapshot: &ProgressSnapshot) {}
}
