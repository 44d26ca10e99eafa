use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;

use super::observer::ProgressObserver;
use super::snapshot::ProgressSnapshot;

/// Publishes every snapshot to a `watch` channel so any number of UI
/// subscribers can read the latest one via `rx.changed().await`.
pub struct WatchProgressObserver {
    tx: Arc<watch::Sender<ProgressSnapshot>>,
}

impl WatchProgressObserver {
    /// Returns the observer (to be registered with `ProgressNotifier`) and a
    /// receiver that can be cloned and handed to subscribers.
    pub fn new() -> (Self, watch::Receiver<ProgressSnapshot>) {
        let (tx, rx) = watch::channel(ProgressSnapshot::empty());
        (Self { tx: Arc::new(tx) }, rx)
    }

    /// Reuses an existing channel, e.g. a registry slot that outlives one pull.
    pub fn with_sender(tx: Arc<watch::Sender<ProgressSnapshot>>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl ProgressObserver for WatchProgressObserver {
    async fn on_progress(&self, snapshot: &ProgressSnapshot) {
        // send_replace never fails, even with no receivers left.
        self.tx.send_replace(snapshot.clone());
    }

    async fn on_complete(&self, snapshot: &ProgressSnapshot) {
        self.tx.send_replace(snapshot.clone());
    }

    async fn on_error(&self, error: &str) {
        log::error!("[WatchProgressObserver] pull error: {}", error);
        self.tx.send_modify(|snap| {
            snap.done = true;
            snap.subtitle = error.to_string();
        });
    }

    async fn on_cancelled(&self, snapshot: &ProgressSnapshot) {
        let mut snap = snapshot.clone();
        snap.done = true;
        snap.subtitle = "Cancelled".to_string();
        self.tx.send_replace(snap);
    }
}
