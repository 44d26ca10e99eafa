use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{watch, RwLock};
use tokio_util::sync::CancellationToken;

use crate::client::ollama_client::OllamaClient;
use crate::download::model_downloader::ModelDownloader;
use crate::download::state::{DownloadState, DownloadStateCell};
use crate::progress::observer::ProgressObserver;
use crate::progress::snapshot::ProgressSnapshot;
use crate::progress::watch_observer::WatchProgressObserver;
use crate::types::types::{DownloadError, PullOutcome};

/// Outcome of a finished pull as seen by waiters. Errors are flattened to
/// their message so any number of waiters can read the same value.
type PullResult = Result<PullOutcome, String>;

/// Everything the UI needs about one model's download.
struct DownloadSlot {
    state: DownloadStateCell,
    progress_tx: Arc<watch::Sender<ProgressSnapshot>>,
    cancel: CancellationToken,
    outcome: Option<watch::Receiver<Option<PullResult>>>,
}

impl DownloadSlot {
    fn new() -> Self {
        let (progress_tx, _rx) = watch::channel(ProgressSnapshot::empty());
        Self {
            state: DownloadStateCell::new(),
            progress_tx: Arc::new(progress_tx),
            cancel: CancellationToken::new(),
            outcome: None,
        }
    }

    /// A pull runs until it publishes its outcome. A task that died without
    /// one has dropped its sender, which also counts as finished.
    fn is_running(&self) -> bool {
        self.outcome
            .as_ref()
            .is_some_and(|rx| rx.has_changed().is_ok() && rx.borrow().is_none())
    }
}

/// Owns one download slot per model name. Pass it (or a clone) to whatever
/// needs to start, cancel or observe pulls; clones share the same slots.
#[derive(Clone)]
pub struct DownloadRegistry {
    client: OllamaClient,
    slots: Arc<RwLock<HashMap<String, DownloadSlot>>>,
}

impl DownloadRegistry {
    pub fn new(client: OllamaClient) -> Self {
        Self {
            client,
            slots: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Spawn a background pull of `model`.
    ///
    /// Returns a receiver for the slot's latest snapshot. Fails with
    /// `AlreadyDownloading` while a pull of the same model is still running.
    pub async fn start(
        &self,
        model: &str,
        observers: Vec<Box<dyn ProgressObserver>>,
    ) -> Result<watch::Receiver<ProgressSnapshot>, DownloadError> {
        let mut slots = self.slots.write().await;
        let slot = slots.entry(model.to_string()).or_insert_with(DownloadSlot::new);

        if slot.is_running() {
            log::warn!("[registry] model={} is already downloading", model);
            return Err(DownloadError::AlreadyDownloading(model.to_string()));
        }

        slot.cancel = CancellationToken::new();

        let mut downloader = ModelDownloader::new(self.client.clone(), slot.state.clone());
        downloader.add_observer(Box::new(WatchProgressObserver::with_sender(Arc::clone(
            &slot.progress_tx,
        ))));
        for observer in observers {
            downloader.add_observer(observer);
        }

        let (outcome_tx, outcome_rx) = watch::channel(None);
        let token = slot.cancel.clone();
        let model_name = model.to_string();
        tokio::spawn(async move {
            let result = downloader.pull(&model_name, token).await;
            outcome_tx.send_replace(Some(result.map_err(|e| e.to_string())));
        });
        slot.outcome = Some(outcome_rx);

        log::info!("[registry] model={} pull dispatched", model);
        Ok(slot.progress_tx.subscribe())
    }

    /// Request cancellation. Returns `false` when nothing is running.
    pub async fn cancel(&self, model: &str) -> bool {
        let slots = self.slots.read().await;
        match slots.get(model) {
            Some(slot) if slot.is_running() => {
                log::info!("[registry] model={} cancel requested", model);
                slot.cancel.cancel();
                true
            }
            _ => false,
        }
    }

    /// Wait for the most recent pull of `model` to finish.
    ///
    /// The pull stays registered while waiting, so it can still be cancelled
    /// from elsewhere and a second `start` is still rejected. Any number of
    /// callers may wait on the same pull; a failed pull is reported to each
    /// of them as `DownloadError::Task`.
    pub async fn wait(&self, model: &str) -> Result<PullOutcome, DownloadError> {
        let mut outcome = {
            let slots = self.slots.read().await;
            slots
                .get(model)
                .and_then(|slot| slot.outcome.clone())
                .ok_or_else(|| DownloadError::NoSuchDownload(model.to_string()))?
        };

        let finished = outcome
            .wait_for(Option::is_some)
            .await
            .ok()
            .and_then(|value| (*value).clone());

        match finished {
            Some(result) => result.map_err(DownloadError::Task),
            None => Err(DownloadError::Task(format!(
                "pull of {} ended without an outcome",
                model
            ))),
        }
    }

    /// Acknowledge a finished download: COMPLETED → INACTIVE.
    pub async fn dismiss(&self, model: &str) -> Result<(), DownloadError> {
        let slots = self.slots.read().await;
        let slot = slots
            .get(model)
            .ok_or_else(|| DownloadError::NoSuchDownload(model.to_string()))?;
        slot.state.reset()?;
        slot.progress_tx.send_replace(ProgressSnapshot::empty());
        Ok(())
    }

    pub async fn state(&self, model: &str) -> DownloadState {
        let slots = self.slots.read().await;
        slots.get(model).map(|s| s.state.get()).unwrap_or_default()
    }

    /// Subscribe to a model's state. The slot is created on first use, so a
    /// UI can subscribe before the pull starts.
    pub async fn subscribe_state(&self, model: &str) -> watch::Receiver<DownloadState> {
        let mut slots = self.slots.write().await;
        slots
            .entry(model.to_string())
            .or_insert_with(DownloadSlot::new)
            .state
            .subscribe()
    }

    pub async fn subscribe_progress(&self, model: &str) -> watch::Receiver<ProgressSnapshot> {
        let mut slots = self.slots.write().await;
        slots
            .entry(model.to_string())
            .or_insert_with(DownloadSlot::new)
            .progress_tx
            .subscribe()
    }

    /// Aggregate state for the app-wide badge: any active pull wins, then any
    /// finished one that was not dismissed yet.
    pub async fn badge(&self) -> DownloadState {
        let slots = self.slots.read().await;
        let states: Vec<DownloadState> = slots.values().map(|s| s.state.get()).collect();

        if states.contains(&DownloadState::Downloading) {
            DownloadState::Downloading
        } else if states.contains(&DownloadState::Completed) {
            DownloadState::Completed
        } else {
            DownloadState::Inactive
        }
    }

    /// Models with a pull currently in flight, sorted by name.
    pub async fn active(&self) -> Vec<String> {
        let slots = self.slots.read().await;
        let mut models: Vec<String> = slots
            .iter()
            .filter(|(_, slot)| slot.is_running())
            .map(|(model, _)| model.clone())
            .collect();
        models.sort();
        models
    }
}
