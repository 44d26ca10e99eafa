use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::client::ollama_client::OllamaClient;
use crate::download::state::{DownloadState, DownloadStateCell};
use crate::progress::notifier::{ProgressNotifier, PullEvent};
use crate::progress::observer::ProgressObserver;
use crate::types::types::{DownloadError, PullOutcome};

/// Status of the record the server sends once the model is stored.
const SUCCESS_STATUS: &str = "success";

/// Orchestrates one model pull: drives the slot's `DownloadState`, reads the
/// record stream and feeds the `ProgressNotifier`.
pub struct ModelDownloader {
    client: OllamaClient,
    state: DownloadStateCell,
    notifier: ProgressNotifier,
}

impl ModelDownloader {
    pub fn new(client: OllamaClient, state: DownloadStateCell) -> Self {
        Self {
            client,
            state,
            notifier: ProgressNotifier::new(),
        }
    }

    /// Register a progress observer for the next `pull()`. Observers are
    /// handed to that pull's notifier and do not carry over to later pulls.
    pub fn add_observer(&mut self, observer: Box<dyn ProgressObserver>) {
        self.notifier.add_observer(observer);
    }

    /// Pull `model` until the stream ends, `cancel` fires or an error occurs.
    /// A stream that closes before its last record reports `success` is
    /// `DownloadError::Incomplete`.
    ///
    /// The token is checked at every chunk boundary; on cancellation the
    /// stream is dropped, which closes the connection. Observers are drained
    /// before the state leaves DOWNLOADING, so a subscriber that sees
    /// COMPLETED can already read the final snapshot.
    pub async fn pull(
        &mut self,
        model: &str,
        cancel: CancellationToken,
    ) -> Result<PullOutcome, DownloadError> {
        if self.state.get() == DownloadState::Completed {
            self.state.reset()?;
        }
        self.state.begin()?;

        let download_id = Uuid::new_v4().to_string();
        log::info!("[pull] model={} id={}: started", model, download_id);

        let (events_tx, events_rx) = mpsc::channel(self.client.config().channel_capacity);

        // Take the notifier out so it can move into the background task.
        let mut notifier = std::mem::take(&mut self.notifier);
        notifier.begin(model, &download_id);
        let notifier_handle = tokio::spawn(async move {
            notifier.run(events_rx).await;
        });

        let result = self.consume(model, &cancel, &events_tx).await;

        match &result {
            Ok(PullOutcome::Completed) => {}
            Ok(PullOutcome::Cancelled) => {
                let _ = events_tx.send(PullEvent::Cancelled).await;
            }
            Err(e) => {
                let _ = events_tx.send(PullEvent::Failed(e.to_string())).await;
            }
        }

        // Closing the channel lets the notifier finish and exit.
        drop(events_tx);
        let _ = notifier_handle.await;

        match &result {
            Ok(PullOutcome::Completed) => {
                log::info!("[pull] model={} id={}: completed", model, download_id);
                self.state.complete()?;
            }
            Ok(PullOutcome::Cancelled) => {
                log::info!("[pull] model={} id={}: cancelled", model, download_id);
                self.state.abort()?;
            }
            Err(e) => {
                log::error!("[pull] model={} id={}: failed: {}", model, download_id, e);
                self.state.abort()?;
            }
        }

        result
    }

    async fn consume(
        &self,
        model: &str,
        cancel: &CancellationToken,
        events_tx: &mpsc::Sender<PullEvent>,
    ) -> Result<PullOutcome, DownloadError> {
        let mut records = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(PullOutcome::Cancelled),
            opened = self.client.pull(model) => opened?,
        };

        let mut count: u64 = 0;
        let mut succeeded = false;
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    log::debug!("[pull] model={}: cancel observed after {} record(s)", model, count);
                    return Ok(PullOutcome::Cancelled);
                }
                next = records.next() => next,
            };

            match next {
                Some(Ok(record)) => {
                    count += 1;
                    log::trace!("[pull] model={}: {:?}", model, record);
                    succeeded = record.status.as_deref() == Some(SUCCESS_STATUS);
                    // A gone notifier only means nobody is listening.
                    let _ = events_tx.send(PullEvent::Progress(record)).await;
                }
                Some(Err(e)) => return Err(e.into()),
                None if succeeded => {
                    log::debug!("[pull] model={}: stream ended after {} record(s)", model, count);
                    return Ok(PullOutcome::Completed);
                }
                None => {
                    log::warn!(
                        "[pull] model={}: stream closed after {} record(s) without success",
                        model,
                        count
                    );
                    return Err(DownloadError::Incomplete(model.to_string()));
                }
            }
        }
    }
}
