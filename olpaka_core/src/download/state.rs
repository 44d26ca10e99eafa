use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;

/// Background activity of one download slot, as shown by the badge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DownloadState {
    #[default]
    Inactive,
    Downloading,
    Completed,
}

impl fmt::Display for DownloadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DownloadState::Inactive => "inactive",
            DownloadState::Downloading => "downloading",
            DownloadState::Completed => "completed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot move download from {from} to {to}")]
pub struct TransitionError {
    pub from: DownloadState,
    pub to: DownloadState,
}

/// Observable `DownloadState` for one slot.
///
/// Transitions follow INACTIVE → DOWNLOADING → COMPLETED → INACTIVE, plus
/// DOWNLOADING → INACTIVE for failed or cancelled pulls. A rejected
/// transition publishes nothing. Subscribers see the current value
/// immediately and every later change, last value wins.
#[derive(Debug, Clone)]
pub struct DownloadStateCell {
    tx: Arc<watch::Sender<DownloadState>>,
}

impl DownloadStateCell {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(DownloadState::Inactive);
        Self { tx: Arc::new(tx) }
    }

    pub fn get(&self) -> DownloadState {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<DownloadState> {
        self.tx.subscribe()
    }

    /// INACTIVE → DOWNLOADING.
    pub fn begin(&self) -> Result<(), TransitionError> {
        self.transition(&[DownloadState::Inactive], DownloadState::Downloading)
    }

    /// DOWNLOADING → COMPLETED, when the stream ended normally.
    pub fn complete(&self) -> Result<(), TransitionError> {
        self.transition(&[DownloadState::Downloading], DownloadState::Completed)
    }

    /// COMPLETED → INACTIVE, when the user dismisses the finished download.
    pub fn reset(&self) -> Result<(), TransitionError> {
        self.transition(&[DownloadState::Completed], DownloadState::Inactive)
    }

    /// DOWNLOADING → INACTIVE, when the pull failed or was cancelled.
    pub fn abort(&self) -> Result<(), TransitionError> {
        self.transition(&[DownloadState::Downloading], DownloadState::Inactive)
    }

    fn transition(&self, from: &[DownloadState], to: DownloadState) -> Result<(), TransitionError> {
        let mut rejected = None;
        self.tx.send_if_modified(|state| {
            if from.contains(state) {
                log::debug!("[download_state] {} -> {}", state, to);
                *state = to;
                true
            } else {
                rejected = Some(*state);
                false
            }
        });

        match rejected {
            Some(current) => Err(TransitionError { from: current, to }),
            None => Ok(()),
        }
    }
}

impl Default for DownloadStateCell {
    fn default() -> Self {
        Self::new()
    }
}
