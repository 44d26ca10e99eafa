use std::collections::HashMap;
use std::time::Instant;

use tokio::sync::mpsc;

use crate::types::types::ProgressRecord;
use super::aggregator::{ProgressSample, ProgressTracker};
use super::formatter::{format_progress_subtitle, format_size_in_bytes};
use super::observer::ProgressObserver;
use super::snapshot::{ProgressIndicator, ProgressSnapshot};

/// Message sent from the pull loop to the notifier task.
#[derive(Debug, Clone)]
pub enum PullEvent {
    Progress(ProgressRecord),
    Failed(String),
    Cancelled,
}

/// Consumes `PullEvent`s from the pull loop, turns records into
/// `ProgressSnapshot`s and fans them out to all registered observers.
///
/// # Lifecycle
///
/// | Channel message          | Observer method called          |
/// |--------------------------|---------------------------------|
/// | `Progress(record)`       | `on_progress(&snapshot)`        |
/// | `Failed(msg)`            | `on_error(&msg)` then stops     |
/// | `Cancelled`              | `on_cancelled(&last)` then stops|
/// | Channel closed           | `on_complete(&final_snapshot)`  |
pub struct ProgressNotifier {
    observers: Vec<Box<dyn ProgressObserver>>,
    tracker: ProgressTracker,
    /// digest → total bytes, for the completion summary.
    layer_totals: HashMap<String, i64>,
    last: ProgressSnapshot,
    start_time: Instant,
}

impl ProgressNotifier {
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
            tracker: ProgressTracker::new(),
            layer_totals: HashMap::new(),
            last: ProgressSnapshot::empty(),
            start_time: Instant::now(),
        }
    }

    /// Register an observer. Must be called before `run()`.
    pub fn add_observer(&mut self, observer: Box<dyn ProgressObserver>) {
        self.observers.push(observer);
    }

    /// Names the pull the following snapshots belong to and restarts the clock.
    pub fn begin(&mut self, model: &str, download_id: &str) {
        self.tracker.reset();
        self.layer_totals.clear();
        self.last = ProgressSnapshot {
            model: model.to_string(),
            download_id: download_id.to_string(),
            ..ProgressSnapshot::empty()
        };
        self.start_time = Instant::now();
    }

    /// Consume events until the channel closes, a failure or a cancellation.
    pub async fn run(mut self, mut events_rx: mpsc::Receiver<PullEvent>) {
        while let Some(event) = events_rx.recv().await {
            match event {
                PullEvent::Progress(record) => {
                    let snapshot = self.handle_record(&record, Instant::now());
                    for observer in &self.observers {
                        observer.on_progress(&snapshot).await;
                    }
                }
                PullEvent::Failed(error) => {
                    for observer in &self.observers {
                        observer.on_error(&error).await;
                    }
                    return;
                }
                PullEvent::Cancelled => {
                    for observer in &self.observers {
                        observer.on_cancelled(&self.last).await;
                    }
                    return;
                }
            }
        }
        // Channel closed without a failure: the stream ended normally.
        self.finish().await;
    }

    /// Turn one record observed at `now` into the next snapshot.
    pub fn handle_record(&mut self, record: &ProgressRecord, now: Instant) -> ProgressSnapshot {
        let mut snapshot = ProgressSnapshot {
            status: record.status.clone(),
            digest: record.digest.clone(),
            ..self.last.clone()
        };

        match record.byte_counts() {
            Some((completed, total)) => {
                if let Some(digest) = &record.digest {
                    self.layer_totals.insert(digest.clone(), total);
                }

                let estimate = self.tracker.update(
                    record.digest.as_deref(),
                    ProgressSample {
                        downloaded_bytes: completed,
                        total_bytes: total,
                        timestamp: now,
                    },
                );

                snapshot.completed = Some(completed);
                snapshot.total = Some(total);
                snapshot.bytes_per_second = estimate.rate.0;
                snapshot.remaining_secs = estimate.remaining.0;
                snapshot.indicator = ProgressIndicator::from_counts(completed, total);
                snapshot.subtitle = format_progress_subtitle(completed, total, &estimate);
            }
            None => {
                // Status-only phase; the next layer starts a fresh estimate.
                self.tracker.reset();
                snapshot.completed = None;
                snapshot.total = None;
                snapshot.bytes_per_second = None;
                snapshot.remaining_secs = None;
                snapshot.indicator = ProgressIndicator::Indeterminate;
                snapshot.subtitle = record.status.clone().unwrap_or_default();
            }
        }

        self.last = snapshot.clone();
        snapshot
    }

    /// Build the final snapshot with `done = true` and notify all observers.
    async fn finish(self) {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let total: i64 = self.layer_totals.values().sum();

        let mut final_snapshot = self.last.clone();
        final_snapshot.done = true;
        final_snapshot.bytes_per_second = None;
        final_snapshot.remaining_secs = None;
        final_snapshot.indicator = ProgressIndicator::Determinate(1.0);
        final_snapshot.subtitle = if total > 0 {
            format!("Completed: {} in {:.1}s", format_size_in_bytes(total), elapsed)
        } else {
            format!("Completed in {:.1}s", elapsed)
        };

        for observer in &self.observers {
            observer.on_complete(&final_snapshot).await;
        }
    }
}

impl Default for ProgressNotifier {
    fn default() -> Self {
        Self::new()
    }
}
