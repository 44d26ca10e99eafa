use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

use olpaka_core::progress::observer::ProgressObserver;
use olpaka_core::progress::snapshot::{ProgressIndicator, ProgressSnapshot};

/// Resolution of the determinate bar.
const BAR_LENGTH: u64 = 1000;

/// Renders a pull as a single indicatif bar.
///
/// Byte-counted layers get a determinate bar, status-only phases a spinner.
/// The message is always the snapshot's subtitle.
pub struct TerminalProgressObserver {
    bar: ProgressBar,
    /// Whether the bar currently uses the determinate style.
    determinate: Mutex<Option<bool>>,
}

impl TerminalProgressObserver {
    pub fn new(model: &str) -> Self {
        let bar = ProgressBar::new(BAR_LENGTH);
        bar.set_prefix(model.to_string());
        bar.enable_steady_tick(Duration::from_millis(120));
        Self {
            bar,
            determinate: Mutex::new(None),
        }
    }

    fn apply_style(&self, determinate: bool) {
        let mut current = self.determinate.lock().unwrap();
        if *current == Some(determinate) {
            return;
        }

        let style = if determinate {
            ProgressStyle::with_template("{prefix:.bold} [{bar:30.cyan/blue}] {percent:>3}% {msg}")
                .unwrap()
                .progress_chars("=>-")
        } else {
            ProgressStyle::with_template("{prefix:.bold} {spinner:.green} {msg}").unwrap()
        };
        self.bar.set_style(style);
        *current = Some(determinate);
    }

    fn render(&self, snapshot: &ProgressSnapshot) {
        match snapshot.indicator {
            ProgressIndicator::Determinate(fraction) => {
                self.apply_style(true);
                self.bar.set_position((fraction as f64 * BAR_LENGTH as f64) as u64);
            }
            ProgressIndicator::Indeterminate => self.apply_style(false),
        }
        self.bar.set_message(snapshot.subtitle.clone());
    }
}

#[async_trait]
impl ProgressObserver for TerminalProgressObserver {
    async fn on_progress(&self, snapshot: &ProgressSnapshot) {
        self.render(snapshot);
    }

    async fn on_complete(&self, snapshot: &ProgressSnapshot) {
        self.render(snapshot);
        self.bar.finish_with_message(snapshot.subtitle.clone());
    }

    async fn on_error(&self, error: &str) {
        self.bar.abandon_with_message(format!("Failed: {}", error));
    }

    async fn on_cancelled(&self, _snapshot: &ProgressSnapshot) {
        self.bar.abandon_with_message("Cancelled");
    }
}
