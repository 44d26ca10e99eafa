use std::time::Instant;

/// One observation of a layer's cumulative byte counters.
#[derive(Debug, Clone, Copy)]
pub struct ProgressSample {
    pub downloaded_bytes: i64,
    pub total_bytes: i64,
    pub timestamp: Instant,
}

/// Transfer rate in bytes per second. `None` means there is not enough
/// signal yet (no time elapsed or no bytes moved).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadRate(pub Option<i64>);

/// Seconds until the layer finishes at the current rate, if known.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemainingTime(pub Option<i64>);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Estimate {
    pub rate: DownloadRate,
    pub remaining: RemainingTime,
}

impl Estimate {
    pub const UNKNOWN: Estimate = Estimate {
        rate: DownloadRate(None),
        remaining: RemainingTime(None),
    };

    pub fn is_known(&self) -> bool {
        self.rate.0.is_some() && self.remaining.0.is_some()
    }
}

/// Rate and remaining time from two consecutive samples.
///
/// `rate = delta * 1000 / elapsed_ms` with truncating integer division.
/// Both values are unknown when no time elapsed or the counter did not move
/// forward; the remaining time is also unknown when the rate truncates to
/// zero, and never goes below zero.
pub fn estimate(
    total_bytes: i64,
    downloaded_bytes: i64,
    previous_downloaded_bytes: i64,
    previous_update: Instant,
    now: Instant,
) -> Estimate {
    let elapsed_ms = now.saturating_duration_since(previous_update).as_millis() as i64;

    if elapsed_ms == 0 || downloaded_bytes <= previous_downloaded_bytes {
        return Estimate::UNKNOWN;
    }

    let rate = (downloaded_bytes - previous_downloaded_bytes) * 1000 / elapsed_ms;
    let remaining = if rate != 0 {
        Some((total_bytes - downloaded_bytes).max(0) / rate)
    } else {
        None
    };

    Estimate {
        rate: DownloadRate(Some(rate)),
        remaining: RemainingTime(remaining),
    }
}

/// Keeps the previous sample of the layer being downloaded and turns each
/// new sample into an `Estimate`.
///
/// Only one sample of history is retained, so estimates are instantaneous.
/// The server restarts `completed` for every layer; a digest change drops
/// the previous sample so no rate is computed across two layers.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    digest: Option<String>,
    previous: Option<ProgressSample>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, digest: Option<&str>, sample: ProgressSample) -> Estimate {
        if self.digest.as_deref() != digest {
            self.digest = digest.map(str::to_string);
            self.previous = None;
        }

        let estimate = match self.previous {
            Some(prev) => estimate(
                sample.total_bytes,
                sample.downloaded_bytes,
                prev.downloaded_bytes,
                prev.timestamp,
                sample.timestamp,
            ),
            None => Estimate::UNKNOWN,
        };

        self.previous = Some(sample);
        estimate
    }

    pub fn reset(&mut self) {
        self.digest = None;
        self.previous = None;
    }
}
