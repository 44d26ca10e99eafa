use std::fmt;

use crate::progress::aggregator::Estimate;

/// Shown instead of a partial subtitle while the rate is still unknown.
pub const CALCULATING: &str = "Calculating...";

const KB: i64 = 1024;
const MB: i64 = 1024 * 1024;
const GB: i64 = 1024 * 1024 * 1024;

/// Display unit for byte quantities. Thresholds are powers of 1024 while the
/// labels read GB/MB/KB; that mismatch is what users already see in the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeUnit {
    B,
    KB,
    MB,
    GB,
}

impl SizeUnit {
    pub fn for_bytes(bytes: i64) -> Self {
        if bytes >= GB {
            SizeUnit::GB
        } else if bytes >= MB {
            SizeUnit::MB
        } else if bytes >= KB {
            SizeUnit::KB
        } else {
            SizeUnit::B
        }
    }

    pub fn divisor(self) -> i64 {
        match self {
            SizeUnit::B => 1,
            SizeUnit::KB => KB,
            SizeUnit::MB => MB,
            SizeUnit::GB => GB,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SizeUnit::B => "B",
            SizeUnit::KB => "KB",
            SizeUnit::MB => "MB",
            SizeUnit::GB => "GB",
        }
    }
}

/// A byte count scaled to its unit and rounded to one decimal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormattedSize {
    pub value: f64,
    pub unit: SizeUnit,
}

impl FormattedSize {
    pub fn new(bytes: i64) -> Self {
        let unit = SizeUnit::for_bytes(bytes);
        let scaled = bytes as f64 / unit.divisor() as f64;
        Self {
            value: (scaled * 10.0).round() / 10.0,
            unit,
        }
    }
}

impl fmt::Display for FormattedSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} {}", self.value, self.unit.label())
    }
}

pub fn format_size_in_bytes(bytes: i64) -> String {
    FormattedSize::new(bytes).to_string()
}

pub fn format_speed(bytes_per_second: i64) -> String {
    format!("{}/s", FormattedSize::new(bytes_per_second))
}

/// Renders only the leading non-zero components: `1h 1m 1s`, `1m 1s`, `5s`.
pub fn format_remaining_time(seconds: i64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Subtitle for an in-progress layer, e.g. `1.5 GB / 4.0 GB (12.3 MB/s, 3m 20s left)`.
///
/// Collapses to [`CALCULATING`] whenever the rate or remaining time is unknown.
pub fn format_progress_subtitle(completed: i64, total: i64, estimate: &Estimate) -> String {
    match (estimate.rate.0, estimate.remaining.0) {
        (Some(rate), Some(remaining)) => format!(
            "{} / {} ({}, {} left)",
            format_size_in_bytes(completed),
            format_size_in_bytes(total),
            format_speed(rate),
            format_remaining_time(remaining),
        ),
        _ => CALCULATING.to_string(),
    }
}
