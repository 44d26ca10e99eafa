use serde::Serialize;

/// Progress bar mode for one in-progress item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "fraction", rename_all = "snake_case")]
pub enum ProgressIndicator {
    /// Completed fraction in `[0, 1]`.
    Determinate(f32),
    /// Only a status text is available (manifest fetch, digest check, ...).
    Indeterminate,
}

impl ProgressIndicator {
    pub fn from_counts(completed: i64, total: i64) -> Self {
        if total <= 0 {
            return ProgressIndicator::Indeterminate;
        }
        let fraction = (completed as f64 / total as f64).clamp(0.0, 1.0);
        ProgressIndicator::Determinate(fraction as f32)
    }

    pub fn fraction(&self) -> Option<f32> {
        match self {
            ProgressIndicator::Determinate(f) => Some(*f),
            ProgressIndicator::Indeterminate => None,
        }
    }
}

/// What the UI shows for a model being pulled.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressSnapshot {
    pub model: String,
    pub download_id: String,
    pub status: Option<String>,
    pub digest: Option<String>,
    pub completed: Option<i64>,
    pub total: Option<i64>,
    pub bytes_per_second: Option<i64>,
    pub remaining_secs: Option<i64>,
    pub indicator: ProgressIndicator,
    pub subtitle: String,
    pub done: bool,
}

impl ProgressSnapshot {
    pub fn empty() -> Self {
        Self {
            model: String::new(),
            download_id: String::new(),
            status: None,
            digest: None,
            completed: None,
            total: None,
            bytes_per_second: None,
            remaining_secs: None,
            indicator: ProgressIndicator::Indeterminate,
            subtitle: String::new(),
            done: false,
        }
    }
}
