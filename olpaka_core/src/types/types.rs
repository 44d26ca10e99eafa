use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::download::state::TransitionError;

/// One decoded line of a streaming `/api/pull` response.
///
/// The server omits zero-valued counters, so a layer that has just started
/// arrives with `total` set and `completed` missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub digest: Option<String>,
    #[serde(default)]
    pub total: Option<i64>,
    #[serde(default)]
    pub completed: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProgressRecord {
    /// Byte counters as `(completed, total)` when the record carries them.
    pub fn byte_counts(&self) -> Option<(i64, i64)> {
        self.total.map(|total| (self.completed.unwrap_or(0), total))
    }
}

/// Request body for `POST /api/pull`.
#[derive(Debug, Clone, Serialize)]
pub struct PullRequest {
    pub model: String,
    pub stream: bool,
}

/// Request body for `DELETE /api/delete`.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteRequest {
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDetails {
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub parameter_size: Option<String>,
    #[serde(default)]
    pub quantization_level: Option<String>,
}

/// An installed model as reported by `GET /api/tags`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub digest: String,
    #[serde(default)]
    pub modified_at: String,
    #[serde(default)]
    pub details: Option<ModelDetails>,
}

#[derive(Debug, Deserialize)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelInfo>,
}

/// How a pull ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PullOutcome {
    Completed,
    Cancelled,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed progress line: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("server reported: {0}")]
    Server(String),

    #[error("model {0} not found")]
    ModelNotFound(String),
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("{0} is already downloading")]
    AlreadyDownloading(String),

    #[error("no download started for {0}")]
    NoSuchDownload(String),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("stream for {0} ended before the server reported success")]
    Incomplete(String),

    #[error("download task failed: {0}")]
    Task(String),
}
