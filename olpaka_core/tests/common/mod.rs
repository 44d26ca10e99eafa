use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use olpaka_core::client::ollama_client::OllamaClient;
use olpaka_core::config::Config;
use olpaka_core::progress::observer::ProgressObserver;
use olpaka_core::progress::snapshot::ProgressSnapshot;

/// What a `RecordingObserver` saw, in call order.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub enum Seen {
    Progress(ProgressSnapshot),
    Complete(ProgressSnapshot),
    Error(String),
    Cancelled(ProgressSnapshot),
}

/// Observer that records every callback for later assertions.
#[derive(Clone, Default)]
pub struct RecordingObserver {
    pub seen: Arc<Mutex<Vec<Seen>>>,
}

#[allow(dead_code)]
impl RecordingObserver {
    pub fn events(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    pub fn progress(&self) -> Vec<ProgressSnapshot> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Seen::Progress(s) => Some(s),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl ProgressObserver for RecordingObserver {
    async fn on_progress(&self, snapshot: &ProgressSnapshot) {
        self.seen.lock().unwrap().push(Seen::Progress(snapshot.clone()));
    }

    async fn on_complete(&self, snapshot: &ProgressSnapshot) {
        self.seen.lock().unwrap().push(Seen::Complete(snapshot.clone()));
    }

    async fn on_error(&self, error: &str) {
        self.seen.lock().unwrap().push(Seen::Error(error.to_string()));
    }

    async fn on_cancelled(&self, snapshot: &ProgressSnapshot) {
        self.seen.lock().unwrap().push(Seen::Cancelled(snapshot.clone()));
    }
}

/// A typical pull of a single-layer model.
#[allow(dead_code)]
pub const PULL_BODY: &str = concat!(
    "{\"status\":\"pulling manifest\"}\n",
    "{\"status\":\"pulling aaa\",\"digest\":\"sha256:aaa\",\"total\":2048}\n",
    "{\"status\":\"pulling aaa\",\"digest\":\"sha256:aaa\",\"total\":2048,\"completed\":1024}\n",
    "{\"status\":\"pulling aaa\",\"digest\":\"sha256:aaa\",\"total\":2048,\"completed\":2048}\n",
    "{\"status\":\"verifying sha256 digest\"}\n",
    "{\"status\":\"writing manifest\"}\n",
    "{\"status\":\"success\"}\n",
);

#[allow(dead_code)]
pub fn client_for(server: &MockServer) -> OllamaClient {
    OllamaClient::new(Config::default().with_host(&server.uri())).unwrap()
}

/// Mounts `/api/pull` answering with `body`, optionally after `delay`.
#[allow(dead_code)]
pub async fn mount_pull(server: &MockServer, body: &str, delay: Option<std::time::Duration>) {
    let mut template = ResponseTemplate::new(200)
        .set_body_string(body.to_string())
        .insert_header("Content-Type", "application/x-ndjson");
    if let Some(delay) = delay {
        template = template.set_delay(delay);
    }

    Mock::given(method("POST"))
        .and(path("/api/pull"))
        .respond_with(template)
        .mount(server)
        .await;
}
