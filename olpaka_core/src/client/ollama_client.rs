use reqwest::{Client, StatusCode};

use crate::client::record_stream::RecordStream;
use crate::config::Config;
use crate::types::types::{ClientError, DeleteRequest, ModelInfo, PullRequest, TagsResponse};

/// Thin HTTP collaborator for the server's model endpoints.
#[derive(Clone)]
pub struct OllamaClient {
    http: Client,
    config: Config,
}

impl OllamaClient {
    pub fn new(config: Config) -> Result<Self, ClientError> {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .tcp_nodelay(true)
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Starts a streaming pull and returns the decoded progress records.
    ///
    /// Only the response head has been read when this returns; the body is
    /// consumed lazily through the returned `RecordStream`.
    pub async fn pull(&self, model: &str) -> Result<RecordStream, ClientError> {
        let url = self.config.endpoint("/api/pull");
        log::info!("[pull] POST {} model={}", url, model);

        let response = self
            .http
            .post(&url)
            .json(&PullRequest {
                model: model.to_string(),
                stream: true,
            })
            .send()
            .await?;

        let response = check_status(response, model).await?;
        Ok(RecordStream::from_response(response))
    }

    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, ClientError> {
        let url = self.config.endpoint("/api/tags");
        log::debug!("[list_models] GET {}", url);

        let response = self.http.get(&url).send().await?;
        let response = check_status(response, "").await?;
        let tags: TagsResponse = response.json().await?;

        log::debug!("[list_models] {} model(s)", tags.models.len());
        Ok(tags.models)
    }

    pub async fn delete_model(&self, model: &str) -> Result<(), ClientError> {
        let url = self.config.endpoint("/api/delete");
        log::info!("[delete_model] DELETE {} model={}", url, model);

        let response = self
            .http
            .delete(&url)
            .json(&DeleteRequest {
                model: model.to_string(),
            })
            .send()
            .await?;

        check_status(response, model).await?;
        Ok(())
    }
}

/// Maps non-success responses to `ClientError`, keeping the body text for
/// the message. A 404 on a model endpoint means the model is unknown.
async fn check_status(
    response: reqwest::Response,
    model: &str,
) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    log::warn!("[http] status={} body={:?}", status, body);

    if status == StatusCode::NOT_FOUND && !model.is_empty() {
        return Err(ClientError::ModelNotFound(model.to_string()));
    }

    Err(ClientError::Status {
        status: status.as_u16(),
        body: server_message(&body),
    })
}

/// Error bodies are usually `{"error": "..."}`; fall back to the raw text.
fn server_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
