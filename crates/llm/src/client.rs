use aiadapter_common::{AiAdapterError, Result};
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use tracing::{debug, info};

use crate::types::{
    ChatRequest, ChatResponse, LocalModel, PullProgress, PullRequest, ShowRequest, ShowResponse,
    TagsResponse,
};

/// Ollama API client
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    client: Client,
}

impl OllamaClient {
    /// Create new Ollama client
    ///
    /// A non-empty `token` is sent as a bearer token on every request.
    pub fn new(base_url: impl Into<String>, token: &str) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        if !token.is_empty() {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| AiAdapterError::config(format!("Invalid Ollama token: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }

        // Per-task timeouts come from the request queue
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| AiAdapterError::network(format!("Failed to create HTTP client: {}", e)))?;

        info!("Ollama client initialized: {}", base_url);
        Ok(Self { base_url, client })
    }

    /// Daemon base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a chat request, returning the assistant message text
    pub async fn chat(&self, request: ChatRequest) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);

        debug!(
            "Sending chat request to Ollama - Model: {}, Messages: {}",
            request.model,
            request.messages.len()
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AiAdapterError::network(format!("Failed to send request: {}", e)))?
            .error_for_status()
            .map_err(|e| AiAdapterError::provider(format!("Ollama API error: {}", e)))?;

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| AiAdapterError::serialization(format!("Failed to parse response: {}", e)))?;

        debug!(
            "Received response from Ollama - Model: {}, Length: {}",
            result.model,
            result.message.content.len()
        );

        Ok(result.message.content)
    }

    /// List models installed on the daemon
    pub async fn list(&self) -> Result<Vec<LocalModel>> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AiAdapterError::network(format!("Failed to connect to Ollama: {}", e)))?
            .error_for_status()
            .map_err(|e| AiAdapterError::provider(format!("Ollama API error: {}", e)))?;

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| AiAdapterError::serialization(format!("Failed to parse model list: {}", e)))?;

        debug!("Ollama reports {} installed models", tags.models.len());
        Ok(tags.models)
    }

    /// Model details, including capability tags on recent daemons
    pub async fn show(&self, model: &str) -> Result<ShowResponse> {
        let url = format!("{}/api/show", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&ShowRequest {
                model: model.to_string(),
            })
            .send()
            .await
            .map_err(|e| AiAdapterError::network(format!("Failed to send show request: {}", e)))?
            .error_for_status()
            .map_err(|e| AiAdapterError::provider(format!("Ollama API error: {}", e)))?;

        response
            .json()
            .await
            .map_err(|e| AiAdapterError::serialization(format!("Failed to parse model details: {}", e)))
    }

    /// Pull a model, reporting each progress line
    pub async fn pull(&self, model: &str, mut on_progress: impl FnMut(&PullProgress)) -> Result<()> {
        let url = format!("{}/api/pull", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&PullRequest {
                model: model.to_string(),
                stream: true,
            })
            .send()
            .await
            .map_err(|e| AiAdapterError::network(format!("Failed to send pull request: {}", e)))?
            .error_for_status()
            .map_err(|e| AiAdapterError::provider(format!("Ollama API error: {}", e)))?;

        // NDJSON: lines may be split across chunks
        let mut buffer: Vec<u8> = Vec::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| AiAdapterError::network(format!("Pull stream error: {}", e)))?;
            buffer.extend_from_slice(&chunk);

            while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=pos).collect();
                handle_pull_line(&String::from_utf8_lossy(&line), &mut on_progress)?;
            }
        }

        handle_pull_line(&String::from_utf8_lossy(&buffer), &mut on_progress)
    }
}

fn handle_pull_line(line: &str, on_progress: &mut impl FnMut(&PullProgress)) -> Result<()> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(());
    }

    let progress: PullProgress = serde_json::from_str(line)?;
    if let Some(error) = progress.error {
        return Err(AiAdapterError::provider(format!("Pull failed: {}", error)));
    }

    on_progress(&progress);
    Ok(())
}
