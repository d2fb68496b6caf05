use aiadapter_common::{AiAdapterError, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use tracing::{debug, info};

use crate::types::{GeminiModel, GenerateContentRequest, GenerateContentResponse, ListModelsResponse};

/// Public Gemini API endpoint
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini REST client
#[derive(Debug, Clone)]
pub struct GeminiClient {
    base_url: String,
    client: Client,
}

impl GeminiClient {
    /// Create new Gemini client against the public endpoint
    pub fn new(api_key: &str) -> Result<Self> {
        Self::with_base_url(GEMINI_BASE_URL, api_key)
    }

    /// Create new Gemini client against a custom endpoint
    pub fn with_base_url(base_url: impl Into<String>, api_key: &str) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(api_key)
            .map_err(|e| AiAdapterError::config(format!("Invalid Gemini API key: {}", e)))?;
        headers.insert("x-goog-api-key", key);

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| AiAdapterError::network(format!("Failed to create HTTP client: {}", e)))?;

        info!("Gemini client initialized: {}", base_url);
        Ok(Self { base_url, client })
    }

    /// Run `generateContent` on `model` ("models/..." resource name)
    pub async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = format!("{}/{}:generateContent", self.base_url, model_resource(model));

        debug!("Sending generateContent request to Gemini - Model: {}", model);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| AiAdapterError::network(format!("Failed to send request: {}", e)))?
            .error_for_status()
            .map_err(|e| AiAdapterError::provider(format!("Gemini API error: {}", e)))?;

        response
            .json()
            .await
            .map_err(|e| AiAdapterError::serialization(format!("Failed to parse response: {}", e)))
    }

    /// List every model visible to the key, following page tokens
    pub async fn list_models(&self) -> Result<Vec<GeminiModel>> {
        let url = format!("{}/models", self.base_url);
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.client.get(&url).query(&[("pageSize", "100")]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let page: ListModelsResponse = request
                .send()
                .await
                .map_err(|e| AiAdapterError::network(format!("Failed to connect to Gemini: {}", e)))?
                .error_for_status()
                .map_err(|e| AiAdapterError::provider(format!("Gemini API error: {}", e)))?
                .json()
                .await
                .map_err(|e| AiAdapterError::serialization(format!("Failed to parse model list: {}", e)))?;

            models.extend(page.models);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!("Gemini reports {} models", models.len());
        Ok(models)
    }
}

/// Accept both "gemini-2.0-flash" and "models/gemini-2.0-flash"
fn model_resource(model: &str) -> String {
    if model.starts_with("models/") || model.starts_with("tunedModels/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}
