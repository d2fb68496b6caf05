use serde::{Deserialize, Serialize};

/// Ollama chat request
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model name (e.g., "llama3.2", "llava:13b")
    pub model: String,

    /// Conversation so far
    pub messages: Vec<ChatMessage>,

    /// Disable streaming
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

impl ChatRequest {
    /// Single user turn, optionally with one image
    pub fn user(model: impl Into<String>, prompt: impl Into<String>, image: Option<String>) -> Self {
        Self {
            model: model.into(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.into(),
                images: image.map(|image| vec![image]),
            }],
            stream: Some(false),
        }
    }
}

/// A chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,

    /// Base64 encoded images attached to the message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

/// Ollama chat response
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub model: String,
    pub message: ChatMessage,
    #[serde(default)]
    pub done: bool,
}

/// Ollama `/api/tags` response
#[derive(Debug, Clone, Deserialize)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<LocalModel>,
}

/// A model installed on the Ollama daemon
#[derive(Debug, Clone, Deserialize)]
pub struct LocalModel {
    /// Name with tag (e.g., "llava:latest")
    pub name: String,

    #[serde(default)]
    pub size: u64,
}

/// Ollama `/api/show` request
#[derive(Debug, Clone, Serialize)]
pub struct ShowRequest {
    pub model: String,
}

/// Ollama `/api/show` response (only the fields we read)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShowResponse {
    /// Capability tags such as "completion" or "vision"
    #[serde(default)]
    pub capabilities: Vec<String>,
}

/// Ollama `/api/pull` request
#[derive(Debug, Clone, Serialize)]
pub struct PullRequest {
    pub model: String,
    pub stream: bool,
}

/// One line of the `/api/pull` progress stream
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PullProgress {
    #[serde(default)]
    pub status: String,

    #[serde(default)]
    pub digest: Option<String>,

    /// Total bytes of the layer being downloaded
    #[serde(default)]
    pub total: Option<u64>,

    /// Bytes downloaded so far
    #[serde(default)]
    pub completed: Option<u64>,

    /// Set when the daemon aborts the pull
    #[serde(default)]
    pub error: Option<String>,
}

/// Gemini `generateContent` request
#[derive(Debug, Clone, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

impl GenerateContentRequest {
    /// Single user turn, optionally with one PNG image
    pub fn user(prompt: impl Into<String>, image: Option<String>) -> Self {
        let mut parts = vec![Part::text(prompt)];
        if let Some(data) = image {
            parts.push(Part {
                text: None,
                inline_data: Some(InlineData {
                    mime_type: "image/png".to_string(),
                    data,
                }),
            });
        }

        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
        }
    }
}

/// Gemini content block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default)]
    pub parts: Vec<Part>,
}

/// Gemini content part
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

impl Part {
    /// Text-only part
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }
}

/// Inline binary payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

/// Gemini `generateContent` response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, `None` when it has no text
    pub fn text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let content = candidate.content.as_ref()?;

        let texts: Vec<&str> = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();

        if texts.is_empty() {
            None
        } else {
            Some(texts.concat())
        }
    }
}

/// Gemini response candidate
#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

/// Gemini `models` list page
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListModelsResponse {
    #[serde(default)]
    pub models: Vec<GeminiModel>,

    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Model description returned by the Gemini API
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiModel {
    /// Resource name (e.g., "models/gemini-2.0-flash")
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_request_images_only_when_present() {
        let text = serde_json::to_value(ChatRequest::user("llama3.2", "Hello", None)).unwrap();
        assert!(text["messages"][0].get("images").is_none());
        assert_eq!(text["stream"], false);

        let image = serde_json::to_value(ChatRequest::user(
            "llava:latest",
            "What is this?",
            Some("aGVsbG8=".to_string()),
        ))
        .unwrap();
        assert_eq!(image["messages"][0]["images"][0], "aGVsbG8=");
        assert_eq!(image["messages"][0]["role"], "user");
    }

    #[test]
    fn test_generate_content_request_shape() {
        let request = GenerateContentRequest::user("Describe", Some("ZGF0YQ==".to_string()));
        let value = serde_json::to_value(&request).unwrap();
        let parts = &value["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], "Describe");
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[1]["inlineData"]["data"], "ZGF0YQ==");
        assert!(parts[1].get("text").is_none());
    }

    #[test]
    fn test_generate_content_response_text() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "role": "model", "parts": [
                { "text": "Hello " }, { "text": "world" }
            ]}}]
        }))
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("Hello world"));

        let empty: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty.text(), None);
    }

    #[test]
    fn test_pull_progress_parsing() {
        let line = r#"{"status":"pulling 6a0746a1ec1a","digest":"sha256:6a07","total":4661211808,"completed":1048576}"#;
        let progress: PullProgress = serde_json::from_str(line).unwrap();
        assert_eq!(progress.total, Some(4_661_211_808));
        assert_eq!(progress.completed, Some(1_048_576));

        let done: PullProgress = serde_json::from_str(r#"{"status":"success"}"#).unwrap();
        assert_eq!(done.total, None);
        assert_eq!(done.status, "success");
    }
}
