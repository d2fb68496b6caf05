use aiadapter_common::{masked, Model, ProviderKind, Result, SettingField, SettingsPanel};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::gemini_client::{GeminiClient, GEMINI_BASE_URL};
use crate::provider::{LastModels, Provider, ProviderDeps};
use crate::types::{GeminiModel, GenerateContentRequest};

/// Returned when Gemini answers without any text
pub const NO_RESPONSE: &str = "[AI-ERROR] No response from Gemini API";

/// Gemini-backed provider
///
/// Remembered models are written through to `geminiSettings` so they
/// survive provider switches and restarts.
pub struct GeminiProvider {
    client: GeminiClient,
    deps: ProviderDeps,
    last: LastModels,
}

impl GeminiProvider {
    /// Create provider from the current Gemini settings
    pub fn new(deps: ProviderDeps) -> Result<Self> {
        Self::with_base_url(deps, GEMINI_BASE_URL)
    }

    /// Create provider against a custom API endpoint
    pub fn with_base_url(deps: ProviderDeps, base_url: &str) -> Result<Self> {
        let (client, last) = {
            let settings = deps.settings.read();
            let gemini = &settings.gemini_settings;
            (
                GeminiClient::with_base_url(base_url, &gemini.api_key)?,
                LastModels::new(
                    Some(gemini.last_model.clone()),
                    Some(gemini.last_image_model.clone()),
                ),
            )
        };

        Ok(Self { client, deps, last })
    }

    async fn generate(&self, model: String, request: GenerateContentRequest) -> Result<String> {
        let response = self.client.generate_content(&model, &request).await?;
        Ok(response.text().unwrap_or_else(|| NO_RESPONSE.to_string()))
    }
}

/// Registry entries for the models that support `generateContent`
///
/// Each usable model is registered twice, once per capability.
pub fn models_from_listing(listing: &[GeminiModel]) -> Vec<Model> {
    listing
        .iter()
        .filter(|m| m.supported_generation_methods.iter().any(|g| g == "generateContent"))
        .flat_map(|m| {
            let name = m.display_name.clone().unwrap_or_else(|| "unknown".to_string());
            let id = m.name.clone().unwrap_or_else(|| "unknown".to_string());
            [
                Model::new(name.clone(), id.clone(), true, ProviderKind::Gemini),
                Model::new(name, id, false, ProviderKind::Gemini),
            ]
        })
        .collect()
}

#[async_trait]
impl Provider for GeminiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    async fn query_handling(&self, prompt: &str) -> Result<String> {
        let model = self.deps.settings.read().selected_model.model.clone();
        self.generate(model, GenerateContentRequest::user(prompt, None))
            .await
    }

    async fn query_with_image_handling(&self, prompt: &str, image: &str) -> Result<String> {
        let model = self.deps.settings.read().selected_image_model.model.clone();
        self.generate(model, GenerateContentRequest::user(prompt, Some(image.to_string())))
            .await
    }

    fn generate_settings(&self, panel: &mut SettingsPanel) {
        let api_key = masked(&self.deps.settings.read().gemini_settings.api_key);

        panel.heading("Gemini").text(
            SettingField::GeminiApiKey,
            "Gemini api key",
            "Set your Gemini API key",
            None,
            api_key,
        );
    }

    async fn check(&self) {
        match self.client.list_models().await {
            Ok(listing) => {
                let added = self
                    .deps
                    .registry
                    .write()
                    .reconcile(models_from_listing(&listing));
                debug!("Gemini discovery added {} models", added);
            }
            Err(e) => {
                warn!("Gemini connectivity check failed: {}", e);
                self.deps
                    .notifier
                    .notice("Error connecting to Gemini API. Please check your API key.");
                self.deps.notifier.notice(&e.to_string());
            }
        }
    }

    fn last_model(&self) -> Option<Model> {
        self.last.text()
    }

    fn last_image_model(&self) -> Option<Model> {
        self.last.image()
    }

    fn set_last_model(&self, model: Model) {
        self.deps.settings.write().gemini_settings.last_model = model.clone();
        self.last.set_text(model);
    }

    fn set_last_image_model(&self, model: Model) {
        self.deps.settings.write().gemini_settings.last_image_model = model.clone();
        self.last.set_image(model);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ModelRegistry, SharedRegistry};
    use crate::testing::{serve, RecordingNotifier, Request};
    use aiadapter_common::{LogNotifier, Settings, SharedSettings};
    use serde_json::json;
    use std::sync::Arc;

    fn provider() -> (GeminiProvider, SharedSettings) {
        let settings = Settings::default().into_shared();
        let provider = GeminiProvider::new(ProviderDeps {
            settings: settings.clone(),
            registry: ModelRegistry::new().into_shared(),
            notifier: Arc::new(LogNotifier),
        })
        .unwrap();
        (provider, settings)
    }

    #[test]
    fn test_models_from_listing() {
        let listing: Vec<GeminiModel> = serde_json::from_value(json!([
            {
                "name": "models/gemini-1.5-pro",
                "displayName": "Gemini 1.5 Pro",
                "supportedGenerationMethods": ["generateContent", "countTokens"]
            },
            {
                "name": "models/text-embedding-004",
                "displayName": "Text Embedding 004",
                "supportedGenerationMethods": ["embedContent"]
            },
            { "supportedGenerationMethods": ["generateContent"] }
        ]))
        .unwrap();

        let models = models_from_listing(&listing);
        assert_eq!(models.len(), 4);
        assert_eq!(models[0].model, "models/gemini-1.5-pro");
        assert!(models[0].image_ready);
        assert!(!models[1].image_ready);
        assert_eq!(models[2].name, "unknown");
    }

    #[test]
    fn test_listing_reconciles_without_duplicates() {
        let listing: Vec<GeminiModel> = serde_json::from_value(json!([{
            "name": "models/gemini-2.0-flash",
            "displayName": "Gemini 2.0 Flash",
            "supportedGenerationMethods": ["generateContent"]
        }]))
        .unwrap();

        let mut registry = ModelRegistry::new();
        assert_eq!(registry.reconcile(models_from_listing(&listing)), 0);
    }

    #[test]
    fn test_last_models_persist_into_settings() {
        let (provider, settings) = provider();
        assert_eq!(
            provider.last_model().unwrap().model,
            "models/gemini-2.0-flash"
        );

        let pro = Model::new("Gemini 1.5 Pro", "models/gemini-1.5-pro", false, ProviderKind::Gemini);
        provider.set_last_model(pro.clone());
        assert_eq!(settings.read().gemini_settings.last_model, pro);
        assert_eq!(provider.last_model(), Some(pro));

        let pro_image = Model::new("Gemini 1.5 Pro", "models/gemini-1.5-pro", true, ProviderKind::Gemini);
        provider.set_last_image_model(pro_image.clone());
        assert_eq!(settings.read().gemini_settings.last_image_model, pro_image);
    }

    #[test]
    fn test_settings_section() {
        let (provider, settings) = provider();
        settings.write().gemini_settings.api_key = "key".to_string();

        let mut panel = SettingsPanel::new();
        provider.generate_settings(&mut panel);
        assert_eq!(panel.items().len(), 2);
        assert!(panel.find(SettingField::GeminiApiKey).is_some());
        assert!(panel.find(SettingField::PullModel).is_none());
    }

    fn provider_at(url: &str) -> (GeminiProvider, SharedRegistry, Arc<RecordingNotifier>) {
        let mut settings = Settings::default();
        settings.provider = ProviderKind::Gemini;
        settings.selected_model = aiadapter_common::default_model_for(ProviderKind::Gemini, false);

        let registry = ModelRegistry::new().into_shared();
        let notifier = Arc::new(RecordingNotifier::default());
        let provider = GeminiProvider::with_base_url(
            ProviderDeps {
                settings: settings.into_shared(),
                registry: registry.clone(),
                notifier: notifier.clone(),
            },
            url,
        )
        .unwrap();
        (provider, registry, notifier)
    }

    fn api(request: &Request) -> (u16, String) {
        match (request.method.as_str(), request.path.as_str()) {
            ("GET", "/models") => (
                200,
                json!({ "models": [
                    {
                        "name": "models/gemini-2.0-flash",
                        "displayName": "Gemini 2.0 Flash",
                        "supportedGenerationMethods": ["generateContent"]
                    },
                    {
                        "name": "models/gemini-1.5-pro",
                        "displayName": "Gemini 1.5 Pro",
                        "supportedGenerationMethods": ["generateContent", "countTokens"]
                    },
                    {
                        "name": "models/text-embedding-004",
                        "displayName": "Text Embedding 004",
                        "supportedGenerationMethods": ["embedContent"]
                    }
                ]})
                .to_string(),
            ),
            ("POST", "/models/gemini-2.0-flash:generateContent") => {
                (200, json!({ "candidates": [] }).to_string())
            }
            _ => (404, json!({ "error": { "message": "not found" } }).to_string()),
        }
    }

    #[tokio::test]
    async fn test_check_registers_generate_content_models() {
        let url = serve(api).await;
        let (provider, registry, notifier) = provider_at(&url);
        let before = registry.read().models().len();

        provider.check().await;

        let registry = registry.read();
        assert_eq!(registry.models().len(), before + 2);
        assert!(registry.contains(ProviderKind::Gemini, "models/gemini-1.5-pro", true));
        assert!(registry.contains(ProviderKind::Gemini, "models/gemini-1.5-pro", false));
        assert!(!registry.contains(ProviderKind::Gemini, "models/text-embedding-004", false));
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_check_reports_rejected_key() {
        let url = serve(|_: &Request| {
            let body = json!({ "error": { "message": "API key not valid" } });
            (403, body.to_string())
        })
        .await;
        let (provider, registry, notifier) = provider_at(&url);
        let before = registry.read().models().len();

        provider.check().await;

        let messages = notifier.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(
            messages[0],
            "Error connecting to Gemini API. Please check your API key."
        );
        assert_eq!(registry.read().models().len(), before);
    }

    #[tokio::test]
    async fn test_empty_answer_yields_no_response_marker() {
        let url = serve(api).await;
        let (provider, _, _) = provider_at(&url);
        assert_eq!(provider.query_handling("hi").await.unwrap(), NO_RESPONSE);
    }
}
