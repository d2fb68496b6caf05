//! Settings page
//!
//! Builds the panel shown to the user and applies the edits the host
//! reports back. Every applied edit is persisted right away.

use aiadapter_common::settings::DEFAULT_OLLAMA_URL;
use aiadapter_common::{
    default_model_for, is_masked_echo, AiAdapterError, Model, ProviderKind, Result, SettingChange,
    SettingField, SettingsPanel,
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::context::AppContext;

pub struct SettingsTab {
    ctx: Arc<AppContext>,
    models_changed: watch::Receiver<u64>,
}

impl SettingsTab {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        let models_changed = ctx.registry().read().subscribe();
        Self {
            ctx,
            models_changed,
        }
    }

    /// Whether the model list changed since the last [`display`](Self::display)
    pub fn needs_redisplay(&self) -> bool {
        self.models_changed.has_changed().unwrap_or(false)
    }

    /// Describe the current settings page
    pub fn display(&mut self) -> SettingsPanel {
        let _ = self.models_changed.borrow_and_update();

        let settings = self.ctx.settings().read().clone();
        let (text_models, image_models) = {
            let registry = self.ctx.registry().read();
            (
                names(registry.filtered(settings.provider, false)),
                names(registry.filtered(settings.provider, true)),
            )
        };

        let mut panel = SettingsPanel::new();
        panel
            .dropdown(
                SettingField::Provider,
                "Provider",
                "Select the provider to use",
                ProviderKind::ALL.iter().map(|p| p.to_string()).collect(),
                settings.provider.to_string(),
            )
            .dropdown(
                SettingField::Model,
                "Model",
                "Select the model to use",
                text_models,
                settings.selected_model.name,
            )
            .dropdown(
                SettingField::ImageModel,
                "Image model",
                "Select the model to use for image queries",
                image_models,
                settings.selected_image_model.name,
            )
            .toggle(
                SettingField::Debug,
                "Debug mode",
                "Log requests and provider activity",
                settings.debug,
            );

        if let Some(provider) = self.ctx.provider() {
            provider.generate_settings(&mut panel);
        }
        panel
    }

    /// Apply one edit from the settings page
    pub async fn apply(&mut self, change: SettingChange) -> Result<()> {
        debug!("Applying setting change: {:?}", redacted(&change));

        match change {
            SettingChange::Provider(kind) => self.switch_provider(kind).await,
            SettingChange::Model(name) => self.select_model(&name, false),
            SettingChange::ImageModel(name) => self.select_model(&name, true),
            SettingChange::Debug(debug) => {
                self.ctx.settings().write().debug = debug;
                self.ctx.apply_debug();
                self.ctx.save_settings()
            }
            SettingChange::OllamaUrl(url) => {
                let url = url.trim();
                let url = if url.is_empty() { DEFAULT_OLLAMA_URL } else { url };
                self.ctx.settings().write().ollama_settings.url = url.to_string();
                self.credentials_changed(ProviderKind::Ollama).await
            }
            SettingChange::OllamaToken(token) => {
                if is_masked_echo(&token) {
                    return Ok(());
                }
                self.ctx.settings().write().ollama_settings.token = token;
                self.credentials_changed(ProviderKind::Ollama).await
            }
            SettingChange::GeminiApiKey(key) => {
                if is_masked_echo(&key) {
                    return Ok(());
                }
                self.ctx.settings().write().gemini_settings.api_key = key;
                self.credentials_changed(ProviderKind::Gemini).await
            }
            SettingChange::PullModel => self.ctx.pull_selected_model().await,
        }
    }

    async fn switch_provider(&mut self, kind: ProviderKind) -> Result<()> {
        self.ctx.settings().write().provider = kind;
        info!("Switching provider to {}", kind);

        // A failed construction is already reported; fall back to defaults
        let provider = self.ctx.install_provider().ok();

        let pick = |last: Option<Model>, image_ready: bool| {
            last.filter(|m| m.provider == kind && m.image_ready == image_ready)
                .unwrap_or_else(|| self.fallback_model(kind, image_ready))
        };
        let text = pick(provider.as_ref().and_then(|p| p.last_model()), false);
        let image = pick(provider.as_ref().and_then(|p| p.last_image_model()), true);

        {
            let mut settings = self.ctx.settings().write();
            settings.selected_model = text;
            settings.selected_image_model = image;
        }
        let saved = self.ctx.save_settings();

        // Check against the new selection
        if let Some(provider) = provider {
            self.ctx.check_provider(provider).await;
        }
        saved
    }

    /// Provider default when registered, else its first registered model
    fn fallback_model(&self, kind: ProviderKind, image_ready: bool) -> Model {
        let default = default_model_for(kind, image_ready);
        let registry = self.ctx.registry().read();
        if registry.contains(kind, &default.model, image_ready) {
            return default;
        }
        registry
            .filtered(kind, image_ready)
            .into_iter()
            .next()
            .unwrap_or(default)
    }

    fn select_model(&mut self, name: &str, image_ready: bool) -> Result<()> {
        let kind = self.ctx.settings().read().provider;
        let model = self
            .ctx
            .registry()
            .read()
            .find_by_name(kind, image_ready, name)
            .ok_or_else(|| {
                AiAdapterError::not_found(format!("No {} model named '{}'", kind, name))
            })?;

        {
            let mut settings = self.ctx.settings().write();
            if image_ready {
                settings.selected_image_model = model.clone();
            } else {
                settings.selected_model = model.clone();
            }
        }

        // Providers may write through to the settings; lock must be released
        if let Some(provider) = self.ctx.provider() {
            if image_ready {
                provider.set_last_image_model(model);
            } else {
                provider.set_last_model(model);
            }
        }
        self.ctx.save_settings()
    }

    async fn credentials_changed(&mut self, owner: ProviderKind) -> Result<()> {
        self.ctx.save_settings()?;

        if self.ctx.settings().read().provider != owner {
            return Ok(());
        }
        if let Err(e) = self.ctx.activate_provider().await {
            warn!("Provider not recreated after credential change: {}", e);
        }
        Ok(())
    }
}

fn names(models: Vec<Model>) -> Vec<String> {
    models.into_iter().map(|m| m.name).collect()
}

fn redacted(change: &SettingChange) -> SettingChange {
    match change {
        SettingChange::OllamaToken(_) => SettingChange::OllamaToken("<redacted>".to_string()),
        SettingChange::GeminiApiKey(_) => SettingChange::GeminiApiKey("<redacted>".to_string()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::{mock_factory, RecordingNotifier};
    use crate::store::MemoryStore;
    use aiadapter_common::{Control, SECRET_MASK};
    use aiadapter_llm::ProviderFactory;

    async fn tab_with(factory: ProviderFactory) -> (SettingsTab, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let ctx = AppContext::new(store.clone(), Arc::new(RecordingNotifier::default()))
            .with_factory(factory);
        ctx.activate_provider().await.unwrap();
        (SettingsTab::new(Arc::new(ctx)), store)
    }

    async fn tab() -> (SettingsTab, Arc<MemoryStore>) {
        tab_with(mock_factory(Ok("ok"), Vec::new())).await
    }

    fn dropdown(panel: &SettingsPanel, field: SettingField) -> (Vec<String>, String) {
        match &panel.find(field).unwrap().control {
            Control::Dropdown { options, value } => (options.clone(), value.clone()),
            other => panic!("expected dropdown, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_display_filters_models_by_capability() {
        let (mut tab, _) = tab().await;
        let panel = tab.display();

        let (providers, provider) = dropdown(&panel, SettingField::Provider);
        assert_eq!(providers, vec!["ollama", "gemini"]);
        assert_eq!(provider, "ollama");

        let (text, selected) = dropdown(&panel, SettingField::Model);
        assert_eq!(text.len(), 6);
        assert!(!text.iter().any(|n| n.contains("llava")));
        assert_eq!(selected, "llama3.2 (3B)");

        let (image, selected) = dropdown(&panel, SettingField::ImageModel);
        assert_eq!(image.len(), 6);
        assert_eq!(selected, "llava-llama3 (8B) [default]");

        assert_eq!(
            panel.find(SettingField::Debug).unwrap().name,
            "Debug mode"
        );
        assert!(panel.items().iter().any(|i| i.name == "Mock ollama"));
    }

    #[tokio::test]
    async fn test_select_model_persists() {
        let (mut tab, store) = tab().await;
        tab.apply(SettingChange::Model("llama3.1 (8B)".to_string()))
            .await
            .unwrap();

        let saved = store.snapshot().unwrap();
        assert_eq!(saved["selectedModel"]["model"], "llama3.1");
        assert_eq!(
            tab.ctx.provider().unwrap().last_model().unwrap().model,
            "llama3.1"
        );
    }

    #[tokio::test]
    async fn test_select_model_from_other_provider_is_rejected() {
        let (mut tab, _) = tab().await;
        let result = tab
            .apply(SettingChange::ImageModel("Gemini 2.0 Flash".to_string()))
            .await;
        assert!(matches!(result, Err(AiAdapterError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_switch_provider_selects_provider_models() {
        let (mut tab, store) = tab().await;
        tab.apply(SettingChange::Provider(ProviderKind::Gemini))
            .await
            .unwrap();

        let settings = tab.ctx.settings().read().clone();
        assert_eq!(settings.provider, ProviderKind::Gemini);
        assert_eq!(settings.selected_model.provider, ProviderKind::Gemini);
        assert!(settings.selected_image_model.image_ready);
        assert_eq!(tab.ctx.provider().unwrap().kind(), ProviderKind::Gemini);
        assert_eq!(store.snapshot().unwrap()["provider"], "gemini");

        let (text, _) = dropdown(&tab.display(), SettingField::Model);
        assert_eq!(text, vec!["Gemini 2.0 Flash"]);
    }

    #[tokio::test]
    async fn test_masked_echo_keeps_secret() {
        let (mut tab, _) = tab().await;
        tab.apply(SettingChange::OllamaToken("secret".to_string()))
            .await
            .unwrap();
        tab.apply(SettingChange::OllamaToken(SECRET_MASK.to_string()))
            .await
            .unwrap();
        assert_eq!(tab.ctx.settings().read().ollama_settings.token, "secret");
    }

    #[tokio::test]
    async fn test_empty_url_falls_back_to_default() {
        let (mut tab, _) = tab().await;
        tab.apply(SettingChange::OllamaUrl("http://gpu-box:11434".to_string()))
            .await
            .unwrap();
        assert_eq!(
            tab.ctx.settings().read().ollama_settings.url,
            "http://gpu-box:11434"
        );

        tab.apply(SettingChange::OllamaUrl("  ".to_string()))
            .await
            .unwrap();
        assert_eq!(
            tab.ctx.settings().read().ollama_settings.url,
            DEFAULT_OLLAMA_URL
        );
    }

    #[tokio::test]
    async fn test_debug_toggle_persists() {
        let (mut tab, store) = tab().await;
        tab.apply(SettingChange::Debug(true)).await.unwrap();
        assert_eq!(store.snapshot().unwrap()["debug"], true);
    }

    #[tokio::test]
    async fn test_discovery_requests_redisplay() {
        let discovered = vec![Model::new("phi4:latest", "phi4:latest", false, ProviderKind::Ollama)];
        let (mut tab, _) = tab_with(mock_factory(Ok("ok"), discovered)).await;

        tab.display();
        assert!(!tab.needs_redisplay());

        // Credential change rebuilds the provider, whose check finds nothing new
        tab.apply(SettingChange::OllamaUrl("http://other:11434".to_string()))
            .await
            .unwrap();
        assert!(!tab.needs_redisplay());

        tab.ctx.registry().write().reconcile(vec![Model::new(
            "qwen3:latest",
            "qwen3:latest",
            false,
            ProviderKind::Ollama,
        )]);
        assert!(tab.needs_redisplay());

        let (text, _) = dropdown(&tab.display(), SettingField::Model);
        assert!(text.contains(&"phi4:latest".to_string()));
        assert!(text.contains(&"qwen3:latest".to_string()));
        assert!(!tab.needs_redisplay());
    }

    #[tokio::test]
    async fn test_switch_provider_checks_new_selection() {
        let notifier = Arc::new(RecordingNotifier::default());
        let store = Arc::new(MemoryStore::with_data(serde_json::json!({
            "provider": "gemini",
            "selectedModel": default_model_for(ProviderKind::Gemini, false),
            "selectedImageModel": default_model_for(ProviderKind::Gemini, true)
        })));
        let ctx = AppContext::new(store, notifier.clone())
            .with_factory(mock_factory(Ok("ok"), Vec::new()));
        ctx.load_settings();
        ctx.activate_provider().await.unwrap();
        let mut tab = SettingsTab::new(Arc::new(ctx));

        tab.apply(SettingChange::Provider(ProviderKind::Ollama))
            .await
            .unwrap();
        tab.apply(SettingChange::Provider(ProviderKind::Gemini))
            .await
            .unwrap();

        assert!(notifier.messages().is_empty(), "{:?}", notifier.messages());
        assert_eq!(
            tab.ctx.settings().read().selected_model.provider,
            ProviderKind::Gemini
        );
    }
}
