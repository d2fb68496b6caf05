//! Ollama provider
//!
//! Talks to a local (or self-hosted) Ollama daemon. Discovery lists the
//! installed models and asks the daemon for their capabilities, falling
//! back to a name heuristic on daemons that do not report them.

use aiadapter_common::settings::DEFAULT_OLLAMA_URL;
use aiadapter_common::{masked, Model, ProviderKind, Result, SettingField, SettingsPanel};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::client::OllamaClient;
use crate::provider::{LastModels, Provider, ProviderDeps};
use crate::registry::same_model_id;
use crate::types::{LocalModel, PullProgress};

/// Name fragments of models known to accept images
const VISION_NAME_HINTS: [&str; 7] = [
    "llava",
    "bakllava",
    "vision",
    "moondream",
    "minicpm-v",
    "qwen2.5vl",
    "-vl",
];

/// Ollama-backed provider
pub struct OllamaProvider {
    client: OllamaClient,
    deps: ProviderDeps,
    last: LastModels,
}

impl OllamaProvider {
    /// Create provider from the current Ollama settings
    pub fn new(deps: ProviderDeps) -> Result<Self> {
        let (client, last) = {
            let settings = deps.settings.read();
            let client = OllamaClient::new(
                settings.ollama_settings.url.clone(),
                &settings.ollama_settings.token,
            )?;

            let own = |model: &Model| (model.provider == ProviderKind::Ollama).then(|| model.clone());
            let last = LastModels::new(
                own(&settings.selected_model),
                own(&settings.selected_image_model),
            );
            (client, last)
        };

        Ok(Self { client, deps, last })
    }

    /// Register installed models, returning how many were new
    async fn discover(&self, installed: &[LocalModel]) -> usize {
        let mut discovered = Vec::with_capacity(installed.len());

        for local in installed {
            let image_ready = match self.client.show(&local.name).await {
                Ok(details) if !details.capabilities.is_empty() => {
                    details.capabilities.iter().any(|c| c == "vision")
                }
                Ok(_) => looks_like_vision_model(&local.name),
                Err(e) => {
                    debug!("No details for {}: {}", local.name, e);
                    looks_like_vision_model(&local.name)
                }
            };

            discovered.push(Model::new(
                local.name.clone(),
                local.name.clone(),
                image_ready,
                ProviderKind::Ollama,
            ));
        }

        self.deps.registry.write().reconcile(discovered)
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Ollama
    }

    async fn query_handling(&self, prompt: &str) -> Result<String> {
        let model = self.deps.settings.read().selected_model.model.clone();
        self.client
            .chat(crate::types::ChatRequest::user(model, prompt, None))
            .await
    }

    async fn query_with_image_handling(&self, prompt: &str, image: &str) -> Result<String> {
        let model = self.deps.settings.read().selected_image_model.model.clone();
        self.client
            .chat(crate::types::ChatRequest::user(model, prompt, Some(image.to_string())))
            .await
    }

    fn generate_settings(&self, panel: &mut SettingsPanel) {
        let settings = self.deps.settings.read();

        panel
            .heading("Ollama")
            .button(
                SettingField::PullModel,
                "Pull Model",
                "Pull the selected model",
                "Pull Model",
            )
            .text(
                SettingField::OllamaUrl,
                "Ollama URL",
                "Set the URL for the Ollama server",
                Some(&format!("Enter the host ({})", DEFAULT_OLLAMA_URL)),
                settings.ollama_settings.url.clone(),
            )
            .text(
                SettingField::OllamaToken,
                "Ollama Token (Optional)",
                "Set the token for authentication with the Ollama server",
                None,
                masked(&settings.ollama_settings.token),
            );
    }

    async fn check(&self) {
        let installed = match self.client.list().await {
            Ok(installed) => installed,
            Err(e) => {
                warn!("Ollama connectivity check failed: {}", e);
                self.deps.notifier.notice("Failed to connect to Ollama.");
                self.deps.notifier.notice(&e.to_string());
                return;
            }
        };

        debug!(
            "Installed Ollama models: {:?}",
            installed.iter().map(|m| m.name.as_str()).collect::<Vec<_>>()
        );

        let selected = self.deps.settings.read().selected_model.clone();
        if !installed
            .iter()
            .any(|m| same_model_id(ProviderKind::Ollama, &m.name, &selected.model))
        {
            self.deps.notifier.notice(&format!(
                "No {} model found, please make sure you have pulled it (you can pull it over the settings tab or choose another model)",
                selected.name
            ));
        }

        self.discover(&installed).await;
    }

    fn last_model(&self) -> Option<Model> {
        self.last.text()
    }

    fn last_image_model(&self) -> Option<Model> {
        self.last.image()
    }

    fn set_last_model(&self, model: Model) {
        self.last.set_text(model);
    }

    fn set_last_image_model(&self, model: Model) {
        self.last.set_image(model);
    }

    async fn pull_model(&self, model: &Model) -> Result<()> {
        let notifier = &self.deps.notifier;
        notifier.notice(&format!(
            "Pulling {} model started, this may take a while...",
            model.name
        ));

        let mut progress = notifier.progress(&format!("Pulling {} model 0%", model.name));
        let result = self
            .client
            .pull(&model.model, |part| {
                debug!("{:?}", part);
                if let Some(message) = pull_progress_message(&model.name, part) {
                    progress.set_message(&message);
                }
            })
            .await;
        progress.hide();

        match result {
            Ok(()) => {
                notifier.notice(&format!("{} model pulled successfully", model.name));
                Ok(())
            }
            Err(e) => {
                warn!("Pull of {} failed: {}", model.model, e);
                notifier.notice(&format!("Failed to pull {} model", model.name));
                notifier.notice(&e.to_string());
                Err(e)
            }
        }
    }
}

/// Progress line for the pull notice, `None` when the part carries no sizes
pub fn pull_progress_message(name: &str, part: &PullProgress) -> Option<String> {
    let (Some(total), Some(completed)) = (part.total, part.completed) else {
        return None;
    };
    if total == 0 {
        return None;
    }

    let percentage = completed as f64 / total as f64 * 100.0;
    Some(format!(
        "Pulling {} model {:.2}% ({:.2}GB/{:.2}GB)",
        name,
        percentage,
        completed as f64 / 1e9,
        total as f64 / 1e9
    ))
}

/// Name-based fallback when the daemon reports no capabilities
pub fn looks_like_vision_model(name: &str) -> bool {
    let name = name.to_lowercase();
    VISION_NAME_HINTS.iter().any(|hint| name.contains(hint))
}
