use aiadapter_common::{AiAdapterError, Model, Notifier, ProviderKind, Result, SettingsPanel, SharedSettings};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::gemini_provider::GeminiProvider;
use crate::ollama_provider::OllamaProvider;
use crate::registry::SharedRegistry;

/// Shared state a provider is built from
#[derive(Clone)]
pub struct ProviderDeps {
    pub settings: SharedSettings,
    pub registry: SharedRegistry,
    pub notifier: Arc<dyn Notifier>,
}

/// Common trait for model providers
///
/// Every call that reaches the network is expected to run through the
/// request queue; implementations do no scheduling of their own.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Which backend this is
    fn kind(&self) -> ProviderKind;

    /// Answer a text prompt with the selected text model
    async fn query_handling(&self, prompt: &str) -> Result<String>;

    /// Answer a prompt about an image with the selected image model
    async fn query_with_image_handling(&self, prompt: &str, image: &str) -> Result<String>;

    /// Append the provider's own section to the settings panel
    fn generate_settings(&self, panel: &mut SettingsPanel);

    /// Check connectivity and register discovered models
    ///
    /// Failures are reported to the user and never returned.
    async fn check(&self);

    /// Last text model chosen while this provider was active
    fn last_model(&self) -> Option<Model>;

    /// Last image model chosen while this provider was active
    fn last_image_model(&self) -> Option<Model>;

    /// Remember the text model
    fn set_last_model(&self, model: Model);

    /// Remember the image model
    fn set_last_image_model(&self, model: Model);

    /// Download `model` onto the backend
    async fn pull_model(&self, model: &Model) -> Result<()> {
        Err(AiAdapterError::unsupported(format!(
            "{} cannot pull {}",
            self.kind(),
            model.name
        )))
    }
}

/// Builds the provider selected in the settings
pub type ProviderFactory = Arc<dyn Fn(&ProviderDeps) -> Result<Arc<dyn Provider>> + Send + Sync>;

/// Create the provider named by `settings.provider`
pub fn create_provider(deps: &ProviderDeps) -> Result<Arc<dyn Provider>> {
    let kind = deps.settings.read().provider;
    let provider: Arc<dyn Provider> = match kind {
        ProviderKind::Ollama => Arc::new(OllamaProvider::new(deps.clone())?),
        ProviderKind::Gemini => Arc::new(GeminiProvider::new(deps.clone())?),
    };
    Ok(provider)
}

/// Factory backed by [`create_provider`]
pub fn default_factory() -> ProviderFactory {
    Arc::new(create_provider)
}

/// In-memory last-used models
#[derive(Debug, Default)]
pub(crate) struct LastModels {
    text: Mutex<Option<Model>>,
    image: Mutex<Option<Model>>,
}

impl LastModels {
    pub(crate) fn new(text: Option<Model>, image: Option<Model>) -> Self {
        Self {
            text: Mutex::new(text),
            image: Mutex::new(image),
        }
    }

    pub(crate) fn text(&self) -> Option<Model> {
        self.text.lock().clone()
    }

    pub(crate) fn image(&self) -> Option<Model> {
        self.image.lock().clone()
    }

    pub(crate) fn set_text(&self, model: Model) {
        *self.text.lock() = Some(model);
    }

    pub(crate) fn set_image(&self, model: Model) {
        *self.image.lock() = Some(model);
    }
}
