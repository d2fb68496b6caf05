use aiadapter_common::logger::DebugToggle;
use aiadapter_common::settings::{load_settings, save_settings};
use aiadapter_common::{AiAdapterError, Notifier, Result, Settings, SettingsStore, SharedSettings};
use aiadapter_llm::{default_factory, ModelRegistry, Provider, ProviderDeps, ProviderFactory, SharedRegistry};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::queue::RequestQueue;

/// Shared application context
///
/// Owns everything the plugin used to keep in module-level globals:
/// settings, the model registry, the active provider and the request queue.
pub struct AppContext {
    settings: SharedSettings,
    registry: SharedRegistry,
    provider: RwLock<Option<Arc<dyn Provider>>>,
    queue: RequestQueue,
    store: Arc<dyn SettingsStore>,
    notifier: Arc<dyn Notifier>,
    factory: ProviderFactory,
    debug_toggle: DebugToggle,
}

impl AppContext {
    /// Create context with default settings, catalog and providers
    ///
    /// Must be called inside a tokio runtime (the queue spawns its worker).
    pub fn new(store: Arc<dyn SettingsStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            settings: Settings::default().into_shared(),
            registry: ModelRegistry::new().into_shared(),
            provider: RwLock::new(None),
            queue: RequestQueue::new(),
            store,
            notifier,
            factory: default_factory(),
            debug_toggle: DebugToggle::noop(),
        }
    }

    /// Replace the provider factory
    pub fn with_factory(mut self, factory: ProviderFactory) -> Self {
        self.factory = factory;
        self
    }

    /// Replace the request queue
    pub fn with_queue(mut self, queue: RequestQueue) -> Self {
        self.queue = queue;
        self
    }

    /// Hook the `debug` setting up to the host's log filter
    pub fn with_debug_toggle(mut self, toggle: DebugToggle) -> Self {
        self.debug_toggle = toggle;
        self
    }

    pub fn settings(&self) -> &SharedSettings {
        &self.settings
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    pub fn queue(&self) -> &RequestQueue {
        &self.queue
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    /// Active provider, if one was initialized
    pub fn provider(&self) -> Option<Arc<dyn Provider>> {
        self.provider.read().clone()
    }

    /// Active provider, or notify the user that there is none
    pub fn require_provider(&self) -> Result<Arc<dyn Provider>> {
        self.provider().ok_or_else(|| {
            debug!("Provider not initialized");
            self.notifier.notice("Provider not initialized");
            AiAdapterError::NoProvider
        })
    }

    /// Replace settings with the persisted ones, merged over defaults
    pub fn load_settings(&self) {
        let loaded = load_settings(self.store.as_ref()).unwrap_or_else(|e| {
            warn!("Failed to load settings, using defaults: {}", e);
            Settings::default()
        });

        *self.settings.write() = loaded;
        self.apply_debug();
    }

    /// Persist the whole settings object
    pub fn save_settings(&self) -> Result<()> {
        let snapshot = self.settings.read().clone();
        save_settings(self.store.as_ref(), &snapshot)
    }

    /// Forward the `debug` setting to the log filter
    pub fn apply_debug(&self) {
        let debug = self.settings.read().debug;
        self.debug_toggle.set_debug(debug);
    }

    fn deps(&self) -> ProviderDeps {
        ProviderDeps {
            settings: self.settings.clone(),
            registry: self.registry.clone(),
            notifier: self.notifier.clone(),
        }
    }

    /// Build the provider named in the settings and run its self-check
    ///
    /// The new provider stays active whether or not the check succeeds.
    pub async fn activate_provider(&self) -> Result<Arc<dyn Provider>> {
        let provider = self.install_provider()?;
        self.check_provider(provider.clone()).await;
        Ok(provider)
    }

    /// Build the provider named in the settings and make it the active one
    pub fn install_provider(&self) -> Result<Arc<dyn Provider>> {
        let kind = self.settings.read().provider;

        let provider = match (self.factory)(&self.deps()) {
            Ok(provider) => provider,
            Err(e) => {
                warn!("Failed to create {} provider: {}", kind, e);
                *self.provider.write() = None;
                self.notifier
                    .notice(&format!("Failed to initialize {} provider", kind));
                self.notifier.notice(&e.to_string());
                return Err(e);
            }
        };

        *self.provider.write() = Some(provider.clone());
        info!("Provider activated: {}", kind);
        Ok(provider)
    }

    /// Run the provider's self-check through the request queue
    ///
    /// Check failures are reported by the provider itself.
    pub async fn check_provider(&self, provider: Arc<dyn Provider>) {
        let kind = provider.kind();
        let check = self
            .queue
            .add(async move {
                provider.check().await;
                Ok(())
            })
            .await;
        if let Err(e) = check {
            warn!("{} self-check did not complete: {}", kind, e);
        }
    }

    /// Pull the selected text model through the active provider
    pub async fn pull_selected_model(&self) -> Result<()> {
        let provider = self.require_provider()?;
        let model = self.settings.read().selected_model.clone();

        let result = self
            .queue
            .add(async move { provider.pull_model(&model).await })
            .await;

        if let Err(AiAdapterError::Unsupported(msg)) = &result {
            self.notifier.notice(msg);
        }
        result
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::store::MemoryStore;
    use aiadapter_common::{Model, ProviderKind};
    use serde_json::json;

    #[tokio::test]
    async fn test_load_settings_merges_over_defaults() {
        let store = Arc::new(MemoryStore::with_data(json!({ "debug": true, "provider": "gemini" })));
        let ctx = AppContext::new(store, Arc::new(RecordingNotifier::default()));
        ctx.load_settings();

        let settings = ctx.settings().read().clone();
        assert!(settings.debug);
        assert_eq!(settings.provider, ProviderKind::Gemini);
        assert_eq!(settings.selected_model, Settings::default().selected_model);
    }

    #[tokio::test]
    async fn test_require_provider_notifies() {
        let notifier = Arc::new(RecordingNotifier::default());
        let ctx = AppContext::new(Arc::new(MemoryStore::new()), notifier.clone());

        assert!(matches!(ctx.require_provider(), Err(AiAdapterError::NoProvider)));
        assert_eq!(notifier.messages(), vec!["Provider not initialized"]);
    }

    #[tokio::test]
    async fn test_activate_provider_runs_discovery() {
        let discovered = vec![Model::new("phi4:latest", "phi4:latest", false, ProviderKind::Ollama)];
        let ctx = AppContext::new(
            Arc::new(MemoryStore::new()),
            Arc::new(RecordingNotifier::default()),
        )
        .with_factory(mock_factory(Ok("hi"), discovered));

        let mut changes = ctx.registry().read().subscribe();
        let provider = ctx.activate_provider().await.unwrap();

        assert_eq!(provider.kind(), ProviderKind::Ollama);
        assert!(ctx.provider().is_some());
        assert!(ctx.registry().read().contains(ProviderKind::Ollama, "phi4:latest", false));
        assert!(changes.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_failing_factory_leaves_no_provider() {
        let notifier = Arc::new(RecordingNotifier::default());
        let failing: ProviderFactory =
            Arc::new(|_: &ProviderDeps| Err(AiAdapterError::config("bad token")));
        let ctx = AppContext::new(Arc::new(MemoryStore::new()), notifier.clone())
            .with_factory(failing);

        assert!(ctx.activate_provider().await.is_err());
        assert!(ctx.provider().is_none());
        assert_eq!(notifier.messages()[0], "Failed to initialize ollama provider");
    }

    #[tokio::test]
    async fn test_pull_unsupported_is_reported() {
        let notifier = Arc::new(RecordingNotifier::default());
        let ctx = AppContext::new(Arc::new(MemoryStore::new()), notifier.clone())
            .with_factory(mock_factory(Ok("hi"), Vec::new()));
        ctx.activate_provider().await.unwrap();

        let result = ctx.pull_selected_model().await;
        assert!(matches!(result, Err(AiAdapterError::Unsupported(_))));
        assert_eq!(notifier.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_save_settings_writes_store() {
        let store = Arc::new(MemoryStore::new());
        let ctx = AppContext::new(store.clone(), Arc::new(RecordingNotifier::default()));
        ctx.settings().write().ollama_settings.token = "t0k".to_string();
        ctx.save_settings().unwrap();

        let saved = store.snapshot().unwrap();
        assert_eq!(saved["ollamaSettings"]["token"], "t0k");
    }
}
