//! Model registry
//!
//! Ordered, append-only list of known models. Providers add the models they
//! discover; entries are never removed. Every change bumps a version number
//! published on a watch channel so open settings views know to re-render.

use aiadapter_common::{default_models, Model, ProviderKind};
use parking_lot::RwLock;
use std::borrow::Cow;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Registry handle shared between the context, providers and the settings tab
pub type SharedRegistry = Arc<RwLock<ModelRegistry>>;

/// Known models
#[derive(Debug)]
pub struct ModelRegistry {
    models: Vec<Model>,
    version: watch::Sender<u64>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::with_models(default_models())
    }
}

impl ModelRegistry {
    /// Registry seeded with the built-in catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with `models`
    pub fn with_models(models: Vec<Model>) -> Self {
        let (version, _) = watch::channel(0);
        Self { models, version }
    }

    /// Wrap into a shared handle
    pub fn into_shared(self) -> SharedRegistry {
        Arc::new(RwLock::new(self))
    }

    /// All entries in registration order
    pub fn models(&self) -> &[Model] {
        &self.models
    }

    /// Entries of one provider with the given capability
    pub fn filtered(&self, provider: ProviderKind, image_ready: bool) -> Vec<Model> {
        self.models
            .iter()
            .filter(|m| m.provider == provider && m.image_ready == image_ready)
            .cloned()
            .collect()
    }

    /// Look up by display name within a provider and capability
    pub fn find_by_name(&self, provider: ProviderKind, image_ready: bool, name: &str) -> Option<Model> {
        self.models
            .iter()
            .find(|m| m.provider == provider && m.image_ready == image_ready && m.name == name)
            .cloned()
    }

    /// Whether `(model id, capability)` is already registered for `provider`
    pub fn contains(&self, provider: ProviderKind, model_id: &str, image_ready: bool) -> bool {
        self.models.iter().any(|m| {
            m.provider == provider
                && m.image_ready == image_ready
                && same_model_id(provider, &m.model, model_id)
        })
    }

    /// Append `model` unless its slot is taken, without notifying
    fn insert(&mut self, model: Model) -> bool {
        if self.contains(model.provider, &model.model, model.image_ready) {
            return false;
        }

        debug!("Added model: {} ({})", model.name, model.model);
        self.models.push(model);
        true
    }

    /// Append discovered models, notifying subscribers when anything was added
    ///
    /// Returns the number of new entries.
    pub fn reconcile(&mut self, discovered: impl IntoIterator<Item = Model>) -> usize {
        let mut added = 0;
        for model in discovered {
            if self.insert(model) {
                added += 1;
            }
        }

        if added > 0 {
            debug!("Models updated ({} new), notifying settings tab", added);
            self.version.send_modify(|v| *v += 1);
        }

        added
    }

    /// Current change counter
    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    /// Subscribe to change notifications; dropping the receiver unsubscribes
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }
}

/// Whether two ids name the same model of `provider`
///
/// Ollama treats an untagged name as `name:latest`.
pub fn same_model_id(provider: ProviderKind, a: &str, b: &str) -> bool {
    match provider {
        ProviderKind::Ollama => with_tag(a) == with_tag(b),
        ProviderKind::Gemini => a == b,
    }
}

fn with_tag(name: &str) -> Cow<'_, str> {
    if name.contains(':') {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("{}:latest", name))
    }
}
