//! Plugin settings and their persistence contract
//!
//! Settings are persisted as one JSON object. Loading merges the persisted
//! object over the defaults key by key at the top level only, so nested
//! blocks such as `ollamaSettings` are replaced as a whole.

use crate::types::{default_model_for, Model, ProviderKind};
use crate::Result;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Default Ollama daemon address
pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Settings handle shared between the context, providers and the settings tab
pub type SharedSettings = Arc<RwLock<Settings>>;

/// Ollama connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OllamaSettings {
    /// Daemon base URL
    pub url: String,

    /// Optional bearer token
    pub token: String,
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_OLLAMA_URL.to_string(),
            token: String::new(),
        }
    }
}

/// Gemini credentials and remembered models
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeminiSettings {
    /// Last text model chosen while Gemini was active
    pub last_model: Model,

    /// Last image model chosen while Gemini was active
    pub last_image_model: Model,

    /// API key
    pub api_key: String,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            last_model: default_model_for(ProviderKind::Gemini, false),
            last_image_model: default_model_for(ProviderKind::Gemini, true),
            api_key: String::new(),
        }
    }
}

/// Plugin settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Verbose logging
    pub debug: bool,

    /// Active provider
    pub provider: ProviderKind,

    /// Model used for text prompts
    pub selected_model: Model,

    /// Model used for image prompts
    pub selected_image_model: Model,

    /// Ollama block
    pub ollama_settings: OllamaSettings,

    /// Gemini block
    pub gemini_settings: GeminiSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            provider: ProviderKind::Ollama,
            selected_model: default_model_for(ProviderKind::Ollama, false),
            selected_image_model: default_model_for(ProviderKind::Ollama, true),
            ollama_settings: OllamaSettings::default(),
            gemini_settings: GeminiSettings::default(),
        }
    }
}

impl Settings {
    /// Merge persisted data over the defaults
    ///
    /// Missing top-level keys keep their default value, and so does any key
    /// whose persisted value does not deserialize. Data that is not an object
    /// yields the defaults.
    pub fn merged_over_defaults(persisted: Option<Value>) -> Self {
        let defaults = Self::default();

        let Some(persisted) = persisted else {
            return defaults;
        };

        let Value::Object(persisted) = persisted else {
            warn!("Persisted settings are not an object, using defaults");
            return defaults;
        };

        let mut merged = match serde_json::to_value(&defaults) {
            Ok(Value::Object(map)) => map,
            _ => return defaults,
        };

        for (key, value) in persisted {
            let previous = merged.insert(key.clone(), value);
            if let Err(e) = serde_json::from_value::<Self>(Value::Object(merged.clone())) {
                warn!("Ignoring persisted setting '{}': {}", key, e);
                match previous {
                    Some(previous) => merged.insert(key, previous),
                    None => merged.remove(&key),
                };
            }
        }

        serde_json::from_value(Value::Object(merged)).unwrap_or(defaults)
    }

    /// Wrap into a shared handle
    pub fn into_shared(self) -> SharedSettings {
        Arc::new(RwLock::new(self))
    }
}

/// Host persistence for the settings blob
pub trait SettingsStore: Send + Sync {
    /// Read the persisted blob, `None` when nothing was saved yet
    fn load_data(&self) -> Result<Option<Value>>;

    /// Replace the persisted blob
    fn save_data(&self, data: &Value) -> Result<()>;
}

/// Load settings from a store, merged over defaults
pub fn load_settings(store: &dyn SettingsStore) -> Result<Settings> {
    let persisted = store.load_data()?;
    let settings = Settings::merged_over_defaults(persisted);
    debug!("Settings loaded: {:?}", settings);
    Ok(settings)
}

/// Persist the whole settings object
pub fn save_settings(store: &dyn SettingsStore, settings: &Settings) -> Result<()> {
    let data = serde_json::to_value(settings)?;
    store.save_data(&data)
}
