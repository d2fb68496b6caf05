use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AiAdapterError;

/// Model provider backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Local Ollama daemon
    Ollama,
    /// Google Gemini API
    Gemini,
}

impl ProviderKind {
    /// All providers in the order they are offered to the user
    pub const ALL: [ProviderKind; 2] = [ProviderKind::Ollama, ProviderKind::Gemini];

    /// Identifier used in persisted settings and dropdowns
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::Gemini => "gemini",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = AiAdapterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "gemini" => Ok(Self::Gemini),
            other => Err(AiAdapterError::invalid_input(format!(
                "Unknown provider: {}",
                other
            ))),
        }
    }
}

/// A model known to the plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Display name
    pub name: String,

    /// Provider-specific model identifier (e.g., "llava:13b")
    pub model: String,

    /// Whether the model accepts an image alongside the prompt
    pub image_ready: bool,

    /// Provider serving the model
    pub provider: ProviderKind,
}

impl Model {
    /// Create new model entry
    pub fn new(
        name: impl Into<String>,
        model: impl Into<String>,
        image_ready: bool,
        provider: ProviderKind,
    ) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            image_ready,
            provider,
        }
    }

    /// Whether two entries describe the same registry slot
    pub fn same_slot(&self, other: &Model) -> bool {
        self.provider == other.provider
            && self.model == other.model
            && self.image_ready == other.image_ready
    }
}

/// Models known before any discovery pass
pub fn default_models() -> Vec<Model> {
    use ProviderKind::{Gemini, Ollama};

    vec![
        Model::new("llava-llama3 (8B) [default]", "llava-llama3:latest", true, Ollama),
        Model::new("llama3.2-vision (11B)", "llama3.2-vision:11b", true, Ollama),
        Model::new("llama3.2-vision (90B)", "llama3.2-vision:90b", true, Ollama),
        Model::new("llava (7B)", "llava:latest", true, Ollama),
        Model::new("llava (13B)", "llava:13b", true, Ollama),
        Model::new("llava (34B)", "llava:34b", true, Ollama),
        Model::new("llama3.3 (70B)", "llama3.3", false, Ollama),
        Model::new("deepseek-r1 (7B)", "deepseek-r1", false, Ollama),
        Model::new("llama3.2 (3B)", "llama3.2", false, Ollama),
        Model::new("llama3.2 (1B)", "llama3.2:1b", false, Ollama),
        Model::new("llama3.1 (8B)", "llama3.1", false, Ollama),
        Model::new("llama3.1 (70B)", "llama3.1:70b", false, Ollama),
        Model::new("Gemini 2.0 Flash", "models/gemini-2.0-flash", true, Gemini),
        Model::new("Gemini 2.0 Flash", "models/gemini-2.0-flash", false, Gemini),
    ]
}

/// Default selection for a provider, by capability
pub fn default_model_for(provider: ProviderKind, image_ready: bool) -> Model {
    let (name, model) = match (provider, image_ready) {
        (ProviderKind::Ollama, true) => ("llava-llama3 (8B) [default]", "llava-llama3:latest"),
        (ProviderKind::Ollama, false) => ("llama3.2 (3B)", "llama3.2"),
        (ProviderKind::Gemini, _) => ("Gemini 2.0 Flash", "models/gemini-2.0-flash"),
    };
    Model::new(name, model, image_ready, provider)
}
