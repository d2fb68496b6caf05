//! AI Adapter model providers
//!
//! Ollama and Gemini clients, the model registry and the provider
//! abstraction the plugin dispatches through.

mod client;
mod gemini_client;
mod gemini_provider;
mod ollama_provider;
mod provider;
mod registry;
mod types;

#[cfg(test)]
mod testing;

pub use client::OllamaClient;
pub use gemini_client::{GeminiClient, GEMINI_BASE_URL};
pub use gemini_provider::{models_from_listing, GeminiProvider, NO_RESPONSE};
pub use ollama_provider::{looks_like_vision_model, pull_progress_message, OllamaProvider};
pub use provider::{create_provider, default_factory, Provider, ProviderDeps, ProviderFactory};
pub use registry::{same_model_id, ModelRegistry, SharedRegistry};
pub use types::{
    ChatMessage, ChatRequest, ChatResponse, GeminiModel, GenerateContentRequest,
    GenerateContentResponse, LocalModel, PullProgress,
};
