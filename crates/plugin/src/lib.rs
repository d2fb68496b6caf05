//! AI adapter plugin
//!
//! Routes text and image prompts from other plugins to the configured
//! model provider, one request at a time.

pub mod api;
pub mod context;
pub mod plugin;
pub mod queue;
pub mod settings_tab;
pub mod store;

pub use api::AiAdapterApi;
pub use context::AppContext;
pub use plugin::AiAdapterPlugin;
pub use queue::{RequestQueue, DEFAULT_TASK_TIMEOUT};
pub use settings_tab::SettingsTab;
pub use store::{JsonFileStore, MemoryStore};
