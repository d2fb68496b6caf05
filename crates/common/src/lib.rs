pub mod config;
pub mod error;
pub mod logger;
pub mod notice;
pub mod settings;
pub mod types;
pub mod ui;

// Re-export commonly used types
pub use config::HostConfig;
pub use error::AiAdapterError;
pub use notice::{LogNotifier, Notifier, ProgressNotice};
pub use settings::{GeminiSettings, OllamaSettings, Settings, SettingsStore, SharedSettings};
pub use types::{default_model_for, default_models, Model, ProviderKind};
pub use ui::{is_masked_echo, masked, Control, SECRET_MASK, SettingChange, SettingField, SettingItem, SettingsPanel};
pub type Result<T> = std::result::Result<T, AiAdapterError>;
