use crate::error::AiAdapterError;
use std::path::PathBuf;

/// Host application configuration
///
/// Describes where the host keeps plugin data and logs. The plugin's own
/// settings live in the persisted blob inside `data_dir`.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Directory holding the persisted settings blob
    pub data_dir: PathBuf,

    /// Log directory
    pub log_dir: PathBuf,

    /// Log level
    pub log_level: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            log_dir: PathBuf::from("./data/log"),
            log_level: "info".to_string(),
        }
    }
}

impl HostConfig {
    /// File name of the persisted settings blob
    pub const DATA_FILE: &'static str = "data.json";

    /// Load configuration from environment variables and .env file
    pub fn from_env() -> Result<Self, AiAdapterError> {
        // Load .env file (ignore if not exists)
        let _ = dotenv::dotenv();

        let config = Self {
            data_dir: Self::get_env_path("AIADAPTER_DATA_DIR")
                .unwrap_or_else(|| PathBuf::from("./data")),
            log_dir: Self::get_env_path("AIADAPTER_LOG_DIR")
                .unwrap_or_else(|| PathBuf::from("./data/log")),
            log_level: std::env::var("AIADAPTER_LOG_LEVEL")
                .unwrap_or_else(|_| "info".to_string()),
        };

        config.validate()?;

        Ok(config)
    }

    /// Get PathBuf from environment variable
    fn get_env_path(key: &str) -> Option<PathBuf> {
        std::env::var(key).ok().map(PathBuf::from)
    }

    /// Ensure required directories exist, create if not
    pub fn ensure_directories(&self) -> Result<(), AiAdapterError> {
        for dir in [&self.data_dir, &self.log_dir] {
            if !dir.exists() {
                std::fs::create_dir_all(dir).map_err(|e| {
                    AiAdapterError::config(format!(
                        "Failed to create directory {}: {}",
                        dir.display(),
                        e
                    ))
                })?;
            }
        }

        Ok(())
    }

    /// Path of the persisted settings blob
    pub fn data_file(&self) -> PathBuf {
        self.data_dir.join(Self::DATA_FILE)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), AiAdapterError> {
        if self.log_level.trim().is_empty() {
            return Err(AiAdapterError::config("Log level cannot be empty"));
        }

        if self.data_dir.as_os_str().is_empty() {
            return Err(AiAdapterError::config("Data directory cannot be empty"));
        }

        Ok(())
    }
}
