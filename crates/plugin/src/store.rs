use aiadapter_common::{Result, SettingsStore};
use parking_lot::Mutex;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Settings blob kept in a JSON file
pub struct JsonFileStore {
    file_path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

impl SettingsStore for JsonFileStore {
    fn load_data(&self) -> Result<Option<Value>> {
        if !self.file_path.exists() {
            return Ok(None);
        }

        let data = fs::read_to_string(&self.file_path)?;
        if data.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(&data)?))
    }

    fn save_data(&self, data: &Value) -> Result<()> {
        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let data = serde_json::to_string_pretty(data)?;
        fs::write(&self.file_path, data)?;
        debug!("Settings saved to {}", self.file_path.display());
        Ok(())
    }
}

/// Settings blob kept in memory
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<Option<Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with `data`
    pub fn with_data(data: Value) -> Self {
        Self {
            data: Mutex::new(Some(data)),
        }
    }

    /// Last saved blob
    pub fn snapshot(&self) -> Option<Value> {
        self.data.lock().clone()
    }
}

impl SettingsStore for MemoryStore {
    fn load_data(&self) -> Result<Option<Value>> {
        Ok(self.data.lock().clone())
    }

    fn save_data(&self, data: &Value) -> Result<()> {
        *self.data.lock() = Some(data.clone());
        Ok(())
    }
}
