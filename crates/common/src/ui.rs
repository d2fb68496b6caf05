//! Declarative settings panel
//!
//! The plugin describes its settings page as a list of items; the host
//! renders them with its own widget toolkit and reports edits back as
//! [`SettingChange`] values.

use crate::error::AiAdapterError;
use crate::types::ProviderKind;
use std::fmt;
use std::str::FromStr;

/// Placeholder shown instead of a stored secret
pub const SECRET_MASK: &str = "••••••••••";

/// Value to display for a secret field
pub fn masked(secret: &str) -> String {
    if secret.is_empty() {
        String::new()
    } else {
        SECRET_MASK.to_string()
    }
}

/// Whether an edit merely echoes the mask back
pub fn is_masked_echo(input: &str) -> bool {
    input.contains('•')
}

/// Editable field behind a panel item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingField {
    Provider,
    Model,
    ImageModel,
    Debug,
    OllamaUrl,
    OllamaToken,
    GeminiApiKey,
    PullModel,
}

impl SettingField {
    /// Key used on the command line
    pub fn key(&self) -> &'static str {
        match self {
            Self::Provider => "provider",
            Self::Model => "model",
            Self::ImageModel => "image-model",
            Self::Debug => "debug",
            Self::OllamaUrl => "ollama-url",
            Self::OllamaToken => "ollama-token",
            Self::GeminiApiKey => "gemini-key",
            Self::PullModel => "pull",
        }
    }

    /// Build a change from raw user input
    pub fn change(&self, raw: &str) -> Result<SettingChange, AiAdapterError> {
        let value = raw.to_string();
        Ok(match self {
            Self::Provider => SettingChange::Provider(raw.parse()?),
            Self::Model => SettingChange::Model(value),
            Self::ImageModel => SettingChange::ImageModel(value),
            Self::Debug => SettingChange::Debug(parse_bool(raw)?),
            Self::OllamaUrl => SettingChange::OllamaUrl(value),
            Self::OllamaToken => SettingChange::OllamaToken(value),
            Self::GeminiApiKey => SettingChange::GeminiApiKey(value),
            Self::PullModel => SettingChange::PullModel,
        })
    }
}

impl FromStr for SettingField {
    type Err = AiAdapterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Self::Provider,
            Self::Model,
            Self::ImageModel,
            Self::Debug,
            Self::OllamaUrl,
            Self::OllamaToken,
            Self::GeminiApiKey,
            Self::PullModel,
        ]
        .into_iter()
        .find(|field| field.key() == s)
        .ok_or_else(|| AiAdapterError::invalid_input(format!("Unknown setting: {}", s)))
    }
}

fn parse_bool(raw: &str) -> Result<bool, AiAdapterError> {
    match raw.to_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        other => Err(AiAdapterError::invalid_input(format!(
            "Expected on/off, got '{}'",
            other
        ))),
    }
}

/// An edit reported by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingChange {
    /// New active provider
    Provider(ProviderKind),
    /// Text model, by display name
    Model(String),
    /// Image model, by display name
    ImageModel(String),
    Debug(bool),
    OllamaUrl(String),
    OllamaToken(String),
    GeminiApiKey(String),
    /// "Pull Model" button pressed
    PullModel,
}

/// Widget kind of a panel item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    Heading,
    Dropdown { options: Vec<String>, value: String },
    Toggle(bool),
    Text { placeholder: Option<String>, value: String },
    Button { label: String },
}

/// One row of the settings panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingItem {
    /// Field edited through this row; `None` for headings
    pub field: Option<SettingField>,
    pub name: String,
    pub desc: String,
    pub control: Control,
}

/// Settings page description
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsPanel {
    items: Vec<SettingItem>,
}

impl SettingsPanel {
    /// Create empty panel
    pub fn new() -> Self {
        Self::default()
    }

    /// Section heading
    pub fn heading(&mut self, name: impl Into<String>) -> &mut Self {
        self.items.push(SettingItem {
            field: None,
            name: name.into(),
            desc: String::new(),
            control: Control::Heading,
        });
        self
    }

    /// Selection among options
    pub fn dropdown(
        &mut self,
        field: SettingField,
        name: impl Into<String>,
        desc: impl Into<String>,
        options: Vec<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        self.push(field, name, desc, Control::Dropdown {
            options,
            value: value.into(),
        })
    }

    /// On/off switch
    pub fn toggle(
        &mut self,
        field: SettingField,
        name: impl Into<String>,
        desc: impl Into<String>,
        value: bool,
    ) -> &mut Self {
        self.push(field, name, desc, Control::Toggle(value))
    }

    /// Free text input
    pub fn text(
        &mut self,
        field: SettingField,
        name: impl Into<String>,
        desc: impl Into<String>,
        placeholder: Option<&str>,
        value: impl Into<String>,
    ) -> &mut Self {
        self.push(field, name, desc, Control::Text {
            placeholder: placeholder.map(str::to_string),
            value: value.into(),
        })
    }

    /// Action button
    pub fn button(
        &mut self,
        field: SettingField,
        name: impl Into<String>,
        desc: impl Into<String>,
        label: impl Into<String>,
    ) -> &mut Self {
        self.push(field, name, desc, Control::Button {
            label: label.into(),
        })
    }

    fn push(
        &mut self,
        field: SettingField,
        name: impl Into<String>,
        desc: impl Into<String>,
        control: Control,
    ) -> &mut Self {
        self.items.push(SettingItem {
            field: Some(field),
            name: name.into(),
            desc: desc.into(),
            control,
        });
        self
    }

    /// Rows in display order
    pub fn items(&self) -> &[SettingItem] {
        &self.items
    }

    /// Row editing `field`
    pub fn find(&self, field: SettingField) -> Option<&SettingItem> {
        self.items.iter().find(|item| item.field == Some(field))
    }
}

impl fmt::Display for SettingsPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in &self.items {
            let key = item.field.map(|field| field.key()).unwrap_or_default();
            match &item.control {
                Control::Heading => writeln!(f, "\n== {} ==", item.name)?,
                Control::Dropdown { options, value } => {
                    writeln!(f, "{} [{}]: {}", item.name, key, value)?;
                    for option in options {
                        let marker = if option == value { '*' } else { ' ' };
                        writeln!(f, "   {} {}", marker, option)?;
                    }
                }
                Control::Toggle(value) => {
                    writeln!(f, "{} [{}]: {}", item.name, key, if *value { "on" } else { "off" })?
                }
                Control::Text { value, .. } => writeln!(f, "{} [{}]: {}", item.name, key, value)?,
                Control::Button { label } => writeln!(f, "{} [{}]: <{}>", item.name, key, label)?,
            }
        }
        Ok(())
    }
}
