//! Settings persistence
//!
//! The application's durable settings: where the chat endpoint lives and a
//! few render-policy overrides. Stored as TOML at an explicit path supplied
//! by the caller; a missing file means defaults.

use crate::chat::ChatConfig;
use crate::{Error, RenderOptions, Result, Viewport};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Chat-endpoint settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    /// Default target language for `translate`
    pub target_language: String,
    pub timeout_ms: u64,
}

impl Default for ChatSettings {
    fn default() -> Self {
        let chat = ChatConfig::default();
        Self {
            endpoint: chat.endpoint,
            api_key: chat.api_key,
            model: chat.model,
            target_language: "English".to_string(),
            timeout_ms: chat.timeout_ms,
        }
    }
}

/// Render-policy overrides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// First-pass viewport width in CSS pixels
    pub first_pass_width: u32,
    /// Margin around measured content when right-sizing, CSS pixels
    pub resize_margin: u32,
    /// End-to-end render budget in milliseconds
    pub overall_timeout_ms: u64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        let options = RenderOptions::default();
        Self {
            first_pass_width: options.first_pass_viewport.width,
            resize_margin: options.resize_margin,
            overall_timeout_ms: options.overall_timeout.as_millis() as u64,
        }
    }
}

/// Durable application settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub chat: ChatSettings,
    pub render: RenderSettings,
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Load settings, falling back to defaults when the file does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Persist settings as TOML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let raw = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize settings: {}", e)))?;
        std::fs::write(path.as_ref(), raw).map_err(|e| {
            Error::Config(format!(
                "Failed to write {}: {}",
                path.as_ref().display(),
                e
            ))
        })
    }

    /// Chat-client configuration derived from these settings.
    pub fn chat_config(&self) -> ChatConfig {
        ChatConfig {
            endpoint: self.chat.endpoint.clone(),
            api_key: self.chat.api_key.clone(),
            model: self.chat.model.clone(),
            timeout_ms: self.chat.timeout_ms,
        }
    }

    /// Pipeline options derived from these settings.
    pub fn render_options(&self) -> RenderOptions {
        let defaults = RenderOptions::default();
        RenderOptions {
            first_pass_viewport: Viewport {
                width: self.render.first_pass_width,
                height: defaults.first_pass_viewport.height,
            },
            resize_margin: self.render.resize_margin,
            overall_timeout: std::time::Duration::from_millis(self.render.overall_timeout_ms),
            ..defaults
        }
    }
}
