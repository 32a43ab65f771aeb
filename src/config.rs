//! Viewer settings loaded from TOML.
//!
//! Every section uses `#[serde(default)]`, so a file that only overrides
//! `[shading]` leaves the window, camera and bindings at their defaults.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::camera::CameraSettings;
use crate::input::{BindingError, KeyBindings};
use crate::lighting::ShadingParams;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid key binding: {0}")]
    Binding(#[from] BindingError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "Garden Scene".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowSettings,
    pub camera: CameraSettings,
    pub shading: ShadingParams,
    /// `action name = "key name"` overrides, e.g. `forward = "Up"`.
    pub bindings: BTreeMap<String, String>,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        // Surface bad bindings at load time rather than on first key press.
        config.key_bindings()?;
        Ok(config)
    }

    pub fn key_bindings(&self) -> Result<KeyBindings, ConfigError> {
        let overrides = self
            .bindings
            .iter()
            .map(|(action, key)| (action.as_str(), key.as_str()));
        Ok(KeyBindings::with_overrides(overrides)?)
    }
}
