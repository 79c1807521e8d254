//! Configuration persistence for the flashcard pile.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::session::DEFAULT_SESSION_SECONDS;

/// Application configuration that persists between sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// The currently selected theme name.
    #[serde(default = "default_theme")]
    pub theme: String,

    /// Length of a study session in seconds.
    #[serde(default = "default_session_seconds")]
    pub session_seconds: u32,

    #[serde(default)]
    pub accessibility: Accessibility,
}

/// Presentation preferences handed to the renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accessibility {
    #[serde(default)]
    pub differentiate_without_color: bool,
    #[serde(default)]
    pub voice_assistance: bool,
}

impl Accessibility {
    /// Whether explicit wrong/correct buttons replace swiping.
    pub fn explicit_buttons(&self) -> bool {
        self.differentiate_without_color || self.voice_assistance
    }
}

/// Command-line adjustments for a single run. They are never written back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overrides {
    pub session_seconds: Option<u32>,
    pub voice_assistance: bool,
}

impl Overrides {
    /// The config as this run sees it.
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(seconds) = self.session_seconds {
            config.session_seconds = seconds;
        }
        if self.voice_assistance {
            config.accessibility.voice_assistance = true;
        }
        config
    }
}

fn default_theme() -> String {
    "default".to_string()
}

fn default_session_seconds() -> u32 {
    DEFAULT_SESSION_SECONDS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            session_seconds: default_session_seconds(),
            accessibility: Accessibility::default(),
        }
    }
}

impl Config {
    /// Get the default config file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("flashpile")
            .join("config.toml")
    }

    /// Load config from `path`, returning default if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    /// Save config to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize config")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }
}
