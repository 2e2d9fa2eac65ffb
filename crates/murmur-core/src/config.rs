//! Module for accessing, saving, and loading configuration files.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use dirs::config_dir;
use global_hotkey::hotkey::{Code, HotKey, Modifiers};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::APP_NAME;

/// Configuration structure for the application.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// The global hotkey that toggles recording.
    #[serde(
        default = "default_hotkey",
        skip_serializing_if = "Config::is_default_hotkey"
    )]
    hotkey: HotKey,

    /// Groq API key. Transcription requests fail cleanly while this is
    /// unset, the rest of the app keeps running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    groq_key: Option<String>,

    /// Preferred language hint for transcription
    #[serde(default, skip_serializing_if = "Option::is_none")]
    language: Option<String>,

    /// Model to use for transcriptions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    model: Option<String>,

    /// Restore the clipboard contents after pasting. This only takes effect
    /// when we are using the auto-paste feature.
    #[serde(default, skip_serializing_if = "Config::is_default_restore_clipboard")]
    restore_clipboard: bool,

    /// Paste contents automatically after transcribing
    #[serde(
        default = "default_auto_paste",
        skip_serializing_if = "Config::is_default_auto_paste"
    )]
    auto_paste: bool,
}

/// Provides the default `HotKey` configuration: ctrl+space.
fn default_hotkey() -> HotKey {
    HotKey::new(Some(Modifiers::CONTROL), Code::Space)
}

fn default_auto_paste() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hotkey: default_hotkey(),
            groq_key: None,
            language: None,
            model: None,
            restore_clipboard: false,
            auto_paste: default_auto_paste(),
        }
    }
}

impl Config {
    /// Returns the current hotkey configuration.
    pub fn hotkey(&self) -> HotKey {
        self.hotkey
    }

    /// Overrides the hotkey. Used when a rebind fails and the chord that is
    /// actually registered must stay authoritative.
    pub fn set_hotkey(&mut self, hotkey: HotKey) {
        self.hotkey = hotkey;
    }

    /// Sets a new Groq API key.
    #[allow(unused)]
    pub fn set_groq_key(&mut self, key: &str) {
        self.groq_key = Some(key.to_owned());
    }

    /// Retrieves the Groq API key, if set.
    pub fn groq_key(&self) -> Option<&str> {
        self.groq_key.as_deref()
    }

    /// Checks if the provided hotkey is the default value.
    fn is_default_hotkey(hotkey: &HotKey) -> bool {
        hotkey == &default_hotkey()
    }

    /// Checks if the provided restore clipboard is the default value.
    fn is_default_restore_clipboard(restore_clipboard: &bool) -> bool {
        restore_clipboard == &Self::default().restore_clipboard
    }

    /// Checks if the provided auto paste is the default value.
    fn is_default_auto_paste(auto_paste: &bool) -> bool {
        auto_paste == &Self::default().auto_paste
    }

    /// Returns the language hint for transcription.
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Returns the model to use for transcriptions.
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Restore the clipboard contents after pasting. This only takes effect
    /// when we are using the auto-paste feature.
    pub fn restore_clipboard(&self) -> bool {
        self.restore_clipboard
    }

    /// Paste contents automatically after transcribing
    pub fn auto_paste(&self) -> bool {
        self.auto_paste
    }
}

/// Manages loading, saving, and reloading the configuration.
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Creates a new `ConfigManager` with the default configuration directory.
    pub fn new() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Ok(Self { config_path })
    }

    /// Creates a new `ConfigManager` with a specified configuration directory.
    /// Useful for testing with temporary directories.
    #[cfg(test)]
    pub fn with_config_dir<P: AsRef<std::path::Path>>(dir: P) -> Self {
        let config_path = dir.as_ref().join(format!("{}.toml", APP_NAME));
        Self { config_path }
    }

    /// Determines the default path to the configuration file using `dirs::config_dir`.
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to retrieve configuration directory")?;
        Ok(config_dir.join(APP_NAME).join(format!("{}.toml", APP_NAME)))
    }

    /// Loads the configuration from the config file or returns the default configuration.
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }
        let config_content = fs::read_to_string(&self.config_path)
            .with_context(|| format!("Failed to read config file at {:?}", self.config_path))?;
        let config: Config = toml::from_str(&config_content)
            .with_context(|| format!("Failed to parse config file at {:?}", self.config_path))?;

        if config.groq_key().is_none() {
            warn!(
                "Groq API key is not set. Transcriptions will not work without it. \
                 Copy the config path via the tray icon to set the key."
            );
        }

        Ok(config)
    }

    /// Reloads the configuration and returns `true` if there are changes.
    pub fn reload(&self, current_config: &mut Config) -> Result<bool> {
        let old_config = current_config.clone();
        *current_config = self.load()?;
        Ok(*current_config != old_config)
    }

    /// Saves the configuration to the config file, only writing non-default fields.
    pub fn save(&self, config: &Config) -> Result<()> {
        let config_dir = self
            .config_path
            .parent()
            .with_context(|| format!("Failed to get parent directory of {:?}", self.config_path))?;

        // Ensure the configuration directory exists.
        fs::create_dir_all(config_dir)
            .with_context(|| format!("Failed to create config directory at {:?}", config_dir))?;

        let serialized =
            toml::to_string_pretty(&config).context("Failed to serialize configuration")?;

        fs::write(&self.config_path, serialized)
            .with_context(|| format!("Failed to write config file at {:?}", self.config_path))?;

        Ok(())
    }

    /// Returns the path to the configuration file.
    pub fn config_path(&self) -> &std::path::Path {
        &self.config_path
    }
}
