//! Configuration loading and parsing.
//!
//! Parses `swadl-edit.toml` (or an override path provided by the binary).
//! Every field has a default so a missing file, a missing section, or a file
//! that fails to parse all yield a usable configuration. Unknown fields are
//! ignored (TOML deserialization tolerance) to allow forward evolution.
//!
//! The save shortcut is kept as the raw string from the file; `save_shortcut`
//! parses it on demand and falls back to the default binding when it is not a
//! valid combo, logging the rejection under the `config` target.

use anyhow::Result;
use core_keymap::KeyCombo;
use serde::Deserialize;
use std::{fs, path::PathBuf};
use tracing::{info, warn};

pub const CONFIG_FILE_NAME: &str = "swadl-edit.toml";
pub const DEFAULT_SCHEMA_URI: &str = "https://raw.githubusercontent.com/finos/symphony-wdk/master/workflow-language/src/main/resources/swadl-schema-1.0.json";

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// Widget theme identifier (`vs-light` / `vs-dark`).
    pub fn widget_theme(self) -> &'static str {
        match self {
            Theme::Light => "vs-light",
            Theme::Dark => "vs-dark",
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SchemaConfig {
    #[serde(default = "SchemaConfig::default_uri")]
    pub uri: String,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            uri: Self::default_uri(),
        }
    }
}

impl SchemaConfig {
    fn default_uri() -> String {
        DEFAULT_SCHEMA_URI.to_string()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EditorConfig {
    #[serde(default = "EditorConfig::default_language")]
    pub language: String,
    #[serde(default)]
    pub theme: Theme,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            language: Self::default_language(),
            theme: Theme::default(),
        }
    }
}

impl EditorConfig {
    fn default_language() -> String {
        "yaml".to_string()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SaveConfig {
    #[serde(default = "SaveConfig::default_label")]
    pub label: String,
    #[serde(default = "SaveConfig::default_shortcut")]
    pub shortcut: String,
    #[serde(default = "SaveConfig::default_success_message")]
    pub success_message: String,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            label: Self::default_label(),
            shortcut: Self::default_shortcut(),
            success_message: Self::default_success_message(),
        }
    }
}

impl SaveConfig {
    fn default_label() -> String {
        "Quick Save".to_string()
    }
    fn default_shortcut() -> String {
        "mod+s".to_string()
    }
    fn default_success_message() -> String {
        "Workflow saved".to_string()
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub schema: SchemaConfig,
    #[serde(default)]
    pub editor: EditorConfig,
    #[serde(default)]
    pub save: SaveConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>, // original file string (optional)
    pub file: ConfigFile,    // parsed (or default) data
}

/// Best-effort config path: local working directory first, then the platform
/// config dir (XDG / AppData Roaming).
pub fn discover() -> PathBuf {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("swadl-edit").join(CONFIG_FILE_NAME);
    }
    PathBuf::from(CONFIG_FILE_NAME)
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    if let Ok(content) = fs::read_to_string(&path) {
        match toml::from_str::<ConfigFile>(&content) {
            Ok(file) => {
                info!(target: "config", path = %path.display(), "config_loaded");
                Ok(Config {
                    raw: Some(content),
                    file,
                })
            }
            Err(e) => {
                warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed_using_defaults");
                Ok(Config::default())
            }
        }
    } else {
        Ok(Config::default())
    }
}

impl Config {
    /// Parsed save shortcut, falling back to the default binding.
    pub fn save_shortcut(&self) -> KeyCombo {
        match self.file.save.shortcut.parse::<KeyCombo>() {
            Ok(combo) => combo,
            Err(e) => {
                warn!(
                    target: "config",
                    raw = self.file.save.shortcut.as_str(),
                    error = %e,
                    "save_shortcut_invalid_using_default"
                );
                KeyCombo::save()
            }
        }
    }
}
