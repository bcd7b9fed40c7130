//! Configuration loading and management

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::paths;

/// Main configuration structure (`~/.kudos/config.toml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Override for the rules tree root (defaults to `~/.kudos/rules`).
    #[serde(default)]
    pub rules_dir: Option<PathBuf>,

    /// Override for the app state directory (defaults to `~/.kudos/state`).
    #[serde(default)]
    pub state_dir: Option<PathBuf>,

    /// General settings
    #[serde(default)]
    pub settings: Settings,
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Launch the notifier command when a save changes level or badges.
    /// Only meaningful in interactive contexts.
    #[serde(default = "default_notify")]
    pub notify: bool,

    /// External command invoked with the level token and the newly achieved
    /// item tokens as arguments.
    #[serde(default)]
    pub notifier_command: Option<String>,

    /// Unlocked profiles ignore direct writes to the `level` state variable.
    #[serde(default)]
    pub unlocked: bool,
}

fn default_notify() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            notify: default_notify(),
            notifier_command: None,
            unlocked: false,
        }
    }
}

impl Config {
    /// Load the global configuration; a missing file yields the defaults.
    pub fn load() -> Result<Self> {
        let path = paths::config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::from_file(&path)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to a file with atomic write and file locking.
    ///
    /// An exclusive lock prevents concurrent writers and the temp-file
    /// rename prevents corruption on crash.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        let lock_path = path.with_extension("toml.lock");
        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&lock_path)
            .with_context(|| format!("Failed to create lock file: {}", lock_path.display()))?;
        lock_file
            .lock_exclusive()
            .with_context(|| "Failed to acquire config lock")?;

        let temp_path = path.with_extension("toml.tmp");
        let mut temp_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

        temp_file
            .write_all(content.as_bytes())
            .with_context(|| "Failed to write config content")?;
        temp_file
            .sync_all()
            .with_context(|| "Failed to sync config file")?;

        std::fs::rename(&temp_path, path)
            .with_context(|| format!("Failed to rename config file: {}", path.display()))?;

        // Lock is released when lock_file is dropped
        Ok(())
    }

    /// Effective rules tree root.
    pub fn rules_dir(&self) -> PathBuf {
        self.rules_dir
            .clone()
            .unwrap_or_else(paths::default_rules_dir)
    }

    /// Effective app state directory.
    pub fn state_dir(&self) -> PathBuf {
        self.state_dir
            .clone()
            .unwrap_or_else(paths::default_state_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.rules_dir = Some(PathBuf::from("/usr/share/kudos/rules"));
        config.settings.notifier_command = Some("kudos-levelup".to_string());
        config.save_to_file(&path).expect("save");

        let loaded = Config::from_file(&path).expect("load");
        assert_eq!(loaded.rules_dir(), PathBuf::from("/usr/share/kudos/rules"));
        assert_eq!(
            loaded.settings.notifier_command.as_deref(),
            Some("kudos-levelup")
        );
        assert!(loaded.settings.notify);
        assert!(!loaded.settings.unlocked);
    }

    #[test]
    fn test_defaults_without_overrides() {
        let config = Config::default();
        assert!(config.rules_dir().ends_with("rules"));
        assert!(config.state_dir().ends_with("state"));
    }
}
