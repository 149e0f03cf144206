// Configuration management for abc-setlist
// Handles loading/saving settings, with sensible defaults when config is missing

use anyhow::{Context, Result};
use dirs::{config_dir, data_local_dir};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

const APP_DIR: &str = "abc-setlist";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Gap between songs. Signed so a hand-edited negative value can be clamped instead of rejected
    pub padding_seconds: i64,
    /// Time before the first song (band intro, announcements)
    pub intro_seconds: i64,
    /// Prefix exported files with 01_, 02_, ...
    pub add_numbering: bool,
    pub export_dir: Option<PathBuf>,
    pub log_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let log_dir = data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("logs");

        Self {
            padding_seconds: 5,
            intro_seconds: 10,
            add_numbering: true,
            export_dir: None,
            log_dir,
        }
    }
}

impl Config {
    /// Load from the user config directory, writing defaults the first time
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("failed to parse config {}", path.display()))?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("failed to write config {}", path.display()))?;

        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join(APP_DIR);

        Ok(config_dir.join("config.toml"))
    }

    /// Padding and intro as the aggregator wants them: never below zero
    pub fn timing(&self) -> (u64, u64) {
        (clamp_seconds("padding", self.padding_seconds), clamp_seconds("intro", self.intro_seconds))
    }
}

pub fn clamp_seconds(name: &str, seconds: i64) -> u64 {
    if seconds < 0 {
        warn!("Negative {} ({}s) treated as 0", name, seconds);
    }
    seconds.max(0) as u64
}
