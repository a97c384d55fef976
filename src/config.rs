use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use xdg::BaseDirectories;

use crate::diff::ContentMode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// tracing filter directive used when `RUST_LOG` is unset
    pub log_filter: String,
    pub content: ContentConfig,
    pub git: GitConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    pub mode: ContentMode,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    /// Repository used by `git show`; the current directory when unset
    pub working_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: "warn".to_owned(),
            content: ContentConfig::default(),
            git: GitConfig::default(),
        }
    }
}

impl Config {
    /// Load `~/.config/diffmap/config.toml`, or defaults when it is absent.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn config_path() -> Option<PathBuf> {
        BaseDirectories::with_prefix("diffmap")
            .map(|dirs| dirs.get_config_home().join("config.toml"))
            .ok()
    }
}
