use anyhow::Context;
use quill_editor::SyncConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "quill.config.json";

/// Quill configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Directory holding the local history cache
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,

    /// Root of the filesystem-backed remote store
    #[serde(default = "default_remote_dir")]
    pub remote_dir: String,

    /// Session sync tuning
    #[serde(default)]
    pub sync: SyncConfig,
}

fn default_cache_dir() -> String {
    ".quill/cache".to_string()
}

fn default_remote_dir() -> String {
    ".quill/remote".to_string()
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            // Return default config if none exists
            Ok(Config::default())
        }
    }

    /// Load config from an explicit file
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config in {}", path.display()))?;
        config.sync.validate()?;
        Ok(config)
    }

    /// Get absolute path to the cache directory
    pub fn get_cache_dir(&self, cwd: &str) -> PathBuf {
        PathBuf::from(cwd).join(&self.cache_dir)
    }

    /// Get absolute path to the remote root
    pub fn get_remote_dir(&self, cwd: &str) -> PathBuf {
        PathBuf::from(cwd).join(&self.remote_dir)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            remote_dir: default_remote_dir(),
            sync: SyncConfig::default(),
        }
    }
}
