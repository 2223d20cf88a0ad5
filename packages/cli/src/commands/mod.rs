pub mod edit;
pub mod init;
pub mod show;

pub use edit::{edit, EditArgs};
pub use init::{init, InitArgs};
pub use show::{show, ShowArgs};

use crate::config::Config;
use clap::Args;
use std::path::PathBuf;

/// Where the stores live
#[derive(Debug, Args)]
pub struct StoreArgs {
    /// Config file (defaults to ./quill.config.json when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the local cache directory
    #[arg(long)]
    pub cache_dir: Option<String>,

    /// Override the remote store directory
    #[arg(long)]
    pub remote_dir: Option<String>,
}

impl StoreArgs {
    /// Load the config and apply directory overrides
    pub fn resolve(&self, cwd: &str) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load(cwd)?,
        };

        if let Some(dir) = &self.cache_dir {
            config.cache_dir = dir.clone();
        }
        if let Some(dir) = &self.remote_dir {
            config.remote_dir = dir.clone();
        }

        Ok(config)
    }
}
