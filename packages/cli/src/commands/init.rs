use crate::config::{Config, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use quill_editor::SyncConfig;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Quiet period before remote writes, in milliseconds
    #[arg(short, long, default_value_t = quill_editor::DEFAULT_DEBOUNCE_MS)]
    pub debounce_ms: u64,

    /// Maximum undo levels kept (0 = unlimited)
    #[arg(short, long, default_value_t = 0)]
    pub max_history: usize,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &str) -> Result<()> {
    let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

    // Check if config already exists
    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing Quill workspace...".bright_blue().bold());

    let config = Config {
        sync: SyncConfig {
            debounce_ms: args.debounce_ms,
            max_history: args.max_history,
            remote_timeout_ms: None,
        },
        ..Config::default()
    };

    for dir in [config.get_cache_dir(cwd), config.get_remote_dir(cwd)] {
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
            println!("  {} Created {}/", "✓".green(), dir.display());
        }
    }

    // Write config file
    let config_json = serde_json::to_string_pretty(&config)?;
    fs::write(&config_path, config_json)?;

    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    println!();
    println!("{}", "✅ Workspace initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Run: quill edit --user <id>");
    println!("  2. Type lines, or :undo / :redo / :quit");
    println!("  3. Inspect with: quill show --user <id>");

    Ok(())
}
