use super::StoreArgs;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use quill_storage::{FileLocalCache, FileRemoteStore, LocalCache, RemoteStore, UserId};

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Document owner
    #[arg(short, long)]
    pub user: String,

    /// Print the full undo/redo stacks
    #[arg(long)]
    pub history: bool,

    #[command(flatten)]
    pub stores: StoreArgs,
}

pub async fn show(args: ShowArgs, cwd: &str) -> Result<()> {
    let config = args.stores.resolve(cwd)?;
    let user = UserId::new(args.user);

    let local = FileLocalCache::new(config.get_cache_dir(cwd));
    let remote = FileRemoteStore::new(config.get_remote_dir(cwd));

    println!("{}", format!("📄 {}", user).bright_blue().bold());

    println!("{}", "Local cache".bold());
    match local.load(&user) {
        Ok(Some(state)) => {
            println!(
                "  {} {} undo / {} redo levels",
                "✓".green(),
                state.past.len(),
                state.future.len()
            );
            println!("  present: {:?}", state.present);
            if args.history {
                for (i, snapshot) in state.past.iter().enumerate() {
                    println!("  {} past[{}]: {:?}", "←".dimmed(), i, snapshot);
                }
                for (i, snapshot) in state.future.iter().enumerate() {
                    println!("  {} future[{}]: {:?}", "→".dimmed(), i, snapshot);
                }
            }
        }
        Ok(None) => println!("  {}", "(no record)".dimmed()),
        Err(e) => println!("  {} {}", "✗".red(), e),
    }

    println!("{}", "Remote store".bold());
    match remote.load(&user).await {
        Ok(Some(content)) => println!("  {} {:?}", "✓".green(), content),
        Ok(None) => println!("  {}", "(no record)".dimmed()),
        Err(e) => println!("  {} {}", "✗".red(), e),
    }

    Ok(())
}
