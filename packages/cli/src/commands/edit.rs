use super::StoreArgs;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use quill_editor::{EditOutcome, RemoteSyncState, SessionHandle, SyncController, UserId};
use quill_storage::{FileLocalCache, FileRemoteStore};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Document owner
    #[arg(short, long)]
    pub user: String,

    /// Override the quiet period before remote writes, in milliseconds
    #[arg(long)]
    pub debounce_ms: Option<u64>,

    #[command(flatten)]
    pub stores: StoreArgs,
}

/// One line of editor input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Set(String),
    Append(String),
    Line(String),
    Undo,
    Redo,
    Show,
    Status,
    Quit,
    Unknown(String),
}

impl Input {
    pub fn parse(line: &str) -> Self {
        let Some(command) = line.strip_prefix(':') else {
            return Input::Line(line.to_string());
        };

        let (name, rest) = match command.split_once(' ') {
            Some((name, rest)) => (name, rest),
            None => (command, ""),
        };

        match name {
            "set" => Input::Set(rest.to_string()),
            "append" => Input::Append(rest.to_string()),
            "undo" | "u" => Input::Undo,
            "redo" | "r" => Input::Redo,
            "show" | "p" => Input::Show,
            "status" => Input::Status,
            "quit" | "q" => Input::Quit,
            _ => Input::Unknown(name.to_string()),
        }
    }
}

pub async fn edit(args: EditArgs, cwd: &str) -> Result<()> {
    let mut config = args.stores.resolve(cwd)?;
    if let Some(debounce_ms) = args.debounce_ms {
        config.sync.debounce_ms = debounce_ms;
    }

    let user = UserId::new(args.user);
    user.storage_key()?;

    let local = Arc::new(FileLocalCache::new(config.get_cache_dir(cwd)));
    let remote = Arc::new(FileRemoteStore::new(config.get_remote_dir(cwd)));
    tracing::debug!(
        cache = %local.dir().display(),
        remote = %remote.root().display(),
        "Opening stores"
    );
    let session = SyncController::new(user.clone(), local, remote, config.sync.clone()).spawn();

    let source = session.wait_ready().await?;
    println!(
        "{} Editing as {} (loaded from {})",
        "✏️".bright_blue(),
        user.as_str().bright_white(),
        source.to_string().cyan()
    );
    print_content(&session.status().content);

    let stdin = BufReader::new(tokio::io::stdin());
    run(&session, stdin).await?;

    let state = session.close().await?;
    println!(
        "{} Saved {} bytes ({} undo levels)",
        "✓".green(),
        state.present.len(),
        state.past.len()
    );

    Ok(())
}

/// Feed input lines to the session until EOF or `:quit`
pub async fn run<R>(session: &SessionHandle, reader: R) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        match Input::parse(&line) {
            Input::Set(text) => report(session.set_content(text).await?),
            Input::Append(text) => {
                let current = session.snapshot().await?.present;
                report(session.set_content(current + &text).await?);
            }
            Input::Line(text) => {
                let current = session.snapshot().await?.present;
                let next = if current.is_empty() {
                    text
                } else {
                    format!("{}\n{}", current, text)
                };
                report(session.set_content(next).await?);
            }
            Input::Undo => report(session.undo().await?),
            Input::Redo => report(session.redo().await?),
            Input::Show => print_content(&session.snapshot().await?.present),
            Input::Status => print_status(session),
            Input::Quit => break,
            Input::Unknown(name) => {
                println!("{} Unknown command :{}", "⚠️".yellow(), name);
            }
        }
    }

    Ok(())
}

fn report(outcome: EditOutcome) {
    if !outcome.changed {
        println!("  {} unchanged", "·".dimmed());
        return;
    }

    let undo = if outcome.can_undo { "undo" } else { "-" };
    let redo = if outcome.can_redo { "redo" } else { "-" };
    println!(
        "  {} {} bytes [{} {}]",
        "✓".green(),
        outcome.content.len(),
        undo.dimmed(),
        redo.dimmed()
    );
}

fn print_content(content: &str) {
    if content.is_empty() {
        println!("  {}", "(empty document)".dimmed());
        return;
    }
    for line in content.lines() {
        println!("  {} {}", "│".dimmed(), line);
    }
}

fn print_status(session: &SessionHandle) {
    let status = session.status();
    let remote = match &status.remote {
        RemoteSyncState::Idle => "idle".dimmed().to_string(),
        RemoteSyncState::Pending => "pending".yellow().to_string(),
        RemoteSyncState::Saving => "saving".yellow().to_string(),
        RemoteSyncState::Synced { at } => format!("{} at {}", "synced".green(), at.format("%H:%M:%S")),
        RemoteSyncState::Failed { error, at } => {
            format!("{} at {}: {}", "failed".red(), at.format("%H:%M:%S"), error)
        }
    };

    println!("  local:  {:?}", status.local);
    println!("  remote: {}", remote);
    println!("  undo: {}  redo: {}", status.can_undo, status.can_redo);
}
