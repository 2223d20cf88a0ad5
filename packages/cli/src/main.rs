mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{edit, init, show, EditArgs, InitArgs, ShowArgs};
use tracing_subscriber::EnvFilter;

/// Quill - Editor history with local and remote durability
#[derive(Parser, Debug)]
#[command(name = "quill")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a quill.config.json in the current directory
    Init(InitArgs),

    /// Open an editing session reading commands from stdin
    Edit(EditArgs),

    /// Print the stored history and remote content for a user
    Show(ShowArgs),
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Logs go to stderr so document output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir.display().to_string(),
        Err(err) => {
            eprintln!("{} Cannot get current directory: {}", "Error:".red().bold(), err);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Init(args) => init(args, &cwd),
        Command::Edit(args) => edit(args, &cwd).await,
        Command::Show(args) => show(args, &cwd).await,
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
