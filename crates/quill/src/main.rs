//! Quill - a minimal local version-control system.
//!
//! This is the main entry point for the quill CLI.

use clap::{Parser, Subcommand};
use quill_core::{Config, HistoryState, RepoError, Repository};
use quill_util::log::{LogConfig, LogLevel};
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser)]
#[command(name = "quill")]
#[command(author, version, about = "Stage, commit and undo file snapshots", long_about = None)]
struct Cli {
    /// Repository root (defaults to the current directory)
    #[arg(short = 'C', long = "dir", global = true)]
    dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add files to the staging area
    Stage {
        /// Files to stage, relative to the repository root
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Record every staged file in a new commit
    Commit {
        /// Commit message
        #[arg(short, long)]
        message: String,
    },
    /// Reverse the most recent commit
    Undo,
    /// Show commit history
    Log {
        /// Newest commit first
        #[arg(short, long)]
        reverse: bool,
    },
    /// Show history and staging state
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the merged configuration
    Config {
        /// Write the merged configuration to quill.json in the repository root
        #[arg(long)]
        save: bool,
    },
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let root = match cli.dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    if let Commands::Version = cli.command {
        print_version();
        return Ok(());
    }

    let (config, sources) = Config::load(Some(root.as_path())).await?;
    init_logging(cli.verbose, &config);
    debug!(sources = ?sources, "Loaded configuration");

    if let Commands::Config { save } = cli.command {
        show_config(&config, &sources)?;
        if save {
            let path = config.save(Some(root.as_path())).await?;
            println!();
            println!("Saved configuration to {}", path.display());
        }
        return Ok(());
    }

    let mut repo = Repository::open(&root, config).await?;

    match cli.command {
        Commands::Stage { files } => stage(&mut repo, &files).await,
        Commands::Commit { message } => commit(&mut repo, &message).await,
        Commands::Undo => undo(&mut repo).await,
        Commands::Log { reverse } => {
            show_log(&repo, reverse);
            Ok(())
        }
        Commands::Status { json } => show_status(&repo, json),
        Commands::Config { .. } | Commands::Version => Ok(()),
    }
}

/// Initialize logging from the configured level, raised to debug by `--verbose`.
fn init_logging(verbose: bool, config: &Config) {
    let level = if verbose {
        LogLevel::Debug
    } else {
        config.log_level().unwrap_or(LogLevel::Warn)
    };

    quill_util::log::init(LogConfig {
        level,
        ..LogConfig::default()
    });
}

async fn stage(repo: &mut Repository, files: &[PathBuf]) -> anyhow::Result<()> {
    for file in files {
        match repo.stage(file).await {
            Ok(entry) => println!("File '{}' added to staging area.", entry),
            Err(e @ RepoError::StagingFull { .. }) => {
                println!("Staging area is full. Cannot add more files.");
                return Err(e.into());
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

async fn commit(repo: &mut Repository, message: &str) -> anyhow::Result<()> {
    let commit = match repo.commit(message).await {
        Ok(commit) => commit,
        Err(e) if e.is_notice() => return print_notice(&e),
        Err(e) => return Err(e.into()),
    };

    for file in commit.files() {
        println!(
            "File '{}' committed as '{}/{}'.",
            file,
            commit.id.dir_name(),
            file
        );
    }
    println!("Committed with message: '{}'", commit.message);
    Ok(())
}

async fn undo(repo: &mut Repository) -> anyhow::Result<()> {
    let commit = match repo.undo().await {
        Ok(commit) => commit,
        Err(e) if e.is_notice() => return print_notice(&e),
        Err(e) => return Err(e.into()),
    };

    println!("Undid commit {}: {}", commit.id, commit.message);
    for file in commit.files() {
        println!("Restored file '{}' from commit.", file);
    }
    Ok(())
}

fn print_notice(error: &RepoError) -> anyhow::Result<()> {
    match error {
        RepoError::NothingToCommit => println!("No files to commit."),
        RepoError::NoCommitsToUndo => println!("No commits to undo."),
        other => println!("{}", other),
    }
    Ok(())
}

fn show_log(repo: &Repository, reverse: bool) {
    if repo.history().is_empty() {
        println!("No commits yet.");
        return;
    }

    let commits: Vec<_> = if reverse {
        repo.log().rev().collect()
    } else {
        repo.log().collect()
    };
    for commit in commits {
        println!("{}", commit);
    }
}

fn show_status(repo: &Repository, json: bool) -> anyhow::Result<()> {
    let status = repo.status();
    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("Repository: {}", repo.root().display());
    match (status.history, status.tail) {
        (HistoryState::HasHistory, Some(tail)) => {
            println!("Commits: {} (latest {})", status.commits, tail)
        }
        _ => println!("No commits yet."),
    }

    if status.staged.is_empty() {
        println!("Nothing staged.");
    } else {
        println!("Staged files:");
        for entry in &status.staged {
            println!("  - {}", entry);
        }
    }
    Ok(())
}

fn show_config(config: &Config, sources: &[PathBuf]) -> anyhow::Result<()> {
    println!("Configuration sources:");
    if sources.is_empty() {
        println!("  (none)");
    } else {
        for source in sources {
            println!("  {}", source.display());
        }
    }
    println!();

    println!("Current configuration:");
    println!("{}", serde_json::to_string_pretty(config)?);
    println!();
    println!("Effective settings:");
    println!("  staging_capacity: {}", config.staging_capacity());
    println!("  undo_capacity: {}", config.undo_capacity());
    println!("  snapshot_dir: {}", config.snapshot_dir().display());
    println!("  persist: {}", config.persist());

    Ok(())
}

/// Print version information.
fn print_version() {
    println!("quill {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("A minimal local version-control system with commit and undo.");
}
