//! diffbrief: turns uncommitted git changes and review comments into one
//! markdown document for a reviewer or a coding agent.
//!
//! Wires together the git worker (`git`), the annotation store from
//! `diffbrief-core`, user configuration (`config`) and the subcommands.
//!
//! Markdown and command output go to stdout; logs go to stderr so the two
//! can be piped separately.

mod cli;
mod commands;
mod config;
mod error;
mod export;
mod git;

use std::path::Path;

use clap::Parser;
use diffbrief_core::store;
use tokio_rusqlite::Connection;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::{Cli, Command, CommentCommand, ExportArgs};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::export::{ExportOptions, StageFilter};
use crate::git::GitWorker;

/// Directory under the working tree root that holds the annotation store.
const STORE_DIR: &str = ".diffbrief";

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = config::load();

    if let Err(e) = run(cli, config).await {
        eprintln!("diffbrief: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    let git = GitWorker::spawn(&cli.repo)?;
    let mut stdout = std::io::stdout();

    match cli.command {
        Command::Files => commands::files(&git, &mut stdout).await,
        Command::Export(args) => run_export(&git, args, config).await,
        Command::Comment(cmd) => {
            let conn = open_store(git.workdir()).await?;
            run_comment(&git, &conn, cmd, &mut stdout).await
        }
        Command::Note { path, staged, text } => {
            let conn = open_store(git.workdir()).await?;
            store::set_general_comment(&conn, &path, staged, &text).await?;
            println!("Saved file comment for {path}.");
            Ok(())
        }
        Command::Import { file } => {
            let conn = open_store(git.workdir()).await?;
            commands::import(&conn, &file, &mut stdout).await
        }
    }
}

async fn run_export(git: &GitWorker, args: ExportArgs, config: Config) -> Result<()> {
    let conn = open_store(git.workdir()).await?;
    let mut engine = config.engine;
    if let Some(n) = args.context {
        engine.context_lines = n;
    }
    let options = ExportOptions {
        focus: args.focus.filter(|f| !f.trim().is_empty()),
        stage: StageFilter::from_flags(args.staged, args.unstaged),
        commented_only: args.commented_only,
    };
    let markdown = export::export(git, &conn, options, &engine).await?;

    // A path from the config file is relative to the working tree, one from
    // the command line to the current directory.
    let output = args
        .output
        .or_else(|| config.export.output.map(|p| git.workdir().join(p)));
    match output {
        Some(path) => {
            std::fs::write(&path, &markdown).map_err(|e| AppError::io(&path, e))?;
            info!(path = %path.display(), bytes = markdown.len(), "review context written");
        }
        None => print!("{markdown}"),
    }
    Ok(())
}

async fn run_comment(
    git: &GitWorker,
    conn: &Connection,
    cmd: CommentCommand,
    out: &mut std::io::Stdout,
) -> Result<()> {
    match cmd {
        CommentCommand::Add { path, lines, side, staged, text } => {
            let request = commands::CommentRequest { path, lines, side, staged, text };
            let stored = commands::add_comment(git, conn, request).await?;
            println!("Added comment {}.", stored.annotation.id);
        }
        CommentCommand::List { path } => {
            commands::list_comments(conn, path.as_deref(), out).await?;
        }
        CommentCommand::Edit { id, text } => {
            store::update_annotation_text(conn, &id, &text).await?;
            println!("Updated comment {id}.");
        }
        CommentCommand::Rm { id } => {
            store::delete_annotation(conn, &id).await?;
            println!("Removed comment {id}.");
        }
    }
    Ok(())
}

/// Opens `<workdir>/.diffbrief/annotations.db`, creating the directory with
/// a `.gitignore` so the store never shows up as a change itself.
async fn open_store(workdir: &Path) -> Result<Connection> {
    let dir = workdir.join(STORE_DIR);
    std::fs::create_dir_all(&dir).map_err(|e| AppError::io(&dir, e))?;
    let ignore = dir.join(".gitignore");
    if !ignore.exists() {
        std::fs::write(&ignore, "*\n").map_err(|e| AppError::io(&ignore, e))?;
    }
    let path = dir.join("annotations.db");
    Ok(store::open_store(&path.to_string_lossy()).await?)
}
