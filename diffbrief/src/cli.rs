//! Command-line interface definition using clap.

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand};
use diffbrief_core::types::Side;

/// diffbrief - review uncommitted changes as one markdown brief
#[derive(Parser, Debug)]
#[command(name = "diffbrief")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Repository to review (any path inside the working tree)
    #[arg(long, global = true, default_value = ".", env = "DIFFBRIEF_REPO")]
    pub repo: PathBuf,

    /// Enable verbose output (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Log level used when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List changed files with their status and stage
    Files,

    /// Build the review context and print it (or write it with -o)
    Export(ExportArgs),

    /// Add, list, edit or remove line comments
    #[command(subcommand)]
    Comment(CommentCommand),

    /// Set the file-level comment for a path (empty text clears it)
    Note {
        path: String,

        /// Attach to the staged changes instead of the unstaged ones
        #[arg(long)]
        staged: bool,

        text: String,
    },

    /// Load comments from a review JSON file
    Import {
        file: PathBuf,
    },
}

#[derive(Args, Debug, Default)]
pub struct ExportArgs {
    /// Write to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Free-form instructions placed near the top of the document
    #[arg(long)]
    pub focus: Option<String>,

    /// Unchanged lines shown around each change
    #[arg(long, value_name = "N")]
    pub context: Option<usize>,

    /// Only staged changes (HEAD to index)
    #[arg(long, conflicts_with = "unstaged")]
    pub staged: bool,

    /// Only unstaged changes (index to working tree)
    #[arg(long)]
    pub unstaged: bool,

    /// Only files that carry at least one comment
    #[arg(long)]
    pub commented_only: bool,
}

#[derive(Subcommand, Debug)]
pub enum CommentCommand {
    /// Comment on a line (`12`) or a range (`12-18`)
    Add {
        path: String,

        lines: LineRange,

        /// Which version the line numbers refer to
        #[arg(long, default_value = "new")]
        side: Side,

        /// Attach to the staged changes instead of the unstaged ones
        #[arg(long)]
        staged: bool,

        text: String,
    },

    /// List comments, optionally for one path
    List {
        path: Option<String>,
    },

    /// Replace the text of a comment
    Edit {
        id: String,
        text: String,
    },

    /// Delete a comment
    Rm {
        id: String,
    },
}

/// An inclusive 1-based line range written `N` or `N-M`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: u32,
    pub end: u32,
}

impl FromStr for LineRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |part: &str| {
            part.trim()
                .parse::<u32>()
                .map_err(|_| format!("'{s}' is not a line number or N-M range"))
        };
        let (start, end) = match s.split_once('-') {
            Some((a, b)) => (parse(a)?, parse(b)?),
            None => {
                let n = parse(s)?;
                (n, n)
            }
        };
        if start == 0 || start > end {
            return Err(format!("'{s}' is not a valid range (lines start at 1, start <= end)"));
        }
        Ok(LineRange { start, end })
    }
}
