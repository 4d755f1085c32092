//! Owned data types for the git worker thread.
//!
//! Everything here is `Send` so it can cross from the thread that owns the
//! `git2::Repository` back to the async caller.

use std::path::PathBuf;

use diffbrief_core::types::{FileStatus, Side};
use thiserror::Error;
use tokio::sync::oneshot;

/// Which snapshot of a file to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Revision {
    /// The committed tree at HEAD.
    Head,
    /// The staging area.
    Index,
    /// The file on disk.
    Workdir,
}

impl Revision {
    /// The `(old, new)` pair compared for a stage: HEAD to index for staged
    /// changes, index to working tree for unstaged ones.
    pub fn pair(staged: bool) -> (Revision, Revision) {
        if staged {
            (Revision::Head, Revision::Index)
        } else {
            (Revision::Index, Revision::Workdir)
        }
    }

    /// The revision a line reference on `side` points into.
    pub fn for_side(side: Side, staged: bool) -> Revision {
        let (old, new) = Revision::pair(staged);
        match side {
            Side::Old => old,
            Side::New => new,
        }
    }
}

/// One path that differs between two snapshots.
///
/// A path with both staged and unstaged edits appears twice, once per stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedFile {
    /// Repository-relative path, `/`-separated.
    pub path: String,
    pub status: FileStatus,
    pub staged: bool,
}

/// Content of a file at one revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileText {
    /// UTF-8 text. A path absent at the revision reads as empty text.
    Text(String),
    /// Content that is not valid UTF-8.
    Binary,
}

/// Requests sent to the worker over a `crossbeam_channel::Sender<GitRequest>`.
///
/// Each carries the oneshot sender its reply goes back on.
#[derive(Debug)]
pub enum GitRequest {
    ListChangedFiles {
        reply: oneshot::Sender<Result<Vec<ChangedFile>, GitError>>,
    },
    ReadFile {
        path: String,
        revision: Revision,
        reply: oneshot::Sender<Result<FileText, GitError>>,
    },
}

/// Errors from the git collaborator.
#[derive(Error, Debug)]
pub enum GitError {
    /// `--repo` does not point into a git repository.
    #[error("cannot open git repository at {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    /// The repository is bare, so there is no working tree to review.
    #[error("repository at {} has no working tree", .0.display())]
    Bare(PathBuf),

    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    /// Reading a working-tree file failed for a reason other than absence.
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The worker thread exited before replying.
    #[error("git worker stopped")]
    WorkerGone,
}
