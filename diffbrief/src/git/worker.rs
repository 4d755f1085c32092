//! Background thread that owns the `git2::Repository` for its lifetime.
//!
//! The repository is opened inside the thread and never leaves it. Requests
//! arrive over a crossbeam channel; each reply goes back on the oneshot
//! sender carried by its request.

use std::path::{Path, PathBuf};

use crossbeam_channel::{Receiver, Sender};
use diffbrief_core::types::FileStatus;
use git2::{ErrorCode, Repository, Status, StatusOptions};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::git::types::{ChangedFile, FileText, GitError, GitRequest, Revision};

/// Handle to the worker thread. Dropping it stops the thread once pending
/// requests are served.
pub struct GitWorker {
    tx: Sender<GitRequest>,
    workdir: PathBuf,
}

impl GitWorker {
    /// Spawns the worker and waits until it has opened the repository that
    /// contains `path`.
    ///
    /// # Errors
    ///
    /// Returns [`GitError::Open`] if no repository is found and
    /// [`GitError::Bare`] if it has no working tree.
    pub fn spawn(path: impl Into<PathBuf>) -> Result<Self, GitError> {
        let path = path.into();
        let (tx, rx) = crossbeam_channel::unbounded();
        let (ready_tx, ready_rx) = crossbeam_channel::bounded(1);
        std::thread::spawn(move || git_worker_loop(path, rx, ready_tx));

        let workdir = ready_rx.recv().map_err(|_| GitError::WorkerGone)??;
        Ok(Self { tx, workdir })
    }

    /// Root of the working tree.
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Every path with staged or unstaged changes, sorted by path with the
    /// staged entry first.
    pub async fn list_changed_files(&self) -> Result<Vec<ChangedFile>, GitError> {
        let (reply, rx) = oneshot::channel();
        self.send(GitRequest::ListChangedFiles { reply })?;
        rx.await.map_err(|_| GitError::WorkerGone)?
    }

    /// Content of `path` at `revision`.
    pub async fn read_file_at(&self, path: &str, revision: Revision) -> Result<FileText, GitError> {
        let (reply, rx) = oneshot::channel();
        self.send(GitRequest::ReadFile { path: path.to_owned(), revision, reply })?;
        rx.await.map_err(|_| GitError::WorkerGone)?
    }

    fn send(&self, request: GitRequest) -> Result<(), GitError> {
        self.tx.send(request).map_err(|_| GitError::WorkerGone)
    }
}

/// Entry point for the worker thread.
///
/// Reports the open result on `ready`, then serves requests until every
/// sender is dropped.
fn git_worker_loop(
    path: PathBuf,
    rx: Receiver<GitRequest>,
    ready: Sender<Result<PathBuf, GitError>>,
) {
    let repo = match open_repo(&path) {
        Ok((repo, workdir)) => {
            debug!(workdir = %workdir.display(), "git worker ready");
            if ready.send(Ok(workdir)).is_err() {
                return;
            }
            repo
        }
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    for request in rx {
        match request {
            GitRequest::ListChangedFiles { reply } => {
                let _ = reply.send(list_changed_files(&repo));
            }
            GitRequest::ReadFile { path, revision, reply } => {
                let _ = reply.send(read_file_at(&repo, &path, revision));
            }
        }
    }
}

fn open_repo(path: &Path) -> Result<(Repository, PathBuf), GitError> {
    let repo = Repository::discover(path)
        .map_err(|source| GitError::Open { path: path.to_path_buf(), source })?;
    let workdir = repo
        .workdir()
        .ok_or_else(|| GitError::Bare(repo.path().to_path_buf()))?
        .to_path_buf();
    Ok((repo, workdir))
}

fn list_changed_files(repo: &Repository) -> Result<Vec<ChangedFile>, GitError> {
    let mut opts = StatusOptions::new();
    opts.include_untracked(true)
        .recurse_untracked_dirs(true)
        .include_ignored(false);
    let statuses = repo.statuses(Some(&mut opts))?;

    let mut files = Vec::new();
    for entry in statuses.iter() {
        let Some(path) = entry.path() else {
            warn!("skipping path that is not valid UTF-8");
            continue;
        };
        let status = entry.status();
        if status.is_conflicted() {
            files.push(ChangedFile { path: path.to_owned(), status: FileStatus::Unmerged, staged: false });
            continue;
        }
        if let Some(s) = index_status(status) {
            files.push(ChangedFile { path: path.to_owned(), status: s, staged: true });
        }
        if let Some(s) = worktree_status(status) {
            files.push(ChangedFile { path: path.to_owned(), status: s, staged: false });
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path).then(b.staged.cmp(&a.staged)));
    debug!(count = files.len(), "listed changed files");
    Ok(files)
}

/// HEAD → index status.
fn index_status(s: Status) -> Option<FileStatus> {
    if s.is_index_new() {
        Some(FileStatus::Added)
    } else if s.is_index_deleted() {
        Some(FileStatus::Deleted)
    } else if s.is_index_renamed() {
        Some(FileStatus::Renamed)
    } else if s.is_index_typechange() {
        Some(FileStatus::TypeChanged)
    } else if s.is_index_modified() {
        Some(FileStatus::Modified)
    } else {
        None
    }
}

/// Index → working tree status. Untracked files count as added.
fn worktree_status(s: Status) -> Option<FileStatus> {
    if s.is_wt_new() {
        Some(FileStatus::Added)
    } else if s.is_wt_deleted() {
        Some(FileStatus::Deleted)
    } else if s.is_wt_renamed() {
        Some(FileStatus::Renamed)
    } else if s.is_wt_typechange() {
        Some(FileStatus::TypeChanged)
    } else if s.is_wt_modified() {
        Some(FileStatus::Modified)
    } else {
        None
    }
}

fn read_file_at(repo: &Repository, path: &str, revision: Revision) -> Result<FileText, GitError> {
    let bytes = match revision {
        Revision::Head => head_bytes(repo, path)?,
        Revision::Index => index_bytes(repo, path)?,
        Revision::Workdir => workdir_bytes(repo, path)?,
    };
    Ok(match bytes {
        None => FileText::Text(String::new()),
        Some(b) => match String::from_utf8(b) {
            Ok(text) => FileText::Text(text),
            Err(_) => FileText::Binary,
        },
    })
}

fn head_bytes(repo: &Repository, path: &str) -> Result<Option<Vec<u8>>, GitError> {
    let head = match repo.head() {
        Ok(head) => head,
        // No commits yet: everything is absent at HEAD.
        Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
            return Ok(None)
        }
        Err(e) => return Err(e.into()),
    };
    let tree = head.peel_to_tree()?;
    let entry = match tree.get_path(Path::new(path)) {
        Ok(entry) => entry,
        Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let object = entry.to_object(repo)?;
    Ok(object.as_blob().map(|blob| blob.content().to_vec()))
}

fn index_bytes(repo: &Repository, path: &str) -> Result<Option<Vec<u8>>, GitError> {
    let mut index = repo.index()?;
    index.read(false)?;
    match index.get_path(Path::new(path), 0) {
        Some(entry) => Ok(Some(repo.find_blob(entry.id)?.content().to_vec())),
        None => Ok(None),
    }
}

fn workdir_bytes(repo: &Repository, path: &str) -> Result<Option<Vec<u8>>, GitError> {
    let Some(root) = repo.workdir() else {
        return Err(GitError::Bare(repo.path().to_path_buf()));
    };
    match std::fs::read(root.join(path)) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(GitError::Read { path: path.to_owned(), source }),
    }
}
