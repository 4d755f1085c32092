//! Gathers changed files, their contents and their comments, and turns them
//! into the markdown review document.

use diffbrief_core::markdown::render;
use diffbrief_core::text::detect_language;
use diffbrief_core::{build_review, store, EngineConfig, FileInput};
use tokio_rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::git::{ChangedFile, FileText, GitWorker, Revision};

/// Which stage of each changed path to include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StageFilter {
    #[default]
    All,
    Staged,
    Unstaged,
}

impl StageFilter {
    pub fn from_flags(staged: bool, unstaged: bool) -> Self {
        match (staged, unstaged) {
            (true, false) => StageFilter::Staged,
            (false, true) => StageFilter::Unstaged,
            _ => StageFilter::All,
        }
    }

    fn includes(self, staged: bool) -> bool {
        match self {
            StageFilter::All => true,
            StageFilter::Staged => staged,
            StageFilter::Unstaged => !staged,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub focus: Option<String>,
    pub stage: StageFilter,
    pub commented_only: bool,
}

/// Builds one [`FileInput`] per changed file and stage.
///
/// Binary files are skipped with a warning.
pub async fn collect_inputs(
    git: &GitWorker,
    conn: &Connection,
    stage: StageFilter,
) -> Result<Vec<FileInput>> {
    let mut inputs = Vec::new();
    for file in git.list_changed_files().await? {
        if !stage.includes(file.staged) {
            continue;
        }
        if let Some(input) = file_input(git, conn, file).await? {
            inputs.push(input);
        }
    }
    Ok(inputs)
}

async fn file_input(git: &GitWorker, conn: &Connection, file: ChangedFile) -> Result<Option<FileInput>> {
    let (old_rev, new_rev) = Revision::pair(file.staged);
    let old = git.read_file_at(&file.path, old_rev).await?;
    let new = git.read_file_at(&file.path, new_rev).await?;
    let (FileText::Text(old_content), FileText::Text(new_content)) = (old, new) else {
        warn!(path = %file.path, "skipping binary file");
        return Ok(None);
    };

    let annotations = store::list_annotations(conn, &file.path, file.staged).await?;
    let general_comment = store::general_comment(conn, &file.path, file.staged).await?;
    debug!(path = %file.path, staged = file.staged, comments = annotations.len(), "collected file");

    Ok(Some(FileInput {
        language: detect_language(&file.path).to_owned(),
        path: file.path,
        status: file.status,
        staged: file.staged,
        old_content,
        new_content,
        annotations,
        general_comment,
    }))
}

/// Whether a file carries any comment at all.
fn has_comments(input: &FileInput) -> bool {
    !input.annotations.is_empty() || input.general_comment.is_some()
}

/// Renders the review document for the repository behind `git`.
pub async fn export(
    git: &GitWorker,
    conn: &Connection,
    options: ExportOptions,
    config: &EngineConfig,
) -> Result<String> {
    let mut inputs = collect_inputs(git, conn, options.stage).await?;
    if options.commented_only {
        inputs.retain(has_comments);
    }
    let context = build_review(&inputs, options.focus, config);
    info!(
        files = context.sections.len(),
        comments = context.total_comments(),
        "review context built"
    );
    Ok(render(&context))
}
