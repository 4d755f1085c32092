//! Subcommand handlers other than `export`.
//!
//! Handlers write their human-readable output to `out` so tests can capture
//! it; logging goes to stderr through `tracing`.

use std::io::Write;
use std::path::Path;

use diffbrief_core::import::{import_review, parse_review};
use diffbrief_core::store::{self, NewAnnotation, StoredAnnotation};
use diffbrief_core::text::split_lines;
use diffbrief_core::types::Side;
use tokio_rusqlite::Connection;
use tracing::info;

use crate::cli::LineRange;
use crate::error::{AppError, Result};
use crate::git::{FileText, GitWorker, Revision};

fn stage_label(staged: bool) -> &'static str {
    if staged {
        "staged"
    } else {
        "unstaged"
    }
}

/// `diffbrief files`
pub async fn files(git: &GitWorker, out: &mut impl Write) -> Result<()> {
    let files = git.list_changed_files().await?;
    if files.is_empty() {
        writeln!(out, "No changes.").map_err(stdout_error)?;
    }
    for f in files {
        writeln!(out, "{} {:<8} {}", f.status.code(), stage_label(f.staged), f.path)
            .map_err(stdout_error)?;
    }
    Ok(())
}

/// Input for [`add_comment`], straight from the command line.
#[derive(Debug, Clone)]
pub struct CommentRequest {
    pub path: String,
    pub lines: LineRange,
    pub side: Side,
    pub staged: bool,
    pub text: String,
}

/// `diffbrief comment add`: records the commented lines as they read now so
/// the export can tell when they change afterwards.
pub async fn add_comment(
    git: &GitWorker,
    conn: &Connection,
    request: CommentRequest,
) -> Result<StoredAnnotation> {
    let revision = Revision::for_side(request.side, request.staged);
    let FileText::Text(content) = git.read_file_at(&request.path, revision).await? else {
        return Err(AppError::BinaryFile(request.path));
    };
    let lines = split_lines(&content);
    let LineRange { start, end } = request.lines;
    if start as usize > lines.len() {
        return Err(AppError::LineOutOfRange { path: request.path, line: start, len: lines.len() });
    }

    let covered = &lines[start as usize - 1..lines.len().min(end as usize)];
    let new = NewAnnotation {
        file_path: request.path,
        staged: request.staged,
        start_line: start,
        end_line: end,
        side: request.side,
        text: request.text,
        line_content: covered[0].to_owned(),
        line_contents: covered.iter().map(|l| (*l).to_owned()).collect(),
    };
    Ok(store::create_annotation(conn, new).await?)
}

/// `diffbrief comment list`
pub async fn list_comments(conn: &Connection, path: Option<&str>, out: &mut impl Write) -> Result<()> {
    let mut rows = store::list_all_annotations(conn).await?;
    if let Some(path) = path {
        rows.retain(|r| r.file_path == path);
    }
    if rows.is_empty() {
        writeln!(out, "No comments.").map_err(stdout_error)?;
    }
    for row in rows {
        let a = &row.annotation;
        let lines = if a.start_line == a.end_line {
            a.start_line.to_string()
        } else {
            format!("{}-{}", a.start_line, a.end_line)
        };
        writeln!(
            out,
            "{}  {}:{} ({}, {})  {}",
            a.id,
            row.file_path,
            lines,
            a.side,
            stage_label(row.staged),
            a.text.lines().next().unwrap_or_default()
        )
        .map_err(stdout_error)?;
    }
    Ok(())
}

/// `diffbrief import`
pub async fn import(conn: &Connection, file: &Path, out: &mut impl Write) -> Result<()> {
    let json = std::fs::read_to_string(file).map_err(|e| AppError::io(file, e))?;
    let summary = import_review(conn, parse_review(&json)?).await?;
    info!(file = %file.display(), annotations = summary.annotations, "import finished");
    writeln!(
        out,
        "Imported {} comment(s) and {} file comment(s) across {} file(s).",
        summary.annotations, summary.general_comments, summary.files
    )
    .map_err(stdout_error)?;
    Ok(())
}

fn stdout_error(e: std::io::Error) -> AppError {
    AppError::io("<stdout>", e)
}
