//! Import of review documents written by external tools (for example an
//! agent that reviewed the changes and left line comments).
//!
//! Two shapes are accepted:
//!
//! - the stored form: `{"version": 2, "comments": {"<path>:<staged>": {...}}}`
//! - the input form: `{"comments": [{"filePath": ..., "lineComments": [...]}]}`

use std::collections::BTreeMap;

use serde::Deserialize;
use tokio_rusqlite::Connection;

use crate::error::{CoreError, Result};
use crate::store::{new_annotation_id, now_millis, NewAnnotation};
use crate::types::Side;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileComments {
    pub file_path: String,
    #[serde(default)]
    pub staged: bool,
    #[serde(default)]
    pub general_comment: String,
    #[serde(default)]
    pub line_comments: Vec<LineComment>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineComment {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default = "first_line")]
    pub start_line: u32,
    #[serde(default)]
    pub end_line: Option<u32>,
    #[serde(default)]
    pub side: Side,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub line_content: String,
    #[serde(default)]
    pub line_contents: Option<Vec<String>>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub updated_at: Option<i64>,
}

fn first_line() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CommentsField {
    Keyed(BTreeMap<String, FileComments>),
    Listed(Vec<FileComments>),
}

#[derive(Debug, Deserialize)]
struct ReviewDocument {
    #[serde(default)]
    version: Option<u32>,
    comments: CommentsField,
}

/// Counts reported by [`import_review`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub files: usize,
    pub annotations: usize,
    pub general_comments: usize,
}

/// Parses a review document into per-file comment groups.
///
/// Missing `endLine` defaults to `startLine`, missing `side` to `new`, and
/// missing `lineContents` to `[lineContent]`.
///
/// # Errors
///
/// Returns [`CoreError::Json`] for malformed JSON and
/// [`CoreError::UnsupportedDocument`] for a stored form newer than version 2.
pub fn parse_review(json: &str) -> Result<Vec<FileComments>> {
    let doc: ReviewDocument = serde_json::from_str(json)?;
    if let Some(version) = doc.version.filter(|v| *v > 2) {
        return Err(CoreError::UnsupportedDocument(format!("version {version}")));
    }
    Ok(match doc.comments {
        CommentsField::Keyed(map) => map.into_values().collect(),
        CommentsField::Listed(list) => list,
    })
}

/// Converts one imported line comment into a validated annotation.
fn to_new_annotation(file: &FileComments, lc: &LineComment) -> Result<NewAnnotation> {
    let new = NewAnnotation {
        file_path: file.file_path.clone(),
        staged: file.staged,
        start_line: lc.start_line,
        end_line: lc.end_line.unwrap_or(lc.start_line),
        side: lc.side,
        text: lc.text.clone(),
        line_content: lc.line_content.clone(),
        line_contents: lc
            .line_contents
            .clone()
            .unwrap_or_else(|| vec![lc.line_content.clone()]),
    };
    new.validate()?;
    Ok(new)
}

/// Writes every comment of `files` into the store in one transaction.
///
/// Comments carrying an id replace any stored annotation with the same id, so
/// importing a document twice does not duplicate it. A non-empty general
/// comment replaces the stored one for that file.
///
/// # Errors
///
/// Returns [`CoreError::InvalidAnnotation`] (and writes nothing) if any line
/// comment has an impossible range or empty text.
pub async fn import_review(conn: &Connection, files: Vec<FileComments>) -> Result<ImportSummary> {
    let mut rows = Vec::new();
    let mut notes = Vec::new();
    let now = now_millis();

    for file in &files {
        for lc in &file.line_comments {
            let new = to_new_annotation(file, lc)?;
            let contents = serde_json::to_string(&new.line_contents)?;
            let id = lc.id.clone().filter(|id| !id.is_empty()).unwrap_or_else(new_annotation_id);
            let created = lc.created_at.unwrap_or(now);
            let updated = lc.updated_at.unwrap_or(created);
            rows.push((id, new, contents, created, updated));
        }
        if !file.general_comment.trim().is_empty() {
            notes.push((file.file_path.clone(), file.staged, file.general_comment.trim().to_owned()));
        }
    }

    let summary = ImportSummary {
        files: files.len(),
        annotations: rows.len(),
        general_comments: notes.len(),
    };

    conn.call(move |db| -> rusqlite::Result<()> {
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        for (id, a, contents, created, updated) in &rows {
            tx.execute(
                "INSERT OR REPLACE INTO annotations
                     (id, file_path, staged, start_line, end_line, side, text,
                      line_content, line_contents, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                rusqlite::params![
                    id,
                    &a.file_path,
                    a.staged,
                    a.start_line,
                    a.end_line,
                    a.side.as_str(),
                    &a.text,
                    &a.line_content,
                    contents,
                    created,
                    updated,
                ],
            )?;
        }
        for (path, staged, text) in &notes {
            tx.execute(
                "INSERT INTO file_notes (file_path, staged, general_comment, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(file_path, staged)
                 DO UPDATE SET general_comment = excluded.general_comment,
                               updated_at = excluded.updated_at",
                rusqlite::params![path, staged, text, now],
            )?;
        }
        tx.commit()
    })
    .await?;

    tracing::info!(
        files = summary.files,
        annotations = summary.annotations,
        general_comments = summary.general_comments,
        "review imported"
    );
    Ok(summary)
}
