//! SQLite persistence for annotations and file-level notes.
//!
//! Annotations are keyed by `(file_path, staged)`: the same path can carry
//! separate comments for its staged and unstaged changes.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;

use crate::error::{CoreError, Result};
use crate::types::{Annotation, Side};

/// Opens (or creates) the annotation store at `path`, configures WAL mode,
/// and applies schema migrations via the `schema_version` table.
///
/// `busy_timeout` is set via the `Connection` method rather than a PRAGMA
/// string so it takes effect regardless of pragma caching.
///
/// # Errors
///
/// Returns [`CoreError::Db`] if the file cannot be opened, WAL configuration
/// fails, or schema DDL fails.
pub async fn open_store(path: &str) -> Result<Connection> {
    let conn = Connection::open(path).await.map_err(tokio_rusqlite::Error::from)?;

    conn.call(|db| -> rusqlite::Result<()> {
        db.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;",
        )?;
        db.busy_timeout(Duration::from_secs(5))?;
        Ok(())
    })
    .await?;

    conn.call(|db| -> rusqlite::Result<()> { crate::schema::migrate(db) }).await?;

    Ok(conn)
}

/// Milliseconds since the Unix epoch.
pub(crate) fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// A short lowercase alphanumeric id for a new annotation.
pub(crate) fn new_annotation_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..7].to_owned()
}

/// Input for [`create_annotation`].
#[derive(Debug, Clone)]
pub struct NewAnnotation {
    pub file_path: String,
    pub staged: bool,
    pub start_line: u32,
    pub end_line: u32,
    pub side: Side,
    pub text: String,
    pub line_content: String,
    pub line_contents: Vec<String>,
}

impl NewAnnotation {
    /// Rejects line ranges that cannot exist and empty comment text.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidAnnotation`] describing the first problem.
    pub fn validate(&self) -> Result<()> {
        if self.start_line == 0 {
            return Err(CoreError::InvalidAnnotation(
                "line numbers start at 1".to_owned(),
            ));
        }
        if self.start_line > self.end_line {
            return Err(CoreError::InvalidAnnotation(format!(
                "start line {} is after end line {}",
                self.start_line, self.end_line
            )));
        }
        if self.text.trim().is_empty() {
            return Err(CoreError::InvalidAnnotation("comment text is empty".to_owned()));
        }
        if self.file_path.is_empty() {
            return Err(CoreError::InvalidAnnotation("file path is empty".to_owned()));
        }
        Ok(())
    }
}

/// An annotation together with the key it is stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAnnotation {
    pub file_path: String,
    pub staged: bool,
    pub annotation: Annotation,
    pub created_at: i64,
    pub updated_at: i64,
}

const SELECT_COLUMNS: &str = "SELECT id, file_path, staged, start_line, end_line, side, text,
        line_content, line_contents, created_at, updated_at
 FROM annotations";

fn row_to_stored(r: &rusqlite::Row<'_>) -> rusqlite::Result<StoredAnnotation> {
    use rusqlite::types::Type;

    let side: String = r.get(5)?;
    let side = side
        .parse::<Side>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, e.into()))?;
    let contents: String = r.get(8)?;
    let line_contents: Vec<String> = serde_json::from_str(&contents)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(e)))?;

    Ok(StoredAnnotation {
        file_path: r.get(1)?,
        staged: r.get(2)?,
        annotation: Annotation {
            id: r.get(0)?,
            start_line: r.get(3)?,
            end_line: r.get(4)?,
            side,
            text: r.get(6)?,
            line_content: r.get(7)?,
            line_contents,
        },
        created_at: r.get(9)?,
        updated_at: r.get(10)?,
    })
}

/// Validates and inserts a new annotation.
///
/// # Errors
///
/// Returns [`CoreError::InvalidAnnotation`] before touching the database when
/// the range or text is invalid, or [`CoreError::Db`] if the insert fails.
pub async fn create_annotation(conn: &Connection, new: NewAnnotation) -> Result<StoredAnnotation> {
    new.validate()?;
    let contents = serde_json::to_string(&new.line_contents)?;
    let id = new_annotation_id();
    let now = now_millis();

    let stored = StoredAnnotation {
        file_path: new.file_path,
        staged: new.staged,
        annotation: Annotation {
            id,
            start_line: new.start_line,
            end_line: new.end_line,
            side: new.side,
            text: new.text,
            line_content: new.line_content,
            line_contents: new.line_contents,
        },
        created_at: now,
        updated_at: now,
    };

    let row = stored.clone();
    conn.call(move |db| -> rusqlite::Result<()> {
        let a = &row.annotation;
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO annotations (id, file_path, staged, start_line, end_line, side, text,
                                      line_content, line_contents, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
            rusqlite::params![
                &a.id,
                &row.file_path,
                row.staged,
                a.start_line,
                a.end_line,
                a.side.as_str(),
                &a.text,
                &a.line_content,
                &contents,
                row.created_at,
            ],
        )?;
        tx.commit()
    })
    .await?;

    tracing::debug!(id = %stored.annotation.id, path = %stored.file_path, "annotation created");
    Ok(stored)
}

/// Replaces the text of annotation `id`.
///
/// # Errors
///
/// Returns [`CoreError::AnnotationNotFound`] if no such annotation exists and
/// [`CoreError::InvalidAnnotation`] for empty text.
pub async fn update_annotation_text(conn: &Connection, id: &str, text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(CoreError::InvalidAnnotation("comment text is empty".to_owned()));
    }
    let id = id.to_owned();
    let text = text.to_owned();
    let key = id.clone();

    let changed = conn
        .call(move |db| -> rusqlite::Result<usize> {
            let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
            let n = tx.execute(
                "UPDATE annotations SET text = ?1, updated_at = ?2 WHERE id = ?3",
                rusqlite::params![&text, now_millis(), &id],
            )?;
            tx.commit()?;
            Ok(n)
        })
        .await?;

    if changed == 0 {
        return Err(CoreError::AnnotationNotFound(key));
    }
    Ok(())
}

/// Deletes annotation `id`.
///
/// # Errors
///
/// Returns [`CoreError::AnnotationNotFound`] if no such annotation exists.
pub async fn delete_annotation(conn: &Connection, id: &str) -> Result<()> {
    let id = id.to_owned();
    let key = id.clone();

    let deleted = conn
        .call(move |db| -> rusqlite::Result<usize> {
            db.execute("DELETE FROM annotations WHERE id = ?1", rusqlite::params![&id])
        })
        .await?;

    if deleted == 0 {
        return Err(CoreError::AnnotationNotFound(key));
    }
    Ok(())
}

/// Loads one annotation by id.
pub async fn get_annotation(conn: &Connection, id: &str) -> Result<Option<StoredAnnotation>> {
    let id = id.to_owned();
    let found = conn
        .call(move |db| -> rusqlite::Result<Option<StoredAnnotation>> {
            db.query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                rusqlite::params![&id],
                row_to_stored,
            )
            .optional()
        })
        .await?;
    Ok(found)
}

/// Lists the annotations stored for `(file_path, staged)`, ordered by start
/// line and then creation time.
pub async fn list_annotations(
    conn: &Connection,
    file_path: &str,
    staged: bool,
) -> Result<Vec<Annotation>> {
    let file_path = file_path.to_owned();

    let rows = conn
        .call(move |db| -> rusqlite::Result<Vec<StoredAnnotation>> {
            let mut stmt = db.prepare(&format!(
                "{SELECT_COLUMNS} WHERE file_path = ?1 AND staged = ?2
                 ORDER BY start_line, created_at, id"
            ))?;
            let rows = stmt
                .query_map(rusqlite::params![&file_path, staged], row_to_stored)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
        .await?;

    Ok(rows.into_iter().map(|s| s.annotation).collect())
}

/// Lists every stored annotation ordered by path, stage (unstaged first),
/// start line, and creation time.
pub async fn list_all_annotations(conn: &Connection) -> Result<Vec<StoredAnnotation>> {
    let rows = conn
        .call(|db| -> rusqlite::Result<Vec<StoredAnnotation>> {
            let mut stmt = db.prepare(&format!(
                "{SELECT_COLUMNS} ORDER BY file_path, staged, start_line, created_at, id"
            ))?;
            let rows = stmt
                .query_map([], row_to_stored)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
        .await?;
    Ok(rows)
}

/// Sets the file-level comment for `(file_path, staged)`.
///
/// Empty (or whitespace-only) text removes the comment.
pub async fn set_general_comment(
    conn: &Connection,
    file_path: &str,
    staged: bool,
    text: &str,
) -> Result<()> {
    let file_path = file_path.to_owned();
    let text = text.trim().to_owned();

    conn.call(move |db| -> rusqlite::Result<()> {
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        if text.is_empty() {
            tx.execute(
                "DELETE FROM file_notes WHERE file_path = ?1 AND staged = ?2",
                rusqlite::params![&file_path, staged],
            )?;
        } else {
            tx.execute(
                "INSERT INTO file_notes (file_path, staged, general_comment, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(file_path, staged)
                 DO UPDATE SET general_comment = excluded.general_comment,
                               updated_at = excluded.updated_at",
                rusqlite::params![&file_path, staged, &text, now_millis()],
            )?;
        }
        tx.commit()
    })
    .await?;
    Ok(())
}

/// Returns the file-level comment for `(file_path, staged)`, if any.
pub async fn general_comment(
    conn: &Connection,
    file_path: &str,
    staged: bool,
) -> Result<Option<String>> {
    let file_path = file_path.to_owned();

    let found = conn
        .call(move |db| -> rusqlite::Result<Option<String>> {
            db.query_row(
                "SELECT general_comment FROM file_notes WHERE file_path = ?1 AND staged = ?2",
                rusqlite::params![&file_path, staged],
                |r| r.get(0),
            )
            .optional()
        })
        .await?;
    Ok(found)
}
