/// DDL to create the schema_version tracking table.
///
/// Applied unconditionally on every store open (before checking the version),
/// using `IF NOT EXISTS` so it is safe to run multiple times.
pub const SCHEMA_VERSION_DDL: &str = "
    CREATE TABLE IF NOT EXISTS schema_version (
        version INTEGER NOT NULL
    ) STRICT;
";

/// DDL for the v1 schema.
///
/// - `annotations`: line comments keyed by `(file_path, staged)`. `side` says
///   which version of the file `start_line..end_line` refer to.
///   `line_contents` is a JSON array of the commented lines.
/// - `file_notes`: at most one free-text comment per `(file_path, staged)`.
pub const SCHEMA_V1_SQL: &str = "
    CREATE TABLE IF NOT EXISTS annotations (
        id            TEXT    PRIMARY KEY,
        file_path     TEXT    NOT NULL,
        staged        INTEGER NOT NULL,
        start_line    INTEGER NOT NULL CHECK(start_line >= 1),
        end_line      INTEGER NOT NULL CHECK(end_line >= start_line),
        side          TEXT    NOT NULL CHECK(side IN ('old', 'new')),
        text          TEXT    NOT NULL,
        line_content  TEXT    NOT NULL DEFAULT '',
        line_contents TEXT    NOT NULL DEFAULT '[]',
        created_at    INTEGER NOT NULL,
        updated_at    INTEGER NOT NULL
    ) STRICT;

    CREATE INDEX IF NOT EXISTS annotations_by_file
        ON annotations (file_path, staged, start_line);

    CREATE TABLE IF NOT EXISTS file_notes (
        file_path       TEXT    NOT NULL,
        staged          INTEGER NOT NULL,
        general_comment TEXT    NOT NULL,
        updated_at      INTEGER NOT NULL,
        PRIMARY KEY (file_path, staged)
    ) STRICT;
";

/// Runs forward-only schema migration to bring the store to the latest version.
///
/// Idempotent: safe to call on every open regardless of whether the schema has
/// already been applied.
///
/// # Errors
///
/// Returns `rusqlite::Error` if the DDL fails or the version row cannot be read.
pub fn migrate(db: &mut rusqlite::Connection) -> rusqlite::Result<()> {
    db.execute_batch(SCHEMA_VERSION_DDL)?;

    let version: i64 = db
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |r| r.get(0),
        )
        .unwrap_or(0);

    if version < 1 {
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute_batch(SCHEMA_V1_SQL)?;
        tx.execute("INSERT INTO schema_version (version) VALUES (1)", [])?;
        tx.commit()?;
    }

    Ok(())
}
