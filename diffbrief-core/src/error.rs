//! Error types for the annotation store and review import.
//!
//! The diff engine itself never fails; these cover the boundaries around it.

use thiserror::Error;

/// Errors raised while validating, storing, or importing annotations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// An annotation with a line range that cannot exist.
    #[error("invalid annotation: {0}")]
    InvalidAnnotation(String),

    /// No annotation with this id exists.
    #[error("annotation '{0}' not found")]
    AnnotationNotFound(String),

    /// A review document that is well-formed JSON but not a review.
    #[error("unsupported review document: {0}")]
    UnsupportedDocument(String),

    /// SQLite failure, including a closed connection.
    #[error("database error: {0}")]
    Db(#[from] tokio_rusqlite::Error),

    /// JSON encode/decode failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for store and import operations.
pub type Result<T> = std::result::Result<T, CoreError>;
