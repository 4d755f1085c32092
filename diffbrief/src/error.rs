use std::path::PathBuf;

use diffbrief_core::CoreError;
use thiserror::Error;

use crate::git::GitError;

/// Errors surfaced by `diffbrief` subcommands.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Comments can only be attached to text files.
    #[error("{0} is a binary file")]
    BinaryFile(String),

    /// The commented range starts past the end of the file.
    #[error("{path} has {len} line(s); line {line} does not exist")]
    LineOutOfRange { path: String, line: u32, len: usize },
}

impl AppError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::Io { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
