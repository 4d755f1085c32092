//! Git integration for diffbrief.
//!
//! [`GitWorker`] owns a background `std::thread::spawn` thread that holds the
//! `git2::Repository` for its lifetime. Async callers talk to it through
//! channels and never touch the repository directly.
pub mod types;
pub mod worker;

pub use types::{ChangedFile, FileText, GitError, Revision};
pub use worker::GitWorker;
