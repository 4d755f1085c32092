//! diffbrief-core: turns uncommitted changes plus review comments into one
//! deterministic markdown brief.
//!
//! The pipeline is pure and synchronous:
//!
//! 1. [`align`] computes an LCS edit script between two line sequences.
//! 2. [`hunks`] groups the script into context-padded hunks.
//! 3. [`classify`] decides between an incremental diff and a rewrite.
//! 4. [`structure`] lists declarations that came and went in a rewrite.
//! 5. [`anchor`] attaches comments to hunks or to snippets of the full file.
//! 6. [`markdown`] renders the result.
//!
//! [`review`] drives steps 1–5 per file. The [`store`] and [`import`]
//! modules persist the comments that feed it.

pub mod align;
pub mod anchor;
pub mod classify;
pub mod config;
pub mod error;
pub mod hunks;
pub mod import;
pub mod markdown;
pub mod review;
pub mod schema;
pub mod store;
pub mod structure;
pub mod text;
pub mod types;

pub use config::EngineConfig;
pub use error::{CoreError, Result};
pub use review::{build_review, build_section, FileInput, ReviewContext};
