//! Assembles one file's review section: picks how the change is presented
//! and anchors the file's comments to that presentation.

use crate::align::{align, exceeds_ceiling};
use crate::anchor::{context_snippet, is_stale, place_annotations, side_lines, Snippet};
use crate::classify::stats_from_ops;
use crate::config::EngineConfig;
use crate::hunks::build_hunks;
use crate::structure::summarize;
use crate::text::split_lines;
use crate::types::{Annotation, ChangeStats, FileStatus, Hunk, StructuralChange};

/// Files up to this many lines are previewed in full.
pub const PREVIEW_FULL_LIMIT: usize = 100;
/// Lines shown from the top of a file longer than [`PREVIEW_FULL_LIMIT`].
pub const PREVIEW_HEAD_LINES: usize = 50;

/// Everything known about one changed file at export time.
#[derive(Debug, Clone)]
pub struct FileInput {
    pub path: String,
    pub status: FileStatus,
    pub staged: bool,
    pub language: String,
    /// Empty when the file did not exist on the old side.
    pub old_content: String,
    /// Empty when the file does not exist on the new side.
    pub new_content: String,
    pub annotations: Vec<Annotation>,
    pub general_comment: Option<String>,
}

/// An annotation ready to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub annotation: Annotation,
    /// Lines around the comment, for comments shown outside a hunk.
    pub snippet: Option<Snippet>,
    /// The commented line reads differently than when the comment was written.
    pub stale: bool,
}

/// A hunk and the comments anchored to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HunkBlock {
    pub hunk: Hunk,
    pub comments: Vec<Comment>,
}

/// The head of a file's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub lines: Vec<String>,
    pub total_lines: usize,
}

impl Preview {
    /// Full content up to [`PREVIEW_FULL_LIMIT`] lines, otherwise the first
    /// [`PREVIEW_HEAD_LINES`].
    pub fn of(lines: &[&str]) -> Self {
        let shown = if lines.len() <= PREVIEW_FULL_LIMIT { lines.len() } else { PREVIEW_HEAD_LINES };
        Preview {
            lines: lines[..shown].iter().map(|l| (*l).to_owned()).collect(),
            total_lines: lines.len(),
        }
    }

    pub fn hidden_lines(&self) -> usize {
        self.total_lines - self.lines.len()
    }
}

/// How a file's change is presented.
#[derive(Debug, Clone, PartialEq)]
pub enum FileBody {
    /// Old and new text are identical (e.g. a mode-only change).
    Unchanged { comments: Vec<Comment> },
    /// The file did not exist on the old side.
    NewFile { preview: Preview, changes: Vec<StructuralChange>, comments: Vec<Comment> },
    /// The file no longer exists on the new side.
    Deleted { removed_lines: usize, changes: Vec<StructuralChange>, comments: Vec<Comment> },
    /// Both sides are too large to align.
    TooLarge { comments: Vec<Comment> },
    /// Too much changed for hunks to be useful.
    Rewrite { changes: Vec<StructuralChange>, preview: Preview, comments: Vec<Comment> },
    /// The texts differ but their line sequences do not, i.e. only the
    /// trailing newline changed.
    EolOnly { comments: Vec<Comment> },
    /// An incremental change shown as hunks.
    Hunks { blocks: Vec<HunkBlock>, other: Vec<Comment> },
}

impl FileBody {
    /// Number of line comments carried by this body.
    pub fn comment_count(&self) -> usize {
        match self {
            FileBody::Unchanged { comments }
            | FileBody::NewFile { comments, .. }
            | FileBody::Deleted { comments, .. }
            | FileBody::TooLarge { comments }
            | FileBody::Rewrite { comments, .. }
            | FileBody::EolOnly { comments } => comments.len(),
            FileBody::Hunks { blocks, other } => {
                blocks.iter().map(|b| b.comments.len()).sum::<usize>() + other.len()
            }
        }
    }
}

/// One file of the exported review.
#[derive(Debug, Clone, PartialEq)]
pub struct FileSection {
    pub path: String,
    pub status: FileStatus,
    pub staged: bool,
    pub language: String,
    pub old_line_count: usize,
    pub new_line_count: usize,
    /// `None` when the file was too large to align.
    pub stats: Option<ChangeStats>,
    pub general_comment: Option<String>,
    pub body: FileBody,
}

impl FileSection {
    /// Line comments plus the file-level comment, if any.
    pub fn comment_count(&self) -> usize {
        self.body.comment_count() + usize::from(self.general_comment.is_some())
    }
}

/// One row of the summary table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub path: String,
    pub status: FileStatus,
    pub staged: bool,
    pub comments: usize,
    pub language: String,
}

/// The complete export: an optional focus note plus one section per file, in
/// input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewContext {
    pub focus: Option<String>,
    pub sections: Vec<FileSection>,
}

impl ReviewContext {
    pub fn summary_rows(&self) -> Vec<SummaryRow> {
        self.sections
            .iter()
            .map(|s| SummaryRow {
                path: s.path.clone(),
                status: s.status,
                staged: s.staged,
                comments: s.comment_count(),
                language: s.language.clone(),
            })
            .collect()
    }

    pub fn total_comments(&self) -> usize {
        self.sections.iter().map(FileSection::comment_count).sum()
    }
}

/// Builds the review context for a batch of files.
pub fn build_review(inputs: &[FileInput], focus: Option<String>, config: &EngineConfig) -> ReviewContext {
    let focus = focus.map(|f| f.trim().to_owned()).filter(|f| !f.is_empty());
    ReviewContext { focus, sections: inputs.iter().map(|i| build_section(i, config)).collect() }
}

/// Builds one file's section.
///
/// Total: every input produces a section, and every annotation appears in it
/// exactly once.
pub fn build_section(input: &FileInput, config: &EngineConfig) -> FileSection {
    let old = split_lines(&input.old_content);
    let new = split_lines(&input.new_content);
    let general_comment = input
        .general_comment
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_owned);

    let standalone = |annotations: &[Annotation]| {
        standalone_comments(annotations, &old, &new, config.comment_context)
    };

    let (stats, body) = if input.old_content == input.new_content {
        let stats = stats_from_ops(old.len(), new.len(), &[]);
        (Some(stats), FileBody::Unchanged { comments: standalone(&input.annotations) })
    } else if old.is_empty() && !new.is_empty() {
        let stats = stats_from_ops(0, new.len(), &align(&old, &new));
        let body = FileBody::NewFile {
            preview: Preview::of(&new),
            changes: summarize("", &input.new_content, &input.language),
            comments: standalone(&input.annotations),
        };
        (Some(stats), body)
    } else if new.is_empty() && !old.is_empty() {
        let stats = stats_from_ops(old.len(), 0, &align(&old, &new));
        let body = FileBody::Deleted {
            removed_lines: old.len(),
            changes: summarize(&input.old_content, "", &input.language),
            comments: standalone(&input.annotations),
        };
        (Some(stats), body)
    } else if exceeds_ceiling(old.len(), new.len(), config.max_lines) {
        tracing::debug!(
            path = %input.path,
            old_lines = old.len(),
            new_lines = new.len(),
            max_lines = config.max_lines,
            "diff exceeds line ceiling; omitting hunk detail"
        );
        (None, FileBody::TooLarge { comments: standalone(&input.annotations) })
    } else {
        let ops = align(&old, &new);
        let stats = stats_from_ops(old.len(), new.len(), &ops);
        let body = if stats.is_major_rewrite {
            tracing::debug!(path = %input.path, percent = stats.changed_percent, "major rewrite");
            FileBody::Rewrite {
                changes: summarize(&input.old_content, &input.new_content, &input.language),
                preview: Preview::of(&new),
                comments: standalone(&input.annotations),
            }
        } else {
            let hunks = build_hunks(&ops, config.context_lines);
            if hunks.is_empty() {
                FileBody::EolOnly { comments: standalone(&input.annotations) }
            } else {
                hunk_body(hunks, &input.annotations, &old, &new, config.comment_context)
            }
        };
        (Some(stats), body)
    };

    FileSection {
        path: input.path.clone(),
        status: input.status,
        staged: input.staged,
        language: input.language.clone(),
        old_line_count: old.len(),
        new_line_count: new.len(),
        stats,
        general_comment,
        body,
    }
}

/// Anchors annotations to hunks; the rest become standalone comments.
fn hunk_body(
    hunks: Vec<Hunk>,
    annotations: &[Annotation],
    old: &[&str],
    new: &[&str],
    radius: usize,
) -> FileBody {
    let placement = place_annotations(&hunks, annotations);
    let blocks = hunks
        .into_iter()
        .zip(placement.placed)
        .map(|(hunk, placed)| HunkBlock {
            hunk,
            comments: placed
                .into_iter()
                .map(|annotation| {
                    let stale = is_stale(&annotation, side_lines(annotation.side, old, new));
                    Comment { annotation, snippet: None, stale }
                })
                .collect(),
        })
        .collect();
    FileBody::Hunks { blocks, other: standalone_comments(&placement.uncovered, old, new, radius) }
}

/// Comments rendered outside any hunk, each with a snippet cut from the full
/// content of its side, ordered by start line.
fn standalone_comments(annotations: &[Annotation], old: &[&str], new: &[&str], radius: usize) -> Vec<Comment> {
    let mut comments: Vec<Comment> = annotations
        .iter()
        .map(|a| {
            let annotation = a.clamped();
            let lines = side_lines(annotation.side, old, new);
            Comment {
                snippet: context_snippet(lines, &annotation, radius),
                stale: is_stale(&annotation, lines),
                annotation,
            }
        })
        .collect();
    comments.sort_by_key(|c| c.annotation.start_line);
    comments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Side;

    fn input(old: &str, new: &str, annotations: Vec<Annotation>) -> FileInput {
        FileInput {
            path: "src/app.ts".into(),
            status: FileStatus::Modified,
            staged: false,
            language: "typescript".into(),
            old_content: old.into(),
            new_content: new.into(),
            annotations,
            general_comment: None,
        }
    }

    fn note(start: u32, side: Side) -> Annotation {
        Annotation {
            id: format!("n{start}"),
            start_line: start,
            end_line: start,
            side,
            text: "look here".into(),
            line_content: String::new(),
            line_contents: Vec::new(),
        }
    }

    fn numbered(n: usize) -> String {
        (1..=n).map(|i| format!("line {i}\n")).collect()
    }

    #[test]
    fn added_file_takes_the_new_file_branch() {
        let section = build_section(&input("", "line1\nline2", vec![]), &EngineConfig::default());
        let stats = section.stats.unwrap();
        assert_eq!(stats.old_line_count, 0);
        assert!(stats.is_major_rewrite);
        assert!(matches!(section.body, FileBody::NewFile { .. }));
    }

    #[test]
    fn comment_outside_hunks_gets_a_snippet_from_new_content() {
        let old = numbered(30);
        let new = old.replace("line 20\n", "line twenty\n");
        let section = build_section(&input(&old, &new, vec![note(5, Side::New)]), &EngineConfig::default());
        let FileBody::Hunks { blocks, other } = section.body else {
            panic!("expected hunks");
        };
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].comments.is_empty());
        assert_eq!(other.len(), 1);
        let snippet = other[0].snippet.as_ref().unwrap();
        assert_eq!(snippet.first_line, 3);
        assert_eq!(snippet.lines, vec!["line 3", "line 4", "line 5", "line 6", "line 7"]);
    }

    #[test]
    fn trailing_newline_only_change_is_reported() {
        let section = build_section(&input("a\nb\n", "a\nb", vec![]), &EngineConfig::default());
        assert!(matches!(section.body, FileBody::EolOnly { .. }));
    }

    #[test]
    fn oversized_files_degrade_without_losing_comments() {
        let config = EngineConfig { max_lines: 10, ..EngineConfig::default() };
        let old = numbered(20);
        let new = old.replace("line 3\n", "line three\n");
        let section = build_section(&input(&old, &new, vec![note(3, Side::Old)]), &config);
        assert!(section.stats.is_none());
        assert_eq!(section.body.comment_count(), 1);
        assert!(matches!(section.body, FileBody::TooLarge { .. }));
    }

    #[test]
    fn preview_truncates_long_files() {
        let long = numbered(150);
        let lines = split_lines(&long);
        let preview = Preview::of(&lines);
        assert_eq!((preview.lines.len(), preview.hidden_lines()), (50, 100));

        let short = numbered(100);
        let lines = split_lines(&short);
        assert_eq!(Preview::of(&lines).hidden_lines(), 0);
    }
}
