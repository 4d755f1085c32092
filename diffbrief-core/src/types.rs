use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which version of a file a line reference points into.
///
/// `Old` is the before-version (HEAD for staged changes, the index for unstaged
/// ones); `New` is the after-version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Old,
    #[default]
    New,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Old => "old",
            Side::New => "new",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "old" => Ok(Side::Old),
            "new" => Ok(Side::New),
            other => Err(format!("unknown side '{other}' (expected 'old' or 'new')")),
        }
    }
}

/// Single-letter git status of a changed file.
///
/// Only used for labelling; the engine branches on content, not on status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileStatus {
    Added,
    Deleted,
    Modified,
    Renamed,
    Copied,
    Unmerged,
    TypeChanged,
}

impl FileStatus {
    /// Porcelain status letter, as printed by `diffbrief files`.
    pub fn code(self) -> char {
        match self {
            FileStatus::Added => 'A',
            FileStatus::Deleted => 'D',
            FileStatus::Modified => 'M',
            FileStatus::Renamed => 'R',
            FileStatus::Copied => 'C',
            FileStatus::Unmerged => 'U',
            FileStatus::TypeChanged => 'T',
        }
    }

    /// Human-readable label used in the summary table.
    pub fn label(self) -> &'static str {
        match self {
            FileStatus::Added => "Added",
            FileStatus::Deleted => "Deleted",
            FileStatus::Modified => "Modified",
            FileStatus::Renamed => "Renamed",
            FileStatus::Copied => "Copied",
            FileStatus::Unmerged => "Unmerged",
            FileStatus::TypeChanged => "Type changed",
        }
    }
}

/// A user-authored comment anchored to a line range on one side of a file.
///
/// `start_line..=end_line` are 1-based line numbers into the `side` version.
/// `line_content` is the first commented line as it looked when the comment was
/// written; `line_contents` holds every line of the range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub id: String,
    pub start_line: u32,
    pub end_line: u32,
    pub side: Side,
    pub text: String,
    pub line_content: String,
    pub line_contents: Vec<String>,
}

impl Annotation {
    /// Returns a copy with `start_line >= 1` and `end_line >= start_line`.
    ///
    /// Validation happens where annotations are created; this only keeps an
    /// export from misplacing a malformed row that slipped through.
    pub fn clamped(&self) -> Annotation {
        let start_line = self.start_line.max(1);
        let end_line = self.end_line.max(start_line);
        Annotation { start_line, end_line, ..self.clone() }
    }
}

/// One operation of an edit script produced by the aligner.
///
/// Indices are 0-based positions into the old and new line sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOp<'a> {
    Equal { old_index: usize, new_index: usize, content: &'a str },
    Insert { new_index: usize, content: &'a str },
    Delete { old_index: usize, content: &'a str },
}

impl<'a> EditOp<'a> {
    pub fn content(&self) -> &'a str {
        match *self {
            EditOp::Equal { content, .. }
            | EditOp::Insert { content, .. }
            | EditOp::Delete { content, .. } => content,
        }
    }

    pub fn is_equal(&self) -> bool {
        matches!(self, EditOp::Equal { .. })
    }
}

/// A diff hunk: a contiguous run of the edit script plus its context lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub old_start: u32,
    pub old_count: u32,
    pub new_start: u32,
    pub new_count: u32,
    pub lines: Vec<DiffLine>,
}

impl Hunk {
    /// The `@@ -old_start,old_count +new_start,new_count @@` header.
    pub fn header(&self) -> String {
        format!(
            "@@ -{},{} +{},{} @@",
            self.old_start, self.old_count, self.new_start, self.new_count
        )
    }

    /// Inclusive line range this hunk covers on `side`, or `None` when the hunk
    /// materializes no lines on that side.
    pub fn range(&self, side: Side) -> Option<(u32, u32)> {
        let (start, count) = match side {
            Side::Old => (self.old_start, self.old_count),
            Side::New => (self.new_start, self.new_count),
        };
        (count > 0).then(|| (start, start + count - 1))
    }
}

/// A single line within a diff hunk with change type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub kind: DiffLineKind,
    pub content: String,
    pub old_lineno: Option<u32>,
    pub new_lineno: Option<u32>,
}

/// The type of change for a diff line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffLineKind {
    Added,
    Removed,
    Context,
}

impl DiffLineKind {
    pub fn marker(self) -> char {
        match self {
            DiffLineKind::Added => '+',
            DiffLineKind::Removed => '-',
            DiffLineKind::Context => ' ',
        }
    }
}

/// Line-count statistics and the incremental-vs-rewrite verdict for one file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChangeStats {
    pub old_line_count: usize,
    pub new_line_count: usize,
    pub added_lines: usize,
    pub removed_lines: usize,
    pub changed_percent: f64,
    pub is_major_rewrite: bool,
}

/// Kind of a top-level declaration found by the structural summarizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructuralKind {
    Function,
    Class,
    Interface,
    Type,
    Enum,
    Struct,
    Trait,
    Impl,
}

impl StructuralKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StructuralKind::Function => "function",
            StructuralKind::Class => "class",
            StructuralKind::Interface => "interface",
            StructuralKind::Type => "type",
            StructuralKind::Enum => "enum",
            StructuralKind::Struct => "struct",
            StructuralKind::Trait => "trait",
            StructuralKind::Impl => "impl",
        }
    }
}

impl fmt::Display for StructuralKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named declaration detected in one snapshot of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralElement {
    pub name: String,
    pub kind: StructuralKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeAction {
    Added,
    Removed,
}

/// A declaration that appears in only one of the two snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralChange {
    pub kind: StructuralKind,
    pub name: String,
    pub action: ChangeAction,
}
