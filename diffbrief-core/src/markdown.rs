//! Markdown rendering of a [`ReviewContext`].
//!
//! The output is read by scripts and agents, so its shape is an interface:
//! heading levels, section order, the summary table columns and the
//! `@@ -a,b +c,d @@` hunk headers must stay stable. Rendering is a pure
//! function of the context; the same input always yields the same bytes.

use crate::anchor::Snippet;
use crate::review::{Comment, FileBody, FileSection, Preview, ReviewContext};
use crate::types::{ChangeAction, DiffLineKind, Hunk, StructuralChange};

/// Line-oriented string builder.
#[derive(Default)]
struct Doc {
    out: String,
}

impl Doc {
    fn line(&mut self, text: impl AsRef<str>) {
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    /// A fenced block whose fence is longer than any backtick run inside it.
    fn fenced<S: AsRef<str>>(&mut self, info: &str, body: &[S]) {
        let fence = fence_for(body.iter().map(|l| l.as_ref()));
        self.line(format!("{fence}{info}"));
        for l in body {
            self.line(l);
        }
        self.line(&fence);
    }
}

fn fence_for<'a>(lines: impl Iterator<Item = &'a str>) -> String {
    let longest = lines
        .flat_map(|l| l.split(|c| c != '`').map(str::len))
        .max()
        .unwrap_or(0);
    "`".repeat(longest.max(2) + 1)
}

/// Wraps `text` in an inline code span that survives backticks inside it.
fn code_span(text: &str) -> String {
    let longest = text.split(|c| c != '`').map(str::len).max().unwrap_or(0);
    let ticks = "`".repeat(longest + 1);
    if text.starts_with('`') || text.ends_with('`') {
        format!("{ticks} {text} {ticks}")
    } else {
        format!("{ticks}{text}{ticks}")
    }
}

/// Renders the whole review document.
pub fn render(context: &ReviewContext) -> String {
    let mut doc = Doc::default();
    doc.line("# Review Context");
    doc.blank();
    render_summary(&mut doc, context);

    if let Some(focus) = &context.focus {
        doc.line("## Focus");
        doc.blank();
        for l in focus.lines() {
            doc.line(l);
        }
        doc.blank();
    }

    for section in &context.sections {
        render_section(&mut doc, section);
    }
    doc.out
}

fn render_summary(doc: &mut Doc, context: &ReviewContext) {
    doc.line("## Summary");
    doc.blank();
    let rows = context.summary_rows();
    if rows.is_empty() {
        doc.line("_No changes to review._");
        doc.blank();
        return;
    }
    doc.line(format!(
        "{} file(s) changed, {} comment(s).",
        rows.len(),
        context.total_comments()
    ));
    doc.blank();
    doc.line("| File | Status | Stage | Comments | Language |");
    doc.line("|------|--------|-------|----------|----------|");
    for row in rows {
        doc.line(format!(
            "| {} | {} | {} | {} | {} |",
            code_span(&row.path).replace('|', "\\|"),
            row.status.label(),
            stage_label(row.staged),
            row.comments,
            row.language
        ));
    }
    doc.blank();
}

fn stage_label(staged: bool) -> &'static str {
    if staged {
        "Staged"
    } else {
        "Unstaged"
    }
}

fn render_section(doc: &mut Doc, section: &FileSection) {
    doc.line(format!("## {}", code_span(&section.path)));
    doc.blank();
    let delta = section.new_line_count as i64 - section.old_line_count as i64;
    doc.line(format!(
        "**Stage:** {} | **Language:** {} | **Lines:** {} → {} ({:+})",
        stage_label(section.staged),
        section.language,
        section.old_line_count,
        section.new_line_count,
        delta
    ));
    doc.blank();

    if let Some(note) = &section.general_comment {
        let mut lines = note.lines();
        doc.line(format!("> **File comment:** {}", lines.next().unwrap_or_default()));
        for l in lines {
            doc.line(format!("> {l}").trim_end());
        }
        doc.blank();
    }

    let lang = section.language.as_str();
    match &section.body {
        FileBody::Unchanged { comments } => {
            doc.line("_No content changes._");
            doc.blank();
            render_comment_list(doc, "#### Comments", comments, lang);
        }
        FileBody::EolOnly { comments } => {
            doc.line("_Content differs only in line endings or the trailing newline._");
            doc.blank();
            render_comment_list(doc, "#### Comments", comments, lang);
        }
        FileBody::TooLarge { comments } => {
            doc.line(format!(
                "_Diff too large to display ({} → {} lines)._",
                section.old_line_count, section.new_line_count
            ));
            doc.blank();
            render_comment_list(doc, "#### Comments", comments, lang);
        }
        FileBody::NewFile { preview, changes, comments } => {
            doc.line("### New File");
            doc.blank();
            doc.line(format!("{} line(s) added.", preview.total_lines));
            doc.blank();
            render_structural(doc, changes);
            render_preview(doc, "Content", preview, lang);
            render_comment_list(doc, "#### Comments", comments, lang);
        }
        FileBody::Deleted { removed_lines, changes, comments } => {
            doc.line("### Deleted File");
            doc.blank();
            doc.line(format!("{removed_lines} line(s) removed."));
            doc.blank();
            render_structural(doc, changes);
            render_comment_list(doc, "#### Comments", comments, lang);
        }
        FileBody::Rewrite { changes, preview, comments } => {
            doc.line("### Major Rewrite");
            doc.blank();
            if let Some(stats) = &section.stats {
                doc.line(format!(
                    "{:.0}% of lines changed (+{} / -{}).",
                    stats.changed_percent, stats.added_lines, stats.removed_lines
                ));
                doc.blank();
            }
            render_structural(doc, changes);
            render_preview(doc, "New content", preview, lang);
            render_comment_list(doc, "#### Comments", comments, lang);
        }
        FileBody::Hunks { blocks, other } => {
            doc.line("### Changes");
            doc.blank();
            for block in blocks {
                render_hunk(doc, &block.hunk);
                doc.blank();
                for comment in &block.comments {
                    render_comment(doc, comment, lang);
                }
            }
            render_comment_list(doc, "#### Other Comments", other, lang);
        }
    }
}

/// Hunk fence: the header, then each line as `<new line no> <marker> <content>`.
fn render_hunk(doc: &mut Doc, hunk: &Hunk) {
    let width = hunk
        .lines
        .iter()
        .filter_map(|l| l.new_lineno)
        .max()
        .map_or(1, |n| n.to_string().len());

    let mut body = Vec::with_capacity(hunk.lines.len() + 1);
    body.push(hunk.header());
    for l in &hunk.lines {
        let number = match (l.kind, l.new_lineno) {
            (DiffLineKind::Removed, _) | (_, None) => String::new(),
            (_, Some(n)) => n.to_string(),
        };
        body.push(format!("{number:>width$} {} {}", l.kind.marker(), l.content));
    }
    doc.fenced("", &body);
}

fn render_structural(doc: &mut Doc, changes: &[StructuralChange]) {
    if changes.is_empty() {
        doc.line("_No declaration-level changes detected._");
        doc.blank();
        return;
    }
    doc.line("**Structural changes:**");
    doc.blank();
    for change in changes {
        let action = match change.action {
            ChangeAction::Added => "Added",
            ChangeAction::Removed => "Removed",
        };
        doc.line(format!("- {action} {} `{}`", change.kind, change.name));
    }
    doc.blank();
}

fn render_preview(doc: &mut Doc, label: &str, preview: &Preview, lang: &str) {
    if preview.hidden_lines() == 0 {
        doc.line(format!("**{label}:**"));
    } else {
        doc.line(format!(
            "**{label}** (first {} of {} lines):",
            preview.lines.len(),
            preview.total_lines
        ));
    }
    doc.blank();
    doc.fenced(lang, &preview.lines);
    if preview.hidden_lines() > 0 {
        doc.blank();
        doc.line(format!("_… {} more lines not shown._", preview.hidden_lines()));
    }
    doc.blank();
}

fn render_comment_list(doc: &mut Doc, heading: &str, comments: &[Comment], lang: &str) {
    if comments.is_empty() {
        return;
    }
    doc.line(heading);
    doc.blank();
    for comment in comments {
        render_comment(doc, comment, lang);
    }
}

fn render_comment(doc: &mut Doc, comment: &Comment, lang: &str) {
    let a = &comment.annotation;
    let location = if a.start_line == a.end_line {
        format!("Line {}", a.start_line)
    } else {
        format!("Lines {}-{}", a.start_line, a.end_line)
    };
    let stale = if comment.stale { " _(line changed since this comment)_" } else { "" };
    doc.line(format!("**{location}** ({}){stale}:", a.side));
    doc.blank();

    if let Some(snippet) = &comment.snippet {
        render_snippet(doc, snippet, lang);
        doc.blank();
    }
    for l in a.text.trim().lines() {
        doc.line(format!("> {l}").trim_end());
    }
    doc.blank();
}

/// Snippet lines as `<mark><line no> | <content>`; `>` marks commented lines.
fn render_snippet(doc: &mut Doc, snippet: &Snippet, lang: &str) {
    let last = snippet.first_line as usize + snippet.lines.len().saturating_sub(1);
    let width = last.to_string().len();
    let (from, to) = snippet.marked;
    let body: Vec<String> = snippet
        .lines
        .iter()
        .enumerate()
        .map(|(i, content)| {
            let n = snippet.first_line + i as u32;
            let mark = if (from..=to).contains(&n) { '>' } else { ' ' };
            format!("{mark}{n:>width$} | {content}")
        })
        .collect();
    doc.fenced(lang, &body);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fence_outgrows_backticks_in_content() {
        assert_eq!(fence_for(["plain"].into_iter()), "```");
        assert_eq!(fence_for(["let s = \"```\";"].into_iter()), "````");
        assert_eq!(fence_for(["`a` ``b``"].into_iter()), "```");
    }

    #[test]
    fn code_span_outgrows_backticks_in_paths() {
        assert_eq!(code_span("src/a.rs"), "`src/a.rs`");
        assert_eq!(code_span("a`b.rs"), "``a`b.rs``");
        assert_eq!(code_span("x``y"), "```x``y```");
        assert_eq!(code_span("`tick.rs"), "`` `tick.rs ``");
    }
}
