//! Assigns annotations to the hunks they point into.
//!
//! Anchoring works purely on line numbers: an annotation belongs to the hunk
//! whose range on the annotation's side contains its start line. Anything
//! that lands outside every hunk is reported as uncovered so the export can
//! still show it with a snippet cut from the full file.

use crate::types::{Annotation, Hunk, Side};

/// Result of anchoring a file's annotations against its hunks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placement {
    /// `placed[i]` holds the annotations anchored to hunk `i`.
    pub placed: Vec<Vec<Annotation>>,
    /// Annotations outside every hunk.
    pub uncovered: Vec<Annotation>,
}

/// Anchors every annotation to at most one hunk.
///
/// Each annotation ends up exactly once in the result, either in one of the
/// `placed` lists or in `uncovered`, clamped to a valid range. All lists are
/// sorted by start line; annotations sharing a start line keep input order.
pub fn place_annotations(hunks: &[Hunk], annotations: &[Annotation]) -> Placement {
    let mut placement = Placement { placed: vec![Vec::new(); hunks.len()], uncovered: Vec::new() };

    for annotation in annotations.iter().map(Annotation::clamped) {
        let line = annotation.start_line;
        let owner = hunks.iter().position(|h| {
            h.range(annotation.side).is_some_and(|(start, end)| (start..=end).contains(&line))
        });
        match owner {
            Some(idx) => placement.placed[idx].push(annotation),
            None => placement.uncovered.push(annotation),
        }
    }

    for list in &mut placement.placed {
        list.sort_by_key(|a| a.start_line);
    }
    placement.uncovered.sort_by_key(|a| a.start_line);
    placement
}

/// A window of file lines around an annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    /// 1-based number of the first line in `lines`.
    pub first_line: u32,
    pub lines: Vec<String>,
    /// Inclusive range of annotated lines, for highlighting.
    pub marked: (u32, u32),
}

/// Cuts `radius` lines before and after the annotated range out of `lines`.
///
/// Returns `None` when the annotation starts past the end of the file, which
/// happens when a comment outlived the lines it was written against.
pub fn context_snippet(lines: &[&str], annotation: &Annotation, radius: usize) -> Option<Snippet> {
    let annotation = annotation.clamped();
    let start = annotation.start_line as usize;
    if start > lines.len() {
        return None;
    }
    let end = (annotation.end_line as usize).min(lines.len());
    let from = start.saturating_sub(radius).max(1);
    let to = end.saturating_add(radius).min(lines.len());

    Some(Snippet {
        first_line: from as u32,
        lines: lines[from - 1..to].iter().map(|l| (*l).to_owned()).collect(),
        marked: (annotation.start_line, end as u32),
    })
}

/// Whether the commented line no longer reads the way it did when the comment
/// was written.
///
/// Comments recorded without line content are never stale. Leading and
/// trailing whitespace is ignored.
pub fn is_stale(annotation: &Annotation, lines: &[&str]) -> bool {
    let recorded = annotation.line_content.trim();
    if recorded.is_empty() {
        return false;
    }
    let current = (annotation.start_line as usize)
        .checked_sub(1)
        .and_then(|idx| lines.get(idx));
    current.map_or(true, |line| line.trim() != recorded)
}

/// Picks the line sequence an annotation's numbers refer to.
pub fn side_lines<'s, 'a>(side: Side, old: &'s [&'a str], new: &'s [&'a str]) -> &'s [&'a str] {
    match side {
        Side::Old => old,
        Side::New => new,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::align;
    use crate::hunks::build_hunks;

    fn note(id: &str, start: u32, end: u32, side: Side) -> Annotation {
        Annotation {
            id: id.into(),
            start_line: start,
            end_line: end,
            side,
            text: format!("comment {id}"),
            line_content: String::new(),
            line_contents: Vec::new(),
        }
    }

    fn twenty_lines() -> Vec<String> {
        (1..=20).map(|n| format!("line {n}")).collect()
    }

    #[test]
    fn annotations_follow_their_side_into_hunks() {
        let old = twenty_lines();
        let old: Vec<&str> = old.iter().map(String::as_str).collect();
        let mut new = old.clone();
        new.insert(2, "inserted");
        new[17] = "changed";
        let hunks = build_hunks(&align(&old, &new), 1);
        assert_eq!(hunks.len(), 2);

        let annotations = vec![
            note("a", 3, 3, Side::New),
            note("b", 17, 17, Side::Old),
            note("c", 10, 10, Side::New),
            note("d", 2, 4, Side::New),
        ];
        let placement = place_annotations(&hunks, &annotations);

        let ids = |list: &[Annotation]| list.iter().map(|a| a.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&placement.placed[0]), vec!["d", "a"]);
        assert_eq!(ids(&placement.placed[1]), vec!["b"]);
        assert_eq!(ids(&placement.uncovered), vec!["c"]);
    }

    #[test]
    fn every_annotation_is_placed_exactly_once() {
        let old = vec!["a", "b", "c"];
        let new = vec!["a", "x", "c"];
        let hunks = build_hunks(&align(&old, &new), 3);
        let annotations: Vec<_> = (0..6).map(|n| note(&n.to_string(), n, n, Side::New)).collect();
        let placement = place_annotations(&hunks, &annotations);
        let total: usize =
            placement.placed.iter().map(Vec::len).sum::<usize>() + placement.uncovered.len();
        assert_eq!(total, annotations.len());
        // Line 0 clamps to 1, which the hunk covers.
        assert_eq!(placement.placed[0].len(), 4);
        assert_eq!(placement.uncovered.len(), 2);
    }

    #[test]
    fn snippet_takes_two_lines_each_way_and_clips_at_edges() {
        let lines = twenty_lines();
        let lines: Vec<&str> = lines.iter().map(String::as_str).collect();

        let s = context_snippet(&lines, &note("x", 5, 5, Side::New), 2).unwrap();
        assert_eq!(s.first_line, 3);
        assert_eq!(s.lines, vec!["line 3", "line 4", "line 5", "line 6", "line 7"]);
        assert_eq!(s.marked, (5, 5));

        let s = context_snippet(&lines, &note("y", 1, 2, Side::New), 2).unwrap();
        assert_eq!((s.first_line, s.lines.len()), (1, 4));

        let s = context_snippet(&lines, &note("z", 19, 25, Side::New), 2).unwrap();
        assert_eq!((s.first_line, s.lines.len(), s.marked), (17, 4, (19, 20)));

        assert!(context_snippet(&lines, &note("gone", 21, 21, Side::New), 2).is_none());
    }

    #[test]
    fn staleness_compares_trimmed_content() {
        let lines = vec!["let a = 1;", "  let b = 2;"];
        let mut a = note("s", 2, 2, Side::New);
        assert!(!is_stale(&a, &lines));
        a.line_content = "let b = 2;".into();
        assert!(!is_stale(&a, &lines));
        a.line_content = "let b = 3;".into();
        assert!(is_stale(&a, &lines));
        a.start_line = 9;
        assert!(is_stale(&a, &lines));
    }
}
