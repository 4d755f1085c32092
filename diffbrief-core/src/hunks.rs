//! Groups an edit script into hunks padded with unchanged context.

use crate::types::{DiffLine, DiffLineKind, EditOp, Hunk};

/// Builds the hunk list for an edit script.
///
/// Every non-`Equal` op gets a window of `context_lines` ops on each side,
/// clipped to the script. Windows that overlap or touch are merged: changes
/// with at most `2 * context_lines` unchanged lines between them share a hunk,
/// so neighbouring hunks are at least `2 * context_lines + 1` lines apart.
///
/// Returns an empty list when the script contains no changes.
pub fn build_hunks(ops: &[EditOp<'_>], context_lines: usize) -> Vec<Hunk> {
    let ranges = merged_windows(ops, context_lines);
    if ranges.is_empty() {
        return Vec::new();
    }

    // 1-based (old, new) line numbers of the next line each op would produce.
    let mut positions = Vec::with_capacity(ops.len());
    let (mut old_no, mut new_no) = (1u32, 1u32);
    for op in ops {
        positions.push((old_no, new_no));
        match op {
            EditOp::Equal { .. } => {
                old_no += 1;
                new_no += 1;
            }
            EditOp::Delete { .. } => old_no += 1,
            EditOp::Insert { .. } => new_no += 1,
        }
    }

    ranges
        .into_iter()
        .map(|(start, end)| {
            let (old_start, new_start) = positions[start];
            let lines: Vec<DiffLine> = ops[start..=end]
                .iter()
                .zip(&positions[start..=end])
                .map(|(op, &(old_no, new_no))| to_diff_line(op, old_no, new_no))
                .collect();
            let old_count = lines.iter().filter(|l| l.old_lineno.is_some()).count() as u32;
            let new_count = lines.iter().filter(|l| l.new_lineno.is_some()).count() as u32;
            Hunk { old_start, old_count, new_start, new_count, lines }
        })
        .collect()
}

/// Merges the padded windows around every changed op into inclusive
/// `(start, end)` op-index ranges.
fn merged_windows(ops: &[EditOp<'_>], context_lines: usize) -> Vec<(usize, usize)> {
    let last = match ops.len().checked_sub(1) {
        Some(last) => last,
        None => return Vec::new(),
    };

    let mut ranges: Vec<(usize, usize)> = Vec::new();
    for (idx, _) in ops.iter().enumerate().filter(|(_, op)| !op.is_equal()) {
        let start = idx.saturating_sub(context_lines);
        let end = idx.saturating_add(context_lines).min(last);
        match ranges.last_mut() {
            Some(current) if start <= current.1 + 1 => current.1 = current.1.max(end),
            _ => ranges.push((start, end)),
        }
    }
    ranges
}

fn to_diff_line(op: &EditOp<'_>, old_no: u32, new_no: u32) -> DiffLine {
    let (kind, old_lineno, new_lineno) = match op {
        EditOp::Equal { .. } => (DiffLineKind::Context, Some(old_no), Some(new_no)),
        EditOp::Delete { .. } => (DiffLineKind::Removed, Some(old_no), None),
        EditOp::Insert { .. } => (DiffLineKind::Added, None, Some(new_no)),
    };
    DiffLine { kind, content: op.content().to_owned(), old_lineno, new_lineno }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::align;

    fn kinds(hunk: &Hunk) -> Vec<(DiffLineKind, &str)> {
        hunk.lines.iter().map(|l| (l.kind, l.content.as_str())).collect()
    }

    #[test]
    fn single_change_yields_one_padded_hunk() {
        let ops = align(&["a", "b", "c"], &["a", "x", "c"]);
        let hunks = build_hunks(&ops, 3);
        assert_eq!(hunks.len(), 1);
        let h = &hunks[0];
        assert_eq!((h.old_start, h.old_count, h.new_start, h.new_count), (1, 3, 1, 3));
        assert_eq!(
            kinds(h),
            vec![
                (DiffLineKind::Context, "a"),
                (DiffLineKind::Removed, "b"),
                (DiffLineKind::Added, "x"),
                (DiffLineKind::Context, "c"),
            ]
        );
        assert_eq!(h.header(), "@@ -1,3 +1,3 @@");
    }

    #[test]
    fn distant_changes_stay_separate_and_close_ones_merge() {
        let old: Vec<String> = (1..=20).map(|n| format!("line {n}")).collect();
        let old: Vec<&str> = old.iter().map(String::as_str).collect();

        let mut far = old.clone();
        far[1] = "changed 2";
        far[18] = "changed 19";
        let hunks = build_hunks(&align(&old, &far), 3);
        assert_eq!(hunks.len(), 2);
        assert_eq!((hunks[0].old_start, hunks[0].old_count), (1, 5));
        assert_eq!((hunks[1].old_start, hunks[1].old_count), (16, 5));

        // Six unchanged lines between the changes: windows of 3 touch.
        let mut near = old.clone();
        near[4] = "changed 5";
        near[11] = "changed 12";
        let hunks = build_hunks(&align(&old, &near), 3);
        assert_eq!(hunks.len(), 1);
        assert_eq!((hunks[0].old_start, hunks[0].old_count), (2, 14));

        // Seven unchanged lines keep them apart.
        let mut apart = old.clone();
        apart[4] = "changed 5";
        apart[12] = "changed 13";
        assert_eq!(build_hunks(&align(&old, &apart), 3).len(), 2);
    }

    #[test]
    fn line_numbers_track_each_side() {
        let ops = align(&["a", "b", "c", "d"], &["a", "c", "c2", "d"]);
        let hunks = build_hunks(&ops, 0);
        let numbered: Vec<_> = hunks
            .iter()
            .flat_map(|h| h.lines.iter().map(|l| (l.kind, l.old_lineno, l.new_lineno)))
            .collect();
        assert_eq!(
            numbered,
            vec![
                (DiffLineKind::Removed, Some(2), None),
                (DiffLineKind::Added, None, Some(3)),
            ]
        );
        assert_eq!((hunks[0].old_start, hunks[0].new_start), (2, 2));
        assert_eq!((hunks[1].old_start, hunks[1].new_start), (4, 3));
    }

    #[test]
    fn no_changes_means_no_hunks() {
        let ops = align(&["a", "b"], &["a", "b"]);
        assert!(build_hunks(&ops, 3).is_empty());
        assert!(build_hunks(&[], 3).is_empty());
    }
}
