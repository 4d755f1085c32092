//! Line alignment via a longest-common-subsequence table.
//!
//! The backtrack tie-break (consume the new sequence first when both
//! directions keep the same LCS length) fixes where removed and added lines
//! land relative to each other. Exported documents depend on that placement,
//! so it must not change.

use crate::types::EditOp;

/// Computes the edit script turning `old` into `new`.
///
/// Classic O(m·n) dynamic programming over exact line equality. Replaying the
/// `Equal` and `Delete` ops in order yields `old`; replaying `Equal` and
/// `Insert` yields `new`.
///
/// Callers guard against huge inputs with [`exceeds_ceiling`] before calling
/// this; when either side is empty no table is built at all.
pub fn align<'a>(old: &[&'a str], new: &[&'a str]) -> Vec<EditOp<'a>> {
    if old.is_empty() {
        return new
            .iter()
            .enumerate()
            .map(|(new_index, &content)| EditOp::Insert { new_index, content })
            .collect();
    }
    if new.is_empty() {
        return old
            .iter()
            .enumerate()
            .map(|(old_index, &content)| EditOp::Delete { old_index, content })
            .collect();
    }

    let table = LcsTable::build(old, new);
    let mut ops = Vec::with_capacity(old.len().max(new.len()));
    let (mut i, mut j) = (old.len(), new.len());

    while i > 0 || j > 0 {
        if i > 0 && j > 0 && old[i - 1] == new[j - 1] {
            ops.push(EditOp::Equal { old_index: i - 1, new_index: j - 1, content: old[i - 1] });
            i -= 1;
            j -= 1;
        } else if j > 0 && (i == 0 || table.get(i, j - 1) >= table.get(i - 1, j)) {
            ops.push(EditOp::Insert { new_index: j - 1, content: new[j - 1] });
            j -= 1;
        } else {
            ops.push(EditOp::Delete { old_index: i - 1, content: old[i - 1] });
            i -= 1;
        }
    }

    ops.reverse();
    ops
}

/// Returns true when aligning `old_len` against `new_len` lines would need a
/// table larger than `max_lines` allows.
///
/// An empty side never exceeds the ceiling: its edit script is built without a
/// table.
pub fn exceeds_ceiling(old_len: usize, new_len: usize, max_lines: usize) -> bool {
    old_len > 0 && new_len > 0 && old_len.max(new_len) > max_lines
}

/// Counts `(added, removed)` lines in an edit script.
pub fn count_changes(ops: &[EditOp<'_>]) -> (usize, usize) {
    ops.iter().fold((0, 0), |(added, removed), op| match op {
        EditOp::Insert { .. } => (added + 1, removed),
        EditOp::Delete { .. } => (added, removed + 1),
        EditOp::Equal { .. } => (added, removed),
    })
}

/// Row-major `(m + 1) × (n + 1)` table of LCS lengths of prefixes.
///
/// Owned by a single `align` call; nothing is shared between calls.
struct LcsTable {
    cols: usize,
    cells: Vec<u32>,
}

impl LcsTable {
    fn build(old: &[&str], new: &[&str]) -> Self {
        let cols = new.len() + 1;
        let mut cells = vec![0u32; (old.len() + 1) * cols];
        for i in 1..=old.len() {
            for j in 1..=new.len() {
                cells[i * cols + j] = if old[i - 1] == new[j - 1] {
                    cells[(i - 1) * cols + (j - 1)] + 1
                } else {
                    cells[(i - 1) * cols + j].max(cells[i * cols + (j - 1)])
                };
            }
        }
        LcsTable { cols, cells }
    }

    fn get(&self, i: usize, j: usize) -> u32 {
        self.cells[i * self.cols + j]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_substitution_places_removal_before_addition() {
        let ops = align(&["a", "b", "c"], &["a", "x", "c"]);
        assert_eq!(
            ops,
            vec![
                EditOp::Equal { old_index: 0, new_index: 0, content: "a" },
                EditOp::Delete { old_index: 1, content: "b" },
                EditOp::Insert { new_index: 1, content: "x" },
                EditOp::Equal { old_index: 2, new_index: 2, content: "c" },
            ]
        );
    }

    #[test]
    fn duplicate_line_insert_lands_before_the_match() {
        // Backtracking matches the trailing "a" first, so the extra copy is
        // reported as inserted ahead of it.
        let ops = align(&["a"], &["a", "a"]);
        assert_eq!(
            ops,
            vec![
                EditOp::Insert { new_index: 0, content: "a" },
                EditOp::Equal { old_index: 0, new_index: 1, content: "a" },
            ]
        );
    }

    #[test]
    fn trailing_whitespace_is_a_change() {
        let ops = align(&["fn main() {"], &["fn main() { "]);
        assert_eq!(count_changes(&ops), (1, 1));
    }

    #[test]
    fn empty_sides_need_no_table() {
        assert_eq!(count_changes(&align(&[], &["x", "y"])), (2, 0));
        assert_eq!(count_changes(&align(&["x", "y"], &[])), (0, 2));
        assert!(align(&[], &[]).is_empty());
    }

    #[test]
    fn ceiling_ignores_one_sided_changes() {
        assert!(!exceeds_ceiling(0, 10_000, 100));
        assert!(!exceeds_ceiling(100, 100, 100));
        assert!(exceeds_ceiling(101, 5, 100));
    }
}
