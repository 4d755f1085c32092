//! Change statistics and the incremental-vs-rewrite verdict.

use crate::align::{align, count_changes};
use crate::text::split_lines;
use crate::types::{ChangeStats, EditOp};

/// Share of changed lines above which a change counts as a rewrite.
pub const REWRITE_PERCENT: f64 = 60.0;
/// New/old line-count ratio above which a file "grew enormously".
pub const GROWTH_RATIO: f64 = 3.0;
/// New/old line-count ratio below which a file "shrank enormously".
pub const SHRINK_RATIO: f64 = 0.33;

/// Aligns `old_text` against `new_text` and classifies the result.
pub fn classify(old_text: &str, new_text: &str) -> ChangeStats {
    let old = split_lines(old_text);
    let new = split_lines(new_text);
    stats_from_ops(old.len(), new.len(), &align(&old, &new))
}

/// Computes [`ChangeStats`] from an already computed edit script.
///
/// Tallies come from the `Insert`/`Delete` ops themselves, never from hunk
/// line counts, since hunks clip and merge.
pub fn stats_from_ops(old_line_count: usize, new_line_count: usize, ops: &[EditOp<'_>]) -> ChangeStats {
    let (added_lines, removed_lines) = count_changes(ops);
    let denominator = old_line_count.max(new_line_count).max(1) as f64;
    let changed_percent = (added_lines + removed_lines) as f64 * 100.0 / denominator;

    // Without an old file only the growth branch applies; the ratio is the new
    // line count itself.
    let ratio_trips = if old_line_count == 0 {
        new_line_count as f64 > GROWTH_RATIO
    } else {
        let ratio = new_line_count as f64 / old_line_count as f64;
        ratio > GROWTH_RATIO || ratio < SHRINK_RATIO
    };

    ChangeStats {
        old_line_count,
        new_line_count,
        added_lines,
        removed_lines,
        changed_percent,
        is_major_rewrite: changed_percent > REWRITE_PERCENT || ratio_trips,
    }
}
