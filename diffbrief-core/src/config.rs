use serde::Deserialize;

/// Tunables for building a review context.
///
/// Deserializes from the `[engine]` table of the config file; any field left
/// out keeps its default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Unchanged lines shown around each change in a hunk. Default: 3.
    pub context_lines: usize,
    /// Largest side, in lines, the aligner will build a table for when both
    /// sides are non-empty. Larger files export as "diff too large". Default: 3000.
    pub max_lines: usize,
    /// Lines shown before and after a comment that is rendered outside a hunk.
    /// Default: 2.
    pub comment_context: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { context_lines: 3, max_lines: 3000, comment_context: 2 }
    }
}
