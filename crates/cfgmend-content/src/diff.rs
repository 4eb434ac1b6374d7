//! Line diffs between an input document and its patched form.

use similar::{ChangeTag, TextDiff};

/// Line counts and similarity of a patch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChangeSummary {
    pub added: usize,
    pub removed: usize,
    /// Similarity ratio (0.0 to 1.0)
    pub similarity: f32,
}

impl ChangeSummary {
    pub fn compute(old: &str, new: &str) -> Self {
        if old == new {
            return Self {
                added: 0,
                removed: 0,
                similarity: 1.0,
            };
        }

        let diff = TextDiff::from_lines(old, new);
        let (mut added, mut removed) = (0, 0);
        for change in diff.iter_all_changes() {
            match change.tag() {
                ChangeTag::Insert => added += 1,
                ChangeTag::Delete => removed += 1,
                ChangeTag::Equal => {}
            }
        }

        Self {
            added,
            removed,
            similarity: diff.ratio(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added == 0 && self.removed == 0
    }
}

/// Unified diff from `old` to `new` with `context` lines around each hunk.
/// Empty when the texts are identical.
pub fn unified_diff(old: &str, new: &str, context: usize) -> String {
    if old == new {
        return String::new();
    }
    TextDiff::from_lines(old, new)
        .unified_diff()
        .context_radius(context)
        .header("current", "patched")
        .to_string()
}
