//! Changed-file set and diff admission control
//!
//! Generation agents have finite input capacity, so the diff is capped at a
//! configured line budget before composition. Truncation is irreversible and
//! flagged with a marker line so the consumer can tell.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Changed files plus the (possibly truncated) unified diff for one MR
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeSet {
    /// Changed file paths, in provider order
    pub files: Vec<String>,
    /// Unified diff text
    pub diff: String,
    /// Whether the diff was cut down to the line budget
    pub truncated: bool,
}

impl ChangeSet {
    /// Build a change set, enforcing the diff line budget
    ///
    /// Keeps the first `max_lines` lines of the diff; if anything was
    /// dropped, appends one marker line naming the original and retained
    /// line counts.
    pub fn new(files: Vec<String>, diff: String, max_lines: usize) -> Self {
        let (diff, truncated) = truncate_diff(diff, max_lines);
        Self {
            files,
            diff,
            truncated,
        }
    }
}

/// Cap `diff` at `max_lines` lines, appending a truncation marker when cut
pub fn truncate_diff(diff: String, max_lines: usize) -> (String, bool) {
    let total = diff.lines().count();
    if total <= max_lines {
        return (diff, false);
    }

    warn!(total, kept = max_lines, "diff exceeds line budget, truncating");

    let mut kept: Vec<&str> = diff.lines().take(max_lines).collect();
    let marker = format!(
        "... [diff truncated: kept {} of {} lines]",
        max_lines, total
    );
    kept.push(&marker);
    (kept.join("\n"), true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_diff(n: usize) -> String {
        (1..=n).map(|i| format!("+line {}", i)).collect::<Vec<_>>().join("\n")
    }

    #[test]
    fn test_short_diff_untouched() {
        let diff = numbered_diff(10);
        let (out, truncated) = truncate_diff(diff.clone(), 5000);
        assert_eq!(out, diff);
        assert!(!truncated);
    }

    #[test]
    fn test_diff_at_budget_untouched() {
        let diff = numbered_diff(100);
        let (out, truncated) = truncate_diff(diff.clone(), 100);
        assert_eq!(out, diff);
        assert!(!truncated);
    }

    #[test]
    fn test_truncation_keeps_exactly_budget_plus_marker() {
        let (out, truncated) = truncate_diff(numbered_diff(120), 100);
        assert!(truncated);

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 101);
        assert_eq!(lines[0], "+line 1");
        assert_eq!(lines[99], "+line 100");
        assert_eq!(lines[100], "... [diff truncated: kept 100 of 120 lines]");
    }

    #[test]
    fn test_marker_cites_both_counts() {
        let (out, _) = truncate_diff(numbered_diff(5001), 5000);
        assert!(out.ends_with("[diff truncated: kept 5000 of 5001 lines]"));
    }

    #[test]
    fn test_changeset_carries_truncation_flag() {
        let set = ChangeSet::new(vec!["src/main.rs".to_string()], numbered_diff(10), 3);
        assert!(set.truncated);
        assert_eq!(set.diff.lines().count(), 4);

        let set = ChangeSet::new(vec![], numbered_diff(3), 3);
        assert!(!set.truncated);
    }
}
