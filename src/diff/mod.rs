// Diff previews for dry runs

use similar::{ChangeTag, TextDiff};
use std::path::Path;

/// Render a unified diff between the current and corrected content
pub fn unified_diff(old: &str, new: &str, path: &Path) -> String {
    let name = path.display().to_string();
    TextDiff::from_lines(old, new)
        .unified_diff()
        .context_radius(3)
        .header(&format!("a/{}", name), &format!("b/{}", name))
        .to_string()
}

/// Count inserted and deleted lines
pub fn change_counts(old: &str, new: &str) -> (usize, usize) {
    let diff = TextDiff::from_lines(old, new);
    let mut inserted = 0;
    let mut deleted = 0;

    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Insert => inserted += 1,
            ChangeTag::Delete => deleted += 1,
            ChangeTag::Equal => {}
        }
    }

    (inserted, deleted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unified_diff_shows_reindent() {
        let old = "class A {\nrun() {\n}\n}\n";
        let new = "class A {\n    run() {\n    }\n}\n";

        let diff = unified_diff(old, new, Path::new("a.js"));
        assert!(diff.contains("--- a/a.js"));
        assert!(diff.contains("+++ b/a.js"));
        assert!(diff.contains("-run() {"));
        assert!(diff.contains("+    run() {"));
        assert_eq!(change_counts(old, new), (2, 2));
    }

    #[test]
    fn test_identical_content_has_no_changes() {
        assert_eq!(change_counts("a\nb\n", "a\nb\n"), (0, 0));
        assert!(unified_diff("a\n", "a\n", Path::new("a.js")).is_empty());
    }
}
