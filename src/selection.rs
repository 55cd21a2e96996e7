use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

static FOLD_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\[.\]\s*(\d+)\.").unwrap());

const FOLD_END: &str = "}}}";

/// Which issues of the current review the user has ticked.
///
/// Issue numbers are 1-based, matching the rendered fold headers. Toggling a
/// number outside `1..=issue_count` is not rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    selected: BTreeSet<usize>,
    issue_count: usize,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new review with `issue_count` issues and nothing selected.
    pub fn init(&mut self, issue_count: usize) {
        self.selected.clear();
        self.issue_count = issue_count;
    }

    pub fn reset(&mut self) {
        self.selected.clear();
        self.issue_count = 0;
    }

    /// Flip `issue` and return whether it is now selected.
    pub fn toggle(&mut self, issue: usize) -> bool {
        if self.selected.remove(&issue) {
            false
        } else {
            self.selected.insert(issue);
            true
        }
    }

    pub fn select_all(&mut self) -> usize {
        self.selected = (1..=self.issue_count).collect();
        self.issue_count
    }

    /// Clear the selection, returning how many were selected.
    pub fn deselect_all(&mut self) -> usize {
        let count = self.selected.len();
        self.selected.clear();
        count
    }

    pub fn is_selected(&self, issue: usize) -> bool {
        self.selected.contains(&issue)
    }

    /// Selected issue numbers in ascending order.
    pub fn selected(&self) -> Vec<usize> {
        self.selected.iter().copied().collect()
    }

    pub fn issue_count(&self) -> usize {
        self.issue_count
    }
}

/// Find the issue whose fold contains `cursor` in a rendered review buffer.
///
/// Walks upward from the cursor to the nearest `[ ] N.` header. Crossing a
/// `}}}` above the cursor means the cursor sits between folds. Returns 0 when
/// nothing is found.
pub fn find_issue_at_line<S: AsRef<str>>(lines: &[S], cursor: usize) -> usize {
    if cursor >= lines.len() {
        return 0;
    }

    for idx in (0..=cursor).rev() {
        let line = lines[idx].as_ref();
        if let Some(caps) = FOLD_HEADER.captures(line) {
            return caps[1].parse().unwrap_or(0);
        }
        if idx < cursor && line.contains(FOLD_END) {
            break;
        }
    }

    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_sets_count_and_clears() {
        let mut sel = Selection::new();
        sel.init(3);
        sel.toggle(2);
        sel.init(5);
        assert_eq!(sel.issue_count(), 5);
        assert!(sel.selected().is_empty());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut sel = Selection::new();
        sel.init(5);
        sel.toggle(1);
        sel.reset();
        assert_eq!(sel.issue_count(), 0);
        assert!(sel.selected().is_empty());
    }

    #[test]
    fn test_toggle_flips() {
        let mut sel = Selection::new();
        sel.init(3);
        assert!(sel.toggle(1));
        assert!(sel.is_selected(1));
        assert!(!sel.toggle(1));
        assert!(!sel.is_selected(1));
    }

    #[test]
    fn test_select_all_then_selected() {
        let mut sel = Selection::new();
        sel.init(4);
        sel.toggle(2);
        assert_eq!(sel.select_all(), 4);
        assert_eq!(sel.selected(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_select_all_empty_review() {
        let mut sel = Selection::new();
        assert_eq!(sel.select_all(), 0);
        assert!(sel.selected().is_empty());
    }

    #[test]
    fn test_deselect_all_returns_prior_size() {
        let mut sel = Selection::new();
        sel.init(3);
        sel.toggle(1);
        sel.toggle(3);
        assert_eq!(sel.deselect_all(), 2);
        assert!(sel.selected().is_empty());
        assert_eq!(sel.deselect_all(), 0);
    }

    #[test]
    fn test_selected_is_sorted_subset() {
        let mut sel = Selection::new();
        sel.init(6);
        let ops: &[usize] = &[5, 2, 6, 2, 1, 4, 5, 3];
        for &n in ops {
            sel.toggle(n);
            let selected = sel.selected();
            assert!(selected.windows(2).all(|w| w[0] < w[1]));
            assert!(selected.iter().all(|n| (1..=6).contains(n)));
        }
        assert_eq!(sel.selected(), vec![1, 3, 4, 6]);
    }

    #[test]
    fn test_find_issue_on_header_and_body() {
        let lines = [
            "  [ ] 1. [bug] Some bug {{{",
            "    details",
            "  }}}",
        ];
        assert_eq!(find_issue_at_line(&lines, 0), 1);
        assert_eq!(find_issue_at_line(&lines, 1), 1);
        assert_eq!(find_issue_at_line(&lines, 2), 1);
    }

    #[test]
    fn test_find_issue_selected_checkbox() {
        let lines = ["  [x] 12. [issue] Thing {{{", "    body"];
        assert_eq!(find_issue_at_line(&lines, 1), 12);
    }

    #[test]
    fn test_find_issue_between_folds() {
        let lines = [
            "  [ ] 1. [bug] First {{{",
            "    body",
            "  }}}",
            "",
            "  [ ] 2. [bug] Second {{{",
        ];
        assert_eq!(find_issue_at_line(&lines, 3), 0);
        assert_eq!(find_issue_at_line(&lines, 4), 2);
    }

    #[test]
    fn test_find_issue_not_found() {
        let lines = ["  header", "  footer"];
        assert_eq!(find_issue_at_line(&lines, 0), 0);
        assert_eq!(find_issue_at_line(&lines, 1), 0);
    }

    #[test]
    fn test_find_issue_out_of_range_cursor() {
        let lines = ["  [ ] 1. x {{{"];
        assert_eq!(find_issue_at_line(&lines, 5), 0);
        let empty: [&str; 0] = [];
        assert_eq!(find_issue_at_line(&empty, 0), 0);
    }
}
