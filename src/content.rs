//! Buffer content for the editor: help, loading, results.
//!
//! Everything here is a pure function of its arguments so the editor can
//! re-render at will.

use crate::types::{ReviewIssue, ReviewResult};

const TITLE: &str = "  \u{1F430} coderabbit";

/// Rabbit working through a plate of vegetables, one entry per spinner tick.
const ANIMATION_FRAMES: [[&str; 3]; 24] = [
    [r"    (\__/)", "    (='.'=)    🥕🥬🥦🫑", r#"    (")_(")"#],
    [r"    (\__/)", "    (=°o°=)   🥕🥬🥦🫑  *crunch*", r#"    (")_(")"#],
    [r"    (\__/)", "    (=^.^=)    🥕🥬🥦", r#"    (")_(")"#],
    [r"    (\__/)", "    (=°o°=)   🥕🥬🥦  *munch*", r#"    (")_(")"#],
    [r"    (\__/)", "    (=~.~=)    🥕🥬🥦", r#"    (")_(")"#],
    [r"    (\__/)", "    (=°o°=)   🥕🥬  *chomp*", r#"    (")_(")"#],
    [r"    (\__/)", "    (=^.^=)    🥕🥬🫑", r#"    (")_(")"#],
    [r"    (\__/)", "    (=°o°=)   🥕🥬🫑  *crunch*", r#"    (")_(")"#],
    [r"    (\__/)", "    (=~.~=)    🥕🥬", r#"    (")_(")"#],
    [r"    (\__/)", "    (='.'=)    🥦🫑🥕", r#"    (")_(")"#],
    [r"    (\__/)", "    (=°o°=)   🥦🫑🥕  *munch*", r#"    (")_(")"#],
    [r"    (\__/)", "    (=^.^=)    🥦🫑", r#"    (")_(")"#],
    [r"    (\__/)", "    (=~.~=)    🥬🥦🫑🥕", r#"    (")_(")"#],
    [r"    (\__/)", "    (=°o°=)   🥬🥦🫑  *chomp*", r#"    (")_(")"#],
    [r"    (\__/)", "    (=^.^=)    🥬🥦", r#"    (")_(")"#],
    [r"    (\__/)", "    (=°o°=)   🥬🥦  *crunch*", r#"    (")_(")"#],
    [r"    (\__/)", "    (=~.~=)    🥕🫑", r#"    (")_(")"#],
    [r"    (\__/)", "    (=°o°=)   🥕🫑  *munch*", r#"    (")_(")"#],
    [r"    (\__/)", "    (=^.^=)    🥕🥬🥦", r#"    (")_(")"#],
    [r"    (\__/)", "    (=°o°=)   🥬🥦  *chomp*", r#"    (")_(")"#],
    [r"    (\__/)", "    (=^.^=)    🥕🫑", r#"    (")_(")"#],
    [r"    (\__/)", "    (=°o°=)   🥕  *crunch*", r#"    (")_(")"#],
    [r"    (\__/)", "    (=^.^=)    🫑", r#"    (")_(")"#],
    [r"    (\__/)", "    (=~.~=)      *yum!*", r#"    (")_(")"#],
];

/// Rabbit pacing under a speech bubble: (indent, face, trailing dots).
const NO_WORK_FRAMES: [(usize, &str, &str); 8] = [
    (6, "(o.o )", "."),
    (7, "(o.o )", ".."),
    (8, "( o.o)", "..."),
    (9, "( o.o)", "...."),
    (9, "( -.-)", "...."),
    (8, "(o.o )", "..."),
    (7, "(o.o )", ".."),
    (6, "(-.- )", "."),
];

/// Command table for the help screen, one slice per column.
const HELP_COMMANDS: [&[(&str, &str)]; 3] = [
    &[
        ("ru", "Review Uncommitted"),
        ("rc", "Review Committed"),
        ("ra", "Review All"),
    ],
    &[],
    &[],
];

const NO_FILES_MARKERS: &[&str] = &[
    "no files",
    "no changes",
    "nothing to review",
    "no diff",
    "failed to start review",
];

pub fn header() -> Vec<String> {
    vec![TITLE.to_string(), String::new()]
}

/// `"MMmin SSsec"`, both fields zero-padded.
pub fn format_elapsed_time(secs: u64) -> String {
    format!("{:02}min {:02}sec", secs / 60, secs % 60)
}

/// Render a review result. `selected` holds the 1-based issue numbers whose
/// checkbox is ticked.
pub fn format_review_output(
    result: &ReviewResult,
    elapsed_secs: u64,
    selected: &[usize],
) -> Vec<String> {
    let mut content = header();

    if !result.success {
        content.push("  \u{26A0}\u{FE0F}  Error running coderabbit:".to_string());
        content.push(String::new());
        for line in result.error_message.split('\n') {
            content.push(format!("    {line}"));
        }
    } else if result.issues.is_empty() {
        content.push("  \u{2713} No issues found!".to_string());
    } else {
        content.push(format!(
            "  Found {} issue(s) in {}",
            result.issues.len(),
            format_elapsed_time(elapsed_secs)
        ));
        for (i, issue) in result.issues.iter().enumerate() {
            let number = i + 1;
            content.push(String::new());
            content.push(fold_header(issue, number, selected.contains(&number)));
            for line in &issue.lines {
                content.push(format!("    {line}"));
            }
            content.push("  }}}".to_string());
        }
    }

    content.push(String::new());
    if result.success && !result.issues.is_empty() {
        content.push(
            "  [c] close  |  [Space] toggle  |  [a] all  |  [n] none  |  [f] fix selected".into(),
        );
    } else {
        content.push("  [c] close".to_string());
    }

    content
}

fn fold_header(issue: &ReviewIssue, number: usize, checked: bool) -> String {
    let checkbox = if checked { 'x' } else { ' ' };
    let issue_type = issue.issue_type.as_deref().unwrap_or("issue");
    let summary = if issue.summary.is_empty() {
        issue
            .lines
            .iter()
            .map(|l| l.trim())
            .find(|l| !l.is_empty())
            .unwrap_or("")
    } else {
        issue.summary.as_str()
    };

    let mut line = format!("  [{checkbox}] {number}. [{issue_type}] {summary}");
    if let Some(ref path) = issue.file_path {
        match issue.line_range {
            Some(ref range) => line.push_str(&format!(" ({path}:{range})")),
            None => line.push_str(&format!(" ({path})")),
        }
    }
    line.push_str(" {{{");
    line
}

pub fn format_loading_message() -> Vec<String> {
    let mut content = header();
    content.push("  Running coderabbit...".to_string());
    content.push(String::new());
    content.push("  [c] cancel".to_string());
    content
}

pub fn format_cancelled_message() -> Vec<String> {
    let mut content = header();
    content.push("  \u{2717} Review cancelled".to_string());
    content.push(String::new());
    content.push("  Press [c] to close".to_string());
    content
}

pub fn animation_frame_count() -> usize {
    ANIMATION_FRAMES.len()
}

/// Loading screen for spinner tick `frame_number`; wraps past the last frame.
pub fn get_animation_frame(frame_number: usize, elapsed_secs: u64) -> Vec<String> {
    let rabbit = &ANIMATION_FRAMES[frame_number % ANIMATION_FRAMES.len()];

    let mut content = header();
    content.push("  Coderabbit review in progress!".to_string());
    content.push(String::new());
    content.push("  This may take 30-90+ sec depending on the size of the review.".to_string());
    content.push("  Your results will be displayed shortly...".to_string());
    content.push(String::new());
    content.extend(rabbit.iter().map(|l| l.to_string()));
    content.push(String::new());
    content.push(format!("  Elapsed: {}", format_elapsed_time(elapsed_secs)));
    content.push(String::new());
    content.push("  [c] cancel  |  [g] play a game while you wait".to_string());
    content
}

pub fn no_work_frame_count() -> usize {
    NO_WORK_FRAMES.len()
}

/// Shown when the CLI reports there is nothing to review.
pub fn get_no_work_animation_frame(frame_number: usize) -> Vec<String> {
    let (indent, face, dots) = NO_WORK_FRAMES[frame_number % NO_WORK_FRAMES.len()];
    let pad = " ".repeat(indent);
    let bubble_rule = "─".repeat(26);

    let mut content = header();
    content.push(format!("  ╭{bubble_rule}╮"));
    content.push(format!("  │ {:<24} │", "No changes to review."));
    content.push(format!("  │ {:<24} │", format!("Looking for work{dots}")));
    content.push(format!("  ╰{bubble_rule}╯"));
    content.push(format!("{pad}\\"));
    content.push(format!("{pad} (\\__/)"));
    content.push(format!("{pad} {face}"));
    content.push(format!("{pad} (\")_(\")"));
    content.push(String::new());
    content.push("  Press [c] to close".to_string());
    content
}

/// Whether a CLI error just means there was nothing to review.
pub fn is_no_files_error(message: &str) -> bool {
    if message.is_empty() {
        return false;
    }
    let lower = message.to_lowercase();
    NO_FILES_MARKERS.iter().any(|m| lower.contains(m))
}

/// Help screen laid out in three columns across `width`.
pub fn render_help(width: usize) -> Vec<String> {
    let col_width = width.saturating_sub(4) / 3;
    let rows = HELP_COMMANDS.iter().map(|c| c.len()).max().unwrap_or(0).max(1);

    let mut content = vec!["  \u{1F430} vim4rabbit Help".to_string(), String::new()];

    for row in 0..rows {
        let mut line = String::from("  ");
        for (col_idx, column) in HELP_COMMANDS.iter().enumerate() {
            let cell = column
                .get(row)
                .map(|(key, desc)| format!("[{key}] {desc}"))
                .unwrap_or_default();
            let is_last = col_idx + 1 == HELP_COMMANDS.len();
            if is_last {
                line.push_str(&cell);
            } else {
                line.push_str(&format!("{cell:<col_width$}"));
            }
        }
        content.push(line);
    }

    let close = "[c] Close";
    let padding = width.saturating_sub(close.len() + 4);
    content.push(format!("{}{close}  ", " ".repeat(padding)));

    content
}
