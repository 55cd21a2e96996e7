use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::types::{FileLocation, ReviewIssue, TokenUsage};

/// Longest summary shown in a fold header, ellipsis included.
pub const SUMMARY_MAX_CHARS: usize = 60;

static DELIMITER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^={5,}\s*$").unwrap());
static LINE_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+to\s+(\d+)$").unwrap());
static FIRST_INT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());
static PATH_WITH_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+?):(\d+)$").unwrap());
static SEPARATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-=_*~]{3,}$").unwrap());

/// File reference shapes tried in order on every line.
static LOCATION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^\s*([^\s:]+):(\d+):",
        r"File:\s*([^\s:]+):(\d+)",
        r"(?i)\bin\s+(\S+\.\w+)\s+at\s+line\s+(\d+)",
        r"([^\s(]+\.\w+)\s+\(line\s+(\d+)\)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static USAGE_RATIO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d[\d,]*)\s*/\s*(\d[\d,]*)").unwrap());
static USAGE_USED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)tokens?[_\s]*used[:\s]+(\d[\d,]*)").unwrap());
static USAGE_LIMIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)tokens?[_\s]*limit[:\s]+(\d[\d,]*)").unwrap());

/// Status chatter the CLI prints before the first finding.
const PREAMBLE_TERMS: &[&str] = &[
    "starting",
    "running",
    "analyzing",
    "connecting",
    "setting up",
    "preparing",
    "reviewing",
    "review completed",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    File,
    Line,
    Type,
    Comment,
    Prompt,
}

/// Recognised field prefixes. Longer spellings come first.
const FIELDS: &[(&str, Field)] = &[
    ("Prompt for AI Agent:", Field::Prompt),
    ("File:", Field::File),
    ("Line:", Field::Line),
    ("Type:", Field::Type),
    ("Comment:", Field::Comment),
    ("Prompt:", Field::Prompt),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    BeforeFirstIssue,
    InIssue,
}

/// Parse plain review output into issues, one per delimited block.
pub fn parse_review_issues(output: &str) -> Vec<ReviewIssue> {
    split_issue_blocks(output)
        .into_iter()
        .map(build_issue)
        .collect()
}

/// Split raw output on `=====` lines. Each returned block is non-empty and its
/// lines are right-trimmed.
pub fn split_issue_blocks(output: &str) -> Vec<Vec<String>> {
    let mut blocks = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut state = ParseState::BeforeFirstIssue;

    for line in output.split('\n') {
        if DELIMITER.is_match(line) {
            flush(&mut blocks, &mut current);
            state = ParseState::InIssue;
            continue;
        }
        match state {
            ParseState::InIssue => current.push(line.trim_end().to_string()),
            ParseState::BeforeFirstIssue => {
                if line.trim().is_empty() || is_preamble(line) {
                    continue;
                }
                current.push(line.trim_end().to_string());
                state = ParseState::InIssue;
            }
        }
    }
    flush(&mut blocks, &mut current);

    blocks
}

fn flush(blocks: &mut Vec<Vec<String>>, current: &mut Vec<String>) {
    let lines = std::mem::take(current);
    if lines.iter().any(|l| !l.trim().is_empty()) {
        blocks.push(lines);
    }
}

fn is_preamble(line: &str) -> bool {
    let lower = line.to_lowercase();
    PREAMBLE_TERMS.iter().any(|term| lower.contains(term))
}

/// Fields only start at column 0, so indented body text stays body text.
fn match_field(line: &str) -> Option<(Field, &str)> {
    FIELDS.iter().find_map(|(prefix, field)| {
        line.strip_prefix(prefix)
            .map(|rest| (*field, rest.trim()))
    })
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// `"10 to 20"` becomes `"10-20"`; anything else is kept as written.
pub fn normalize_line_range(value: &str) -> String {
    let value = value.trim();
    match LINE_SPAN.captures(value) {
        Some(caps) => format!("{}-{}", &caps[1], &caps[2]),
        None => value.to_string(),
    }
}

#[derive(Debug, Default)]
struct IssueFields {
    file_path: Option<String>,
    file_line: Option<String>,
    line_range: Option<String>,
    issue_type: Option<String>,
    comment: Option<String>,
    prompt: Option<String>,
}

fn extract_fields(lines: &[String]) -> IssueFields {
    let mut fields = IssueFields::default();
    let mut awaiting_comment = false;
    let mut prompt: Option<Vec<String>> = None;

    for line in lines {
        if let Some((field, value)) = match_field(line) {
            if let Some(collected) = prompt.take() {
                fields.prompt = non_empty(&collected.join("\n"));
            }
            awaiting_comment = false;

            match field {
                Field::File => match PATH_WITH_LINE.captures(value) {
                    Some(caps) => {
                        fields.file_path = Some(caps[1].to_string());
                        fields.file_line = Some(caps[2].to_string());
                    }
                    None => fields.file_path = non_empty(value),
                },
                Field::Line => fields.line_range = non_empty(&normalize_line_range(value)),
                Field::Type => fields.issue_type = non_empty(value),
                Field::Comment => {
                    if fields.comment.is_none() {
                        fields.comment = non_empty(value);
                        awaiting_comment = fields.comment.is_none();
                    }
                }
                Field::Prompt => {
                    let mut collected = Vec::new();
                    if !value.is_empty() {
                        collected.push(value.to_string());
                    }
                    prompt = Some(collected);
                }
            }
            continue;
        }

        if line.trim().is_empty() {
            continue;
        }
        if awaiting_comment {
            fields.comment = Some(line.trim().to_string());
            awaiting_comment = false;
        }
        if let Some(ref mut collected) = prompt {
            collected.push(line.clone());
        }
    }

    if let Some(collected) = prompt {
        fields.prompt = non_empty(&collected.join("\n"));
    }
    if fields.line_range.is_none() {
        fields.line_range = fields.file_line.take();
    }

    fields
}

fn build_issue(lines: Vec<String>) -> ReviewIssue {
    let fields = extract_fields(&lines);

    let summary = match fields.comment {
        Some(ref comment) => truncate_summary(comment),
        None => extract_summary(&lines),
    };

    let location = match fields.file_path {
        Some(ref path) => {
            let line = fields
                .line_range
                .as_deref()
                .and_then(|r| FIRST_INT.find(r))
                .and_then(|m| m.as_str().parse().ok());
            Some(FileLocation::new(path.clone(), line))
        }
        None => extract_file_location(&lines),
    };

    ReviewIssue {
        lines,
        file_path: fields.file_path,
        line_range: fields.line_range,
        issue_type: fields.issue_type,
        summary,
        prompt: fields.prompt,
        location,
    }
}

/// Find the first `path:line` style reference in an issue body.
pub fn extract_file_location(lines: &[String]) -> Option<FileLocation> {
    lines.iter().find_map(|line| {
        LOCATION_PATTERNS.iter().find_map(|re| {
            let caps = re.captures(line)?;
            let line_no = caps[2].parse().ok()?;
            Some(FileLocation::new(&caps[1], Some(line_no)))
        })
    })
}

fn is_file_reference(line: &str) -> bool {
    LOCATION_PATTERNS.iter().any(|re| re.is_match(line))
}

/// Pick a one-line summary: the first line that is not a field, a file
/// reference or a separator. Falls back to the first non-field line.
pub fn extract_summary(lines: &[String]) -> String {
    let candidates = || {
        lines
            .iter()
            .filter(|l| !l.trim().is_empty() && match_field(l).is_none())
            .map(|l| l.trim())
    };

    candidates()
        .find(|l| !SEPARATOR.is_match(l) && !is_file_reference(l))
        .or_else(|| candidates().next())
        .map(truncate_summary)
        .unwrap_or_default()
}

pub fn truncate_summary(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() <= SUMMARY_MAX_CHARS {
        return text.to_string();
    }
    let head: String = text.chars().take(SUMMARY_MAX_CHARS - 3).collect();
    format!("{head}...")
}

// --- Token usage ---

/// Parse `usage --json` output. Accepts the handful of shapes the CLI and
/// its config file have used.
pub fn parse_usage_json(text: &str) -> Option<TokenUsage> {
    let data: Value = serde_json::from_str(text.trim()).ok()?;
    let obj = data.as_object()?;

    let (used, limit) = if obj.contains_key("used") && obj.contains_key("limit") {
        (count(&obj["used"])?, count(&obj["limit"])?)
    } else if let Some(usage) = obj.get("usage").and_then(Value::as_object) {
        (
            first_count(usage, &["tokens_used", "used"])?,
            first_count(usage, &["tokens_limit", "limit"])?,
        )
    } else if let Some(plan) = obj.get("plan").and_then(Value::as_object) {
        (
            first_count(plan, &["usage", "used"])?,
            first_count(plan, &["limit"])?,
        )
    } else if obj.contains_key("tokens_used") && obj.contains_key("tokens_limit") {
        (count(&obj["tokens_used"])?, count(&obj["tokens_limit"])?)
    } else {
        (0, 0)
    };

    (limit > 0).then(|| TokenUsage::new(used, limit, "coderabbit"))
}

fn count(value: &Value) -> Option<u64> {
    value.as_u64()
}

/// Value of the first key present, or 0 when none are.
fn first_count(map: &Map<String, Value>, keys: &[&str]) -> Option<u64> {
    match keys.iter().find_map(|k| map.get(*k)) {
        Some(value) => count(value),
        None => Some(0),
    }
}

/// Parse plain `usage` output such as `Used: 12,345 / 100,000 tokens` or
/// `tokens_used: 12345` / `tokens_limit: 100000`.
pub fn parse_usage_plain(text: &str) -> Option<TokenUsage> {
    let mut used = 0;
    let mut limit = 0;

    if let Some(caps) = USAGE_RATIO.captures(text) {
        used = parse_grouped(&caps[1])?;
        limit = parse_grouped(&caps[2])?;
    }

    if limit == 0
        && let (Some(u), Some(l)) = (USAGE_USED.captures(text), USAGE_LIMIT.captures(text))
    {
        used = parse_grouped(&u[1])?;
        limit = parse_grouped(&l[1])?;
    }

    (limit > 0).then(|| TokenUsage::new(used, limit, "coderabbit"))
}

fn parse_grouped(digits: &str) -> Option<u64> {
    digits.replace(',', "").parse().ok()
}

/// JSON first, then plain text.
pub fn parse_usage(json: &str, plain: &str) -> Option<TokenUsage> {
    if !json.is_empty()
        && let Some(usage) = parse_usage_json(json)
    {
        return Some(usage);
    }
    if !plain.is_empty() {
        return parse_usage_plain(plain);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_output() {
        assert!(parse_review_issues("").is_empty());
    }

    #[test]
    fn test_single_issue_no_separator() {
        let issues = parse_review_issues("This is an issue\nWith multiple lines");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].lines, lines(&["This is an issue", "With multiple lines"]));
    }

    #[test]
    fn test_multiple_issues_with_separator() {
        let output = "First issue\n=====\nSecond issue\nline 2\n=====\nThird issue";
        let issues = parse_review_issues(output);
        assert_eq!(issues.len(), 3);
        assert_eq!(issues[0].lines, lines(&["First issue"]));
        assert_eq!(issues[1].lines, lines(&["Second issue", "line 2"]));
        assert_eq!(issues[2].lines, lines(&["Third issue"]));
    }

    #[test]
    fn test_blocks_match_input_lines_right_trimmed() {
        let blocks = [
            vec!["alpha  ", "  indented\t"],
            vec!["beta"],
            vec!["gamma", "", "delta   "],
        ];
        let output = blocks
            .iter()
            .map(|b| b.join("\n"))
            .collect::<Vec<_>>()
            .join("\n==========\n");
        let issues = parse_review_issues(&output);
        assert_eq!(issues.len(), blocks.len());
        for (issue, block) in issues.iter().zip(&blocks) {
            let expected: Vec<String> = block.iter().map(|l| l.trim_end().to_string()).collect();
            assert_eq!(issue.lines, expected);
        }
    }

    #[test]
    fn test_trailing_whitespace_stripped() {
        let issues = parse_review_issues("Issue line   \n=====\nAnother   ");
        assert_eq!(issues[0].lines, lines(&["Issue line"]));
        assert_eq!(issues[1].lines, lines(&["Another"]));
    }

    #[test]
    fn test_long_separator_and_trailing_space() {
        let output = format!("Issue 1\n{}   \nIssue 2", "=".repeat(50));
        assert_eq!(parse_review_issues(&output).len(), 2);
    }

    #[test]
    fn test_four_equals_is_not_a_delimiter() {
        let issues = parse_review_issues("a\n====\nb");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].lines, lines(&["a", "====", "b"]));
    }

    #[test]
    fn test_delimiter_with_text_is_content() {
        let issues = parse_review_issues("a\n===== heading\nb");
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn test_leading_blank_lines_skipped() {
        let issues = parse_review_issues("\n\n  \nActual issue");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].lines, lines(&["Actual issue"]));
    }

    #[test]
    fn test_preamble_before_first_delimiter_dropped() {
        let output = "Starting CodeRabbit review in plain text mode...\n\
                      Connecting to review service\n\
                      Analyzing\n\
                      =====\n\
                      Real issue";
        let issues = parse_review_issues(output);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].lines, lines(&["Real issue"]));
    }

    #[test]
    fn test_header_content_becomes_first_issue() {
        let issues = parse_review_issues("Summary header\n=====\nIssue");
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].lines, lines(&["Summary header"]));
    }

    #[test]
    fn test_preamble_words_kept_inside_issue() {
        let issues = parse_review_issues("=====\nRunning loop leaks memory");
        assert_eq!(issues[0].lines, lines(&["Running loop leaks memory"]));
    }

    #[test]
    fn test_blank_only_block_dropped() {
        let issues = parse_review_issues("a\n=====\n\n   \n=====\nb");
        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn test_structured_fields_extracted() {
        let output = "\
=====
File: src/main.rs
Line: 10 to 20
Type: potential_issue

Comment:
Null pointer dereference when config is missing.

More detail about the problem.

Prompt for AI Agent:
In src/main.rs around lines 10 to 20, guard the lookup.
Return an error instead of panicking.
";
        let issues = parse_review_issues(output);
        assert_eq!(issues.len(), 1);
        let issue = &issues[0];
        assert_eq!(issue.file_path.as_deref(), Some("src/main.rs"));
        assert_eq!(issue.line_range.as_deref(), Some("10-20"));
        assert_eq!(issue.issue_type.as_deref(), Some("potential_issue"));
        assert_eq!(issue.summary, "Null pointer dereference when config is missing.");
        assert_eq!(
            issue.prompt.as_deref(),
            Some(
                "In src/main.rs around lines 10 to 20, guard the lookup.\n\
                 Return an error instead of panicking."
            )
        );
        assert_eq!(issue.location, Some(FileLocation::new("src/main.rs", Some(10))));
    }

    #[test]
    fn test_comment_on_same_line() {
        let issues = parse_review_issues("Comment: Unused import\nsecond line");
        assert_eq!(issues[0].summary, "Unused import");
    }

    #[test]
    fn test_prompt_stops_at_next_field() {
        let issues = parse_review_issues("Prompt: fix it\nplease\nType: nitpick\nignored");
        assert_eq!(issues[0].prompt.as_deref(), Some("fix it\nplease"));
        assert_eq!(issues[0].issue_type.as_deref(), Some("nitpick"));
    }

    #[test]
    fn test_indented_field_names_stay_in_body() {
        let output = "Prompt: update the docs\n  Type: keep this line\n    File: docs/a.md";
        let issues = parse_review_issues(output);
        assert!(issues[0].issue_type.is_none());
        assert!(issues[0].file_path.is_none());
        assert_eq!(
            issues[0].prompt.as_deref(),
            Some("update the docs\n  Type: keep this line\n    File: docs/a.md")
        );
    }

    #[test]
    fn test_fields_are_case_sensitive() {
        let issues = parse_review_issues("file: nope.rs\ntype: bug");
        assert!(issues[0].file_path.is_none());
        assert!(issues[0].issue_type.is_none());
        assert_eq!(issues[0].summary, "file: nope.rs");
    }

    #[test]
    fn test_long_summary_truncated() {
        let long = "A".repeat(150);
        let issues = parse_review_issues(&format!("Comment: {long}"));
        let summary = &issues[0].summary;
        assert_eq!(summary.chars().count(), SUMMARY_MAX_CHARS);
        assert!(summary.ends_with("..."));
        assert_eq!(&summary[..57], &long[..57]);
    }

    #[test]
    fn test_summary_at_limit_untouched() {
        let text = "B".repeat(SUMMARY_MAX_CHARS);
        assert_eq!(truncate_summary(&text), text);
    }

    #[test]
    fn test_summary_fallback_skips_fields() {
        let issues = parse_review_issues("File: a.rs\nType: bug\nActual summary here");
        assert_eq!(issues[0].summary, "Actual summary here");
    }

    #[test]
    fn test_file_with_line_suffix() {
        let output = "src/main.py:42: Some issue\n=====\nFile: lib/utils.py:10\nAnother issue";
        let issues = parse_review_issues(output);
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].location, Some(FileLocation::new("src/main.py", Some(42))));
        assert_eq!(issues[1].file_path.as_deref(), Some("lib/utils.py"));
        assert_eq!(issues[1].line_range.as_deref(), Some("10"));
        assert_eq!(issues[1].location, Some(FileLocation::new("lib/utils.py", Some(10))));
        assert_eq!(issues[1].summary, "Another issue");
    }

    #[test]
    fn test_issue_without_location() {
        let issues = parse_review_issues("General warning about the code");
        assert!(issues[0].location.is_none());
        assert!(issues[0].file_path.is_none());
    }

    #[test]
    fn test_extract_location_in_at_line() {
        let loc = extract_file_location(&lines(&["Found issue in src/helper.py at line 25"]));
        assert_eq!(loc, Some(FileLocation::new("src/helper.py", Some(25))));
    }

    #[test]
    fn test_extract_location_parenthetical() {
        let loc = extract_file_location(&lines(&["Check module.py (line 100) for issues"]));
        assert_eq!(loc, Some(FileLocation::new("module.py", Some(100))));
    }

    #[test]
    fn test_extract_location_none() {
        let loc = extract_file_location(&lines(&["Just a warning", "No reference here"]));
        assert!(loc.is_none());
    }

    #[test]
    fn test_extract_summary_skips_separators_and_blanks() {
        assert_eq!(extract_summary(&lines(&["", "---", "===", "Real summary"])), "Real summary");
        assert_eq!(
            extract_summary(&lines(&["File: src/main.py:42", "Actual summary here"])),
            "Actual summary here"
        );
    }

    #[test]
    fn test_extract_summary_empty() {
        assert_eq!(extract_summary(&[]), "");
    }

    #[test]
    fn test_normalize_line_range() {
        assert_eq!(normalize_line_range("10 to 20"), "10-20");
        assert_eq!(normalize_line_range(" 5 "), "5");
        assert_eq!(normalize_line_range("10-20"), "10-20");
    }

    #[test]
    fn test_usage_json_flat() {
        let usage = parse_usage_json(r#"{"used": 12345, "limit": 100000}"#).unwrap();
        assert_eq!(usage, TokenUsage::new(12345, 100000, "coderabbit"));
    }

    #[test]
    fn test_usage_json_nested_shapes() {
        let usage =
            parse_usage_json(r#"{"usage": {"tokens_used": 1, "tokens_limit": 10}}"#).unwrap();
        assert_eq!((usage.used, usage.limit), (1, 10));
        let usage = parse_usage_json(r#"{"plan": {"usage": 3, "limit": 30}}"#).unwrap();
        assert_eq!((usage.used, usage.limit), (3, 30));
        let usage = parse_usage_json(r#"{"tokens_used": 4, "tokens_limit": 40}"#).unwrap();
        assert_eq!((usage.used, usage.limit), (4, 40));
    }

    #[test]
    fn test_usage_json_rejects_zero_limit_and_garbage() {
        assert!(parse_usage_json(r#"{"used": 1, "limit": 0}"#).is_none());
        assert!(parse_usage_json("not json").is_none());
        assert!(parse_usage_json("[1, 2]").is_none());
        assert!(parse_usage_json(r#"{"used": "a", "limit": 10}"#).is_none());
        assert!(parse_usage_json(r#"{"other": 1}"#).is_none());
    }

    #[test]
    fn test_usage_plain_ratio() {
        let usage = parse_usage_plain("Used: 12,345 / 100,000 tokens").unwrap();
        assert_eq!((usage.used, usage.limit), (12345, 100000));
    }

    #[test]
    fn test_usage_plain_labelled() {
        let usage = parse_usage_plain("Tokens used: 500\nTokens limit: 2,000").unwrap();
        assert_eq!((usage.used, usage.limit), (500, 2000));
    }

    #[test]
    fn test_usage_plain_no_match() {
        assert!(parse_usage_plain("Usage: 45%").is_none());
        assert!(parse_usage_plain("").is_none());
    }

    #[test]
    fn test_parse_usage_prefers_json() {
        let usage = parse_usage(r#"{"used": 1, "limit": 2}"#, "3 / 4").unwrap();
        assert_eq!(usage.limit, 2);
        let usage = parse_usage("bad", "3 / 4").unwrap();
        assert_eq!(usage.limit, 4);
        assert!(parse_usage("", "").is_none());
    }
}
