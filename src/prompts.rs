use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::ReviewIssue;

const BATCH_TEMPLATE: &str = "Please address the following code review issues:\n\n\
{% for issue in issues %}## Issue {{ issue.number }}\n{{ issue.prompt }}\n\n{% endfor %}";

#[derive(Serialize)]
struct BatchContext {
    issues: Vec<NumberedPrompt>,
}

#[derive(Serialize)]
struct NumberedPrompt {
    number: usize,
    prompt: String,
}

/// Build the agent prompt for the issues at the given 1-based positions.
///
/// Indices outside the issue list are skipped. Returns an empty string when
/// none of the selected issues yields a prompt.
pub fn build_fix_prompt(selected: &[usize], issues: &[ReviewIssue]) -> Result<String> {
    let prompts: Vec<String> = selected
        .iter()
        .filter_map(|&idx| {
            let issue = idx.checked_sub(1).and_then(|i| issues.get(i));
            if issue.is_none() {
                debug!(idx, "skipping out-of-range issue index");
            }
            issue
        })
        .filter_map(issue_prompt)
        .collect();

    match prompts.len() {
        0 => Ok(String::new()),
        1 => Ok(prompts.into_iter().next().unwrap_or_default()),
        _ => render_batch(prompts),
    }
}

fn issue_prompt(issue: &ReviewIssue) -> Option<String> {
    if let Some(ref prompt) = issue.prompt
        && !prompt.trim().is_empty()
    {
        return Some(prompt.clone());
    }

    let file = issue.file_path.as_ref()?;
    let location = match issue.line_range {
        Some(ref range) => format!("{file}:{range}"),
        None => file.clone(),
    };
    Some(format!("Fix the issue in {location}: {}", issue.summary))
}

fn render_batch(prompts: Vec<String>) -> Result<String> {
    let issues: Vec<NumberedPrompt> = prompts
        .into_iter()
        .enumerate()
        .map(|(i, prompt)| NumberedPrompt {
            number: i + 1,
            prompt,
        })
        .collect();

    let mut engine = upon::Engine::new();
    engine
        .add_template("batch", BATCH_TEMPLATE)
        .map_err(|e| Error::Prompt(format!("invalid fix prompt template: {e}")))?;

    let rendered = engine
        .template("batch")
        .render(&BatchContext { issues })
        .to_string()
        .map_err(|e| Error::Prompt(format!("failed to render fix prompt: {e}")))?;

    Ok(rendered.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_prompt(prompt: &str) -> ReviewIssue {
        ReviewIssue {
            prompt: Some(prompt.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_single_prompt_returned_verbatim() {
        let issues = vec![with_prompt("Fix the null check\nin foo()")];
        assert_eq!(
            build_fix_prompt(&[1], &issues).unwrap(),
            "Fix the null check\nin foo()"
        );
    }

    #[test]
    fn test_multiple_prompts_batched() {
        let issues = vec![with_prompt("first"), with_prompt("second"), with_prompt("third")];
        let prompt = build_fix_prompt(&[1, 3], &issues).unwrap();
        assert_eq!(
            prompt,
            "Please address the following code review issues:\n\n\
             ## Issue 1\nfirst\n\n## Issue 2\nthird"
        );
    }

    #[test]
    fn test_fallback_uses_file_and_summary() {
        let issue = ReviewIssue {
            file_path: Some("src/lib.rs".into()),
            line_range: Some("4-9".into()),
            summary: "Unused import".into(),
            ..Default::default()
        };
        assert_eq!(
            build_fix_prompt(&[1], &[issue]).unwrap(),
            "Fix the issue in src/lib.rs:4-9: Unused import"
        );
    }

    #[test]
    fn test_fallback_without_range() {
        let issue = ReviewIssue {
            file_path: Some("a.py".into()),
            summary: "Typo".into(),
            prompt: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(
            build_fix_prompt(&[1], &[issue]).unwrap(),
            "Fix the issue in a.py: Typo"
        );
    }

    #[test]
    fn test_issue_without_prompt_or_file_is_skipped() {
        let issues = vec![ReviewIssue::from_lines(vec!["just text".into()])];
        assert_eq!(build_fix_prompt(&[1], &issues).unwrap(), "");
    }

    #[test]
    fn test_out_of_range_indices_skipped() {
        let issues = vec![with_prompt("only")];
        assert_eq!(build_fix_prompt(&[0, 1, 7], &issues).unwrap(), "only");
        assert_eq!(build_fix_prompt(&[2], &issues).unwrap(), "");
        assert_eq!(build_fix_prompt(&[], &issues).unwrap(), "");
    }

    #[test]
    fn test_prompt_text_not_escaped() {
        let issues = vec![with_prompt("use <T> & 'a"), with_prompt("x > y")];
        let prompt = build_fix_prompt(&[1, 2], &issues).unwrap();
        assert!(prompt.contains("use <T> & 'a"));
        assert!(prompt.contains("x > y"));
    }
}
